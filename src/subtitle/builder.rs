use log::{debug, warn};

use crate::errors::SubtitleError;
use crate::lyrics::{LineTimeline, LyricLine};
use crate::subtitle::{
    SkipReason, SkippedLine, SubtitleEntry, SubtitleLayout, SubtitleRole, SubtitleTimeline,
};

/// Turns a reconciled line timeline into renderer-ready entries
#[derive(Debug, Clone, Default)]
pub struct SubtitleTimelineBuilder {
    layout: SubtitleLayout,
}

impl SubtitleTimelineBuilder {
    pub fn new(layout: SubtitleLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &SubtitleLayout {
        &self.layout
    }

    /// Build entries for every valid line, clamped to `media_duration`
    ///
    /// Invalid lines are skipped and reported in `SubtitleTimeline::skipped`.
    pub fn build(&self, timeline: &LineTimeline, media_duration: f64) -> Result<SubtitleTimeline, SubtitleError> {
        if !media_duration.is_finite() || media_duration <= 0.0 {
            return Err(SubtitleError::InvalidMediaDuration(media_duration));
        }

        let mut result = SubtitleTimeline {
            media_duration,
            ..Default::default()
        };

        for (index, line) in timeline.iter().enumerate() {
            let end = match validate(line, media_duration) {
                Ok(end) => end,
                Err(reason) => {
                    warn!("Skipping lyric line {} ({}): '{}'", index + 1, reason, line.text);
                    result.skipped.push(SkippedLine { line_index: index, reason });
                    continue;
                }
            };

            result.entries.push(SubtitleEntry {
                line_index: index,
                role: SubtitleRole::Primary,
                text: line.text.trim().to_string(),
                language: self.layout.primary_language.clone(),
                start: line.start,
                end,
                font_size: self.layout.font_size,
                anchor: self.layout.primary_anchor(),
                fade_in: self.layout.fade_seconds,
                fade_out: self.layout.fade_seconds,
            });

            match line
                .translation(&self.layout.translation_language)
                .map(str::trim)
                .filter(|text| !text.is_empty())
            {
                Some(translation) => result.entries.push(SubtitleEntry {
                    line_index: index,
                    role: SubtitleRole::Translation,
                    text: translation.to_string(),
                    language: self.layout.translation_language.clone(),
                    start: line.start,
                    end,
                    font_size: self.layout.translation_font_size,
                    anchor: self.layout.translation_anchor(),
                    fade_in: self.layout.fade_seconds,
                    fade_out: self.layout.fade_seconds,
                }),
                None => {
                    debug!("Lyric line {} has no '{}' translation", index + 1, self.layout.translation_language);
                    result.missing_translations.push(index);
                }
            }
        }

        if result.entries.is_empty() && self.layout.fail_on_empty {
            return Err(SubtitleError::EmptyTimeline);
        }

        Ok(result)
    }
}

/// Clamped end time of a valid line
fn validate(line: &LyricLine, media_duration: f64) -> Result<f64, SkipReason> {
    if line.text.trim().is_empty() {
        return Err(SkipReason::EmptyText);
    }
    if !line.start.is_finite() || !line.end.is_finite() {
        return Err(SkipReason::NonFiniteTime);
    }
    if line.start < 0.0 {
        return Err(SkipReason::NegativeStart);
    }
    if line.end <= line.start {
        return Err(SkipReason::EndNotAfterStart);
    }
    if line.start >= media_duration {
        return Err(SkipReason::StartsAfterMedia);
    }
    Ok(line.end.min(media_duration))
}
