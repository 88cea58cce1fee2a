/*!
 * Subtitle timeline model.
 *
 * A `SubtitleTimeline` is the renderer's input: positioned, sized and timed
 * caption entries in layering order. It is derived from a reconciled
 * `LineTimeline` by the `SubtitleTimelineBuilder` and never persisted.
 */

use std::fmt;

use crate::app_config::SubtitleConfig;

pub mod builder;

pub use builder::SubtitleTimelineBuilder;

// @enum: Vertical placement relative to the bottom edge of the frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalAnchor {
    /// Text bottom sits `margin` px above the frame bottom
    AboveBottomMargin { margin: u32 },
    /// Text top sits `offset` px below the `margin` line
    BelowBottomMargin { margin: u32, offset: u32 },
}

impl VerticalAnchor {
    /// Top y coordinate of the text box
    pub fn resolve(&self, frame_height: f64, text_height: f64) -> f64 {
        match *self {
            Self::AboveBottomMargin { margin } => frame_height - text_height - margin as f64,
            Self::BelowBottomMargin { margin, offset } => frame_height - margin as f64 + offset as f64,
        }
    }
}

// @enum: Which caption of a lyric line an entry is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleRole {
    Primary,
    Translation,
}

/// One caption as drawn by the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Index of the source line in the line timeline
    pub line_index: usize,

    pub role: SubtitleRole,

    pub text: String,

    // @field: Language code of `text`
    pub language: String,

    // @field: Start in seconds
    pub start: f64,

    // @field: End in seconds, never past the media end
    pub end: f64,

    pub font_size: u32,

    pub anchor: VerticalAnchor,

    // @field: Fade-in length in seconds, None disables it
    pub fade_in: Option<f64>,

    // @field: Fade-out length in seconds, None disables it
    pub fade_out: Option<f64>,
}

impl SubtitleEntry {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Why a lyric line produced no captions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Text is empty after trimming
    EmptyText,
    /// Start or end is NaN or infinite
    NonFiniteTime,
    /// Start is before zero
    NegativeStart,
    /// End is not after start
    EndNotAfterStart,
    /// Start is at or beyond the end of the media
    StartsAfterMedia,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::EmptyText => "empty text",
            Self::NonFiniteTime => "non-finite timestamp",
            Self::NegativeStart => "negative start",
            Self::EndNotAfterStart => "end not after start",
            Self::StartsAfterMedia => "starts after media end",
        };
        write!(f, "{}", reason)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkippedLine {
    pub line_index: usize,
    pub reason: SkipReason,
}

/// Renderer input produced from one line timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubtitleTimeline {
    /// Entries in source order, primary before translation for each line
    pub entries: Vec<SubtitleEntry>,
    /// Lines dropped by validation
    pub skipped: Vec<SkippedLine>,
    /// Valid lines that had no translation to show
    pub missing_translations: Vec<usize>,
    /// Media duration the entries were clamped to
    pub media_duration: f64,
}

impl SubtitleTimeline {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubtitleEntry> {
        self.entries.iter()
    }

    /// Entries of one role, in order
    pub fn entries_with_role(&self, role: SubtitleRole) -> impl Iterator<Item = &SubtitleEntry> {
        self.entries.iter().filter(move |entry| entry.role == role)
    }
}

/// Layout and timing parameters shared by all entries
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleLayout {
    pub primary_language: String,
    pub translation_language: String,
    pub font_size: u32,
    pub translation_font_size: u32,
    pub bottom_margin: u32,
    pub translation_offset: u32,
    /// Fade length applied to both ends of every entry
    pub fade_seconds: Option<f64>,
    /// Fail instead of returning an empty timeline
    pub fail_on_empty: bool,
}

impl SubtitleLayout {
    pub fn from_config(config: &SubtitleConfig, primary_language: &str, translation_language: &str) -> Self {
        Self {
            primary_language: primary_language.to_string(),
            translation_language: translation_language.to_string(),
            font_size: config.font_size,
            translation_font_size: config.effective_translation_font_size(),
            bottom_margin: config.bottom_margin,
            translation_offset: config.translation_offset,
            fade_seconds: config.enable_fade.then_some(config.fade_seconds),
            fail_on_empty: config.fail_on_empty,
        }
    }

    pub fn primary_anchor(&self) -> VerticalAnchor {
        VerticalAnchor::AboveBottomMargin { margin: self.bottom_margin }
    }

    pub fn translation_anchor(&self) -> VerticalAnchor {
        VerticalAnchor::BelowBottomMargin {
            margin: self.bottom_margin,
            offset: self.translation_offset,
        }
    }
}

impl Default for SubtitleLayout {
    fn default() -> Self {
        Self::from_config(&SubtitleConfig::default(), "ja", "en")
    }
}
