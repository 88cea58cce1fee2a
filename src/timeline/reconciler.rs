/*!
 * Reconciliation of oracle timestamps against the source lyrics.
 *
 * Alignment services return approximate per-line timestamps and sometimes
 * mis-transcribe the text. The reconciler keeps the oracle's timing, restores
 * the original text, and lets each line linger for a short padding without
 * running into the next one.
 */

use log::{debug, warn};

use crate::errors::TimelineError;
use crate::lyrics::LineTimeline;

/// Trailing time granted to every line except the last, in seconds
pub const DEFAULT_PADDING_SECONDS: f64 = 1.0;

/// Repairs an aligned timeline into a non-overlapping one
#[derive(Debug, Clone, Copy)]
pub struct TimelineReconciler {
    padding_seconds: f64,
}

impl Default for TimelineReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_PADDING_SECONDS)
    }
}

impl TimelineReconciler {
    /// Create a reconciler with a custom trailing padding
    pub fn new(padding_seconds: f64) -> Self {
        Self { padding_seconds }
    }

    pub fn padding_seconds(&self) -> f64 {
        self.padding_seconds
    }

    /// Restore source text and clamp line ends
    ///
    /// Lines correspond positionally to `source_lines`. Every line except the
    /// last ends at `min(end + padding, next.start)`; the last line keeps the
    /// oracle's end and must be clamped against the media duration later.
    pub fn reconcile(&self, source_lines: &[String], aligned: LineTimeline) -> Result<LineTimeline, TimelineError> {
        if source_lines.len() != aligned.len() {
            return Err(TimelineError::AlignmentMismatch {
                expected: source_lines.len(),
                actual: aligned.len(),
            });
        }

        if !aligned.is_time_ordered() {
            warn!("Aligned timeline is not ordered by start time; some lines may be dropped");
        }

        let mut lines = aligned.into_lines();
        let next_starts: Vec<f64> = lines.iter().skip(1).map(|line| line.start).collect();

        for (i, line) in lines.iter_mut().enumerate() {
            if line.text != source_lines[i] {
                debug!("Line {}: replacing oracle text '{}' with source text", i + 1, line.text);
            }
            line.text = source_lines[i].clone();

            if let Some(&next_start) = next_starts.get(i) {
                line.end = (line.end + self.padding_seconds).min(next_start);
            }
        }

        Ok(LineTimeline::from_lines(lines))
    }
}
