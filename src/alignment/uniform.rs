use std::path::Path;

use async_trait::async_trait;

use crate::alignment::{AlignedLine, AlignmentOracle, AlignmentRequestLine, aligned_to_timeline};
use crate::errors::AlignmentError;
use crate::lyrics::LineTimeline;

/// Offline aligner that places line `i` at `i * spacing` for `duration` seconds
///
/// Ignores the audio. Good enough to preview layout without an API key.
#[derive(Debug, Clone, Copy)]
pub struct UniformAligner {
    spacing_secs: f64,
    duration_secs: f64,
}

impl Default for UniformAligner {
    fn default() -> Self {
        Self::new(4.0, 1.0)
    }
}

impl UniformAligner {
    pub fn new(spacing_secs: f64, duration_secs: f64) -> Self {
        Self { spacing_secs, duration_secs }
    }

    /// Timestamps for the lines without any I/O
    pub fn place(&self, lines: &[AlignmentRequestLine]) -> LineTimeline {
        aligned_to_timeline(
            lines
                .iter()
                .enumerate()
                .map(|(i, line)| {
                    let start = i as f64 * self.spacing_secs;
                    AlignedLine {
                        text: line.text.clone(),
                        start,
                        end: start + self.duration_secs,
                    }
                })
                .collect(),
        )
    }
}

#[async_trait]
impl AlignmentOracle for UniformAligner {
    async fn align(&self, _audio: &Path, lines: &[AlignmentRequestLine]) -> Result<LineTimeline, AlignmentError> {
        Ok(self.place(lines))
    }

    fn name(&self) -> &str {
        "uniform"
    }
}
