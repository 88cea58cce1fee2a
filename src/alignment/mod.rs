/*!
 * Alignment oracle integration.
 *
 * An alignment oracle takes an audio track and the authoritative lyric lines
 * and returns approximate per-line timestamps. The output is repaired by the
 * `TimelineReconciler` before anything else uses it.
 *
 * Implementations:
 * - `MusicAiAligner`: Music.ai workflow job (upload, create job, poll)
 * - `UniformAligner`: offline fixed spacing, useful for previews
 */

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_config::{AlignmentConfig, AlignmentProvider};
use crate::errors::AlignmentError;
use crate::language_utils;
use crate::lyrics::{LineTimeline, LyricLine};

pub mod musicai;
pub mod uniform;

pub use musicai::MusicAiAligner;
pub use uniform::UniformAligner;

/// One line of the alignment request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRequestLine {
    pub text: String,
    /// Lowercase English language name, e.g. `japanese`
    pub language: String,
}

/// One line as returned by an alignment oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedLine {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl From<AlignedLine> for LyricLine {
    fn from(line: AlignedLine) -> Self {
        LyricLine::new(line.text, line.start, line.end)
    }
}

/// Convert oracle output into a line timeline, keeping its order
pub fn aligned_to_timeline(lines: Vec<AlignedLine>) -> LineTimeline {
    LineTimeline::from_lines(lines.into_iter().map(LyricLine::from).collect())
}

/// Build the request payload for the source language code
pub fn build_alignment_request(lines: &[String], language_code: &str) -> Result<Vec<AlignmentRequestLine>> {
    let language = language_utils::alignment_language_label(language_code)?;
    Ok(lines
        .iter()
        .map(|text| AlignmentRequestLine {
            text: text.clone(),
            language: language.clone(),
        })
        .collect())
}

/// A service that times lyric lines against audio
#[async_trait]
pub trait AlignmentOracle: Send + Sync {
    /// Align `lines` against the audio file
    async fn align(&self, audio: &Path, lines: &[AlignmentRequestLine]) -> Result<LineTimeline, AlignmentError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// Create the configured alignment oracle
pub fn from_config(config: &AlignmentConfig) -> Box<dyn AlignmentOracle> {
    match config.provider {
        AlignmentProvider::MusicAi => Box::new(MusicAiAligner::from_config(config)),
        AlignmentProvider::Uniform => Box::new(UniformAligner::new(
            config.uniform_spacing_secs,
            config.uniform_duration_secs,
        )),
    }
}
