use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::TimelineError;

// @module: Lyric lines and the per-request line timeline

/// A single timed lyric line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    // @field: Lyric text as sung
    pub text: String,

    // @field: Start time in seconds from media start
    pub start: f64,

    // @field: End time in seconds from media start
    pub end: f64,

    // @field: Translations keyed by language code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub translations: BTreeMap<String, String>,
}

impl LyricLine {
    /// Create a line without translations
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            translations: BTreeMap::new(),
        }
    }

    /// Add a translation and return the line
    pub fn with_translation(mut self, language: impl Into<String>, text: impl Into<String>) -> Self {
        self.translations.insert(language.into(), text.into());
        self
    }

    /// Translation for a language, if present
    pub fn translation(&self, language: &str) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }

    /// Duration in seconds (may be negative for unrepaired oracle output)
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Ordered sequence of lyric lines in song order
///
/// Serialized as a bare JSON array, which is the interchange format between
/// the alignment, translation and render stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineTimeline {
    lines: Vec<LyricLine>,
}

impl LineTimeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timeline from lines already in song order
    pub fn from_lines(lines: Vec<LyricLine>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<LyricLine> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LyricLine> {
        self.lines.iter()
    }

    /// Texts of all lines, in order
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|line| line.text.clone()).collect()
    }

    /// Whether start times never decrease from one line to the next
    pub fn is_time_ordered(&self) -> bool {
        self.lines.windows(2).all(|pair| pair[0].start <= pair[1].start)
    }

    /// Indices `i` where line `i` runs past the start of line `i + 1`
    pub fn overlapping_pairs(&self) -> Vec<usize> {
        self.lines
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[0].end > pair[1].start)
            .map(|(i, _)| i)
            .collect()
    }

    /// Attach one translation per line under `language`
    pub fn set_translations(&mut self, language: &str, translations: Vec<String>) -> Result<(), TimelineError> {
        if translations.len() != self.lines.len() {
            return Err(TimelineError::TranslationCountMismatch {
                expected: self.lines.len(),
                actual: translations.len(),
            });
        }

        for (line, translation) in self.lines.iter_mut().zip(translations) {
            line.translations.insert(language.to_string(), translation);
        }
        Ok(())
    }

    /// Serialize to the interchange JSON format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize line timeline")
    }

    /// Parse the interchange JSON format
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse line timeline JSON")
    }

    /// Load a timeline from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read timeline file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid timeline file: {}", path.display()))
    }

    /// Save the timeline as JSON, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write timeline file: {}", path.display()))
    }
}

impl From<Vec<LyricLine>> for LineTimeline {
    fn from(lines: Vec<LyricLine>) -> Self {
        Self::from_lines(lines)
    }
}

impl<'a> IntoIterator for &'a LineTimeline {
    type Item = &'a LyricLine;
    type IntoIter = std::slice::Iter<'a, LyricLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Split raw lyrics into the authoritative line list
///
/// Every line is trimmed and blank lines are dropped.
pub fn split_source_lyrics(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
