/*!
 * Error types for the lyricvid application.
 *
 * Each pipeline stage has its own error enum, defined with the thiserror
 * crate. `AppError` wraps all of them for callers that drive the whole
 * pipeline.
 */

use std::fmt;

use thiserror::Error;

/// Errors that can occur when talking to an oracle service (LLM or alignment API)
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The request did not complete in time
    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

impl ProviderError {
    /// Map an HTTP status and body to the matching provider error
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Map a transport error from reqwest
    pub fn from_reqwest(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            Self::Timeout(timeout_secs)
        } else if error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Errors raised by the alignment oracle integration
#[derive(Error, Debug)]
pub enum AlignmentError {
    /// Error from the underlying HTTP provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The alignment job finished without success
    #[error("Alignment job {job_id} ended with status {status}")]
    JobFailed { job_id: String, status: String },

    /// The job succeeded but its result could not be decoded
    #[error("Malformed alignment result: {0}")]
    MalformedResult(String),

    /// Local file access failed (audio upload, temp lyrics file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reconciling a line timeline
#[derive(Error, Debug, PartialEq)]
pub enum TimelineError {
    /// The oracle returned a different number of lines than the source lyrics
    #[error("Alignment returned {actual} lines but the lyrics have {expected}")]
    AlignmentMismatch { expected: usize, actual: usize },

    /// Translations could not be attached because the counts differ
    #[error("Got {actual} translations for {expected} lines")]
    TranslationCountMismatch { expected: usize, actual: usize },
}

/// What happened during one translation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// Response parsed, but into this many lines
    LineCount(usize),
    /// Response could not be parsed at all
    Unparseable(String),
    /// The oracle call itself failed (transport, API error, timeout)
    OracleFailure(String),
}

/// Record of a single translation attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationAttempt {
    /// Sampling temperature used for this attempt
    pub temperature: f32,
    /// Outcome of the attempt
    pub outcome: AttemptOutcome,
}

impl fmt::Display for TranslationAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::LineCount(count) => {
                write!(f, "t={:.1}: {} lines", self.temperature, count)
            }
            AttemptOutcome::Unparseable(reason) => {
                write!(f, "t={:.1}: unparseable ({})", self.temperature, reason)
            }
            AttemptOutcome::OracleFailure(reason) => {
                write!(f, "t={:.1}: oracle failure ({})", self.temperature, reason)
            }
        }
    }
}

fn summarize_attempts(attempts: &[TranslationAttempt]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Every temperature was tried without a line-count exact response
    #[error(
        "Translation never matched {expected} lines after {} attempts [{}]",
        .attempts.len(),
        summarize_attempts(.attempts)
    )]
    FormatError {
        /// Number of lines the response had to contain
        expected: usize,
        /// Every attempt in the order it was made
        attempts: Vec<TranslationAttempt>,
    },

    /// Attaching the translations to the timeline failed
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),
}

/// Errors raised by the subtitle timeline builder
#[derive(Error, Debug, PartialEq)]
pub enum SubtitleError {
    /// Media duration was zero, negative or not a number
    #[error("Invalid media duration: {0}")]
    InvalidMediaDuration(f64),

    /// No line survived validation and the caller asked to fail on that
    #[error("No valid lyric lines left to subtitle")]
    EmptyTimeline,
}

/// Errors raised by the media renderer
#[derive(Error, Debug)]
pub enum RenderError {
    /// ffmpeg or ffprobe could not be started
    #[error("Media tool '{tool}' is not available: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    /// Probing an input file failed
    #[error("Failed to probe {path}: {reason}")]
    Probe { path: String, reason: String },

    /// The encoder exited unsuccessfully
    #[error("Render failed with status {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// Working files could not be written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from alignment
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignmentError),

    /// Error from timeline reconciliation
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from subtitle building
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from rendering
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::File(format!("Invalid JSON: {}", error))
    }
}
