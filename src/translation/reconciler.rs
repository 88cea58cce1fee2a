/*!
 * Temperature escalation for line-count exact translation.
 *
 * Each attempt sends the full lyric block at the next temperature of the
 * schedule. The first response that yields exactly one translation per line
 * wins; if none does, every attempt is reported back in a `FormatError`.
 */

use std::time::Duration;

use log::{debug, info, warn};

use crate::app_config::{ResponseFormat, TranslationCommonConfig};
use crate::errors::{AttemptOutcome, TranslationAttempt, TranslationError};
use crate::language_utils;
use crate::lyrics::LineTimeline;
use crate::translation::oracle::{OracleRequest, TranslationOracle};
use crate::translation::prompts::TranslationPromptBuilder;
use crate::translation::response::parse_response;

/// Retries translation until the response is line-count exact
#[derive(Debug, Clone)]
pub struct TranslationReconciler {
    source_language: String,
    target_language: String,
    temperatures: Vec<f32>,
    seed: u64,
    attempt_timeout: Duration,
    format: ResponseFormat,
}

impl TranslationReconciler {
    /// Create a reconciler for a language pair given as ISO codes
    pub fn new(source_language: &str, target_language: &str, common: &TranslationCommonConfig) -> Self {
        Self {
            source_language: display_language(source_language),
            target_language: display_language(target_language),
            temperatures: common.temperature_schedule.temperatures(),
            seed: common.seed,
            attempt_timeout: Duration::from_secs(common.timeout_secs.max(1)),
            format: common.response_format,
        }
    }

    /// Replace the temperature schedule
    pub fn with_temperatures(mut self, temperatures: Vec<f32>) -> Self {
        self.temperatures = temperatures;
        self
    }

    /// Replace the per-attempt timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn temperatures(&self) -> &[f32] {
        &self.temperatures
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Translate every line, one translation per input line in order
    pub async fn translate(&self, lines: &[String], oracle: &dyn TranslationOracle) -> Result<Vec<String>, TranslationError> {
        if lines.is_empty() {
            return Ok(Vec::new());
        }

        let builder = TranslationPromptBuilder::new(&self.source_language, &self.target_language)
            .with_format(self.format)
            .with_lines(lines);
        let system = builder.build_system_prompt();
        let prompt = builder.build_user_prompt();

        let mut attempts = Vec::with_capacity(self.temperatures.len());

        for (index, &temperature) in self.temperatures.iter().enumerate() {
            let request = OracleRequest {
                system: system.clone(),
                prompt: prompt.clone(),
                temperature,
                seed: self.seed,
            };

            debug!(
                "Translation attempt {}/{} at temperature {:.1}",
                index + 1, self.temperatures.len(), temperature
            );

            let outcome = match tokio::time::timeout(self.attempt_timeout, oracle.generate(&request)).await {
                Ok(Ok(response)) => match parse_response(self.format, &response, lines) {
                    Ok(translations) => {
                        info!(
                            "Translated {} lines at temperature {:.1} after {} attempt(s)",
                            lines.len(), temperature, index + 1
                        );
                        return Ok(translations);
                    }
                    Err(outcome) => outcome,
                },
                Ok(Err(e)) => AttemptOutcome::OracleFailure(e.to_string()),
                Err(_) => AttemptOutcome::OracleFailure(format!(
                    "timed out after {}s",
                    self.attempt_timeout.as_secs()
                )),
            };

            let attempt = TranslationAttempt { temperature, outcome };
            warn!("Rejected translation, expected {} lines ({})", lines.len(), attempt);
            attempts.push(attempt);
        }

        Err(TranslationError::FormatError {
            expected: lines.len(),
            attempts,
        })
    }

    /// Translate a timeline's texts and attach them under `language`
    pub async fn translate_timeline(
        &self,
        timeline: &mut LineTimeline,
        language: &str,
        oracle: &dyn TranslationOracle,
    ) -> Result<(), TranslationError> {
        let translations = self.translate(&timeline.texts(), oracle).await?;
        timeline.set_translations(language, translations)?;
        Ok(())
    }
}

/// English language name for prompts, or the code itself when unknown
fn display_language(code: &str) -> String {
    language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
}
