/*!
 * Tests for app configuration functionality
 */

use std::str::FromStr;

use anyhow::Result;
use lyricvid::app_config::{
    AlignmentProvider, Config, LogLevel, ResponseFormat, TemperatureSchedule, TranslationProvider,
    MAX_TEMPERATURE_ATTEMPTS,
};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_shouldHaveExpectedValues() {
    let config = Config::default();

    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "en");
    assert_eq!(config.alignment.provider, AlignmentProvider::MusicAi);
    assert_eq!(config.translation.provider, TranslationProvider::OpenAI);
    assert_eq!(config.translation.common.seed, 42);
    assert_eq!(config.translation.common.response_format, ResponseFormat::Pairs);
    assert_eq!(config.timeline.padding_seconds, 1.0);
    assert_eq!(config.subtitle.font_size, 32);
    assert_eq!(config.subtitle.effective_translation_font_size(), 16);
    assert!(!config.subtitle.enable_fade);
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test that a saved configuration loads back
#[test]
fn test_config_saveAndLoad_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "fr".to_string();
    config.translation.provider = TranslationProvider::Ollama;
    config.subtitle.enable_fade = true;
    config.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded.target_language, "fr");
    assert_eq!(loaded.translation.provider, TranslationProvider::Ollama);
    assert!(loaded.subtitle.enable_fade);

    Ok(())
}

/// Test that a sparse configuration file is completed with defaults
#[test]
fn test_config_load_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "conf.json",
        r#"{
            "target_language": "de",
            "alignment": { "provider": "uniform" },
            "translation": { "provider": "lmstudio" }
        }"#,
    )?;

    let config = Config::load(&path)?;
    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "de");
    assert_eq!(config.alignment.provider, AlignmentProvider::Uniform);
    assert_eq!(config.translation.provider, TranslationProvider::LMStudio);
    assert_eq!(config.translation.get_endpoint(), "http://localhost:1234/v1");
    assert_eq!(
        config.translation.common.temperature_schedule.temperatures(),
        vec![0.0, 0.2, 0.4, 0.6, 0.8, 1.0]
    );

    Ok(())
}

/// Test that a broken configuration file is an error
#[test]
fn test_config_load_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;
    assert!(Config::load(&path).is_err());
    Ok(())
}

/// Test per-stage validation
#[test]
fn test_validate_withMissingKeys_shouldOnlyFailAffectedStage() {
    let config = Config::default();

    assert!(config.validate_common().is_ok());
    assert!(config.validate_alignment().is_err());
    assert!(config.validate_translation().is_err());
    assert!(config.validate().is_err());
}

/// Test that keys and local providers satisfy validation
#[test]
fn test_validate_withKeysOrLocalProviders_shouldSucceed() {
    let mut config = Config::default();
    config.alignment.api_key = "music-key".to_string();
    config.translation.active_provider_config_mut().api_key = "sk-test".to_string();
    assert!(config.validate().is_ok());

    let mut local = Config::default();
    local.alignment.provider = AlignmentProvider::Uniform;
    local.translation.provider = TranslationProvider::Ollama;
    assert!(local.validate().is_ok());
}

/// Test rejection of invalid languages and values
#[test]
fn test_validate_withInvalidValues_shouldFail() {
    let mut config = Config::default();
    config.target_language = "xx".to_string();
    assert!(config.validate_common().is_err());

    let mut config = Config::default();
    config.timeline.padding_seconds = -1.0;
    assert!(config.validate_common().is_err());

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.translation.common.temperature_schedule = TemperatureSchedule { start: 0.5, step: 0.1, max: 0.2 };
    assert!(config.validate_translation().is_err());
}

/// Test a custom temperature schedule
#[test]
fn test_temperatureSchedule_withCustomStep_shouldReachMaxExactly() {
    let schedule = TemperatureSchedule { start: 0.1, step: 0.3, max: 1.0 };
    assert_eq!(schedule.temperatures(), vec![0.1, 0.4, 0.7, 1.0]);

    let schedule = TemperatureSchedule { start: 0.0, step: 0.25, max: 0.6 };
    assert_eq!(schedule.temperatures(), vec![0.0, 0.25, 0.5]);
}

/// Test that a tiny step is rejected instead of producing a huge schedule
#[test]
fn test_temperatureSchedule_withTinyStep_shouldBeCapped() {
    let schedule = TemperatureSchedule { start: 0.0, step: 1e-9, max: 1.0 };
    assert!(schedule.attempt_count() > MAX_TEMPERATURE_ATTEMPTS);
    assert_eq!(schedule.temperatures().len(), MAX_TEMPERATURE_ATTEMPTS);

    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;
    config.translation.common.temperature_schedule = schedule;
    assert!(config.validate_translation().is_err());

    config.translation.common.temperature_schedule = TemperatureSchedule { start: 0.0, step: 0.05, max: 2.0 };
    assert_eq!(config.translation.common.temperature_schedule.attempt_count(), 41);
    assert!(config.validate_translation().is_ok());
}

/// Test provider parsing and names
#[test]
fn test_translationProvider_fromStr_shouldAcceptLowercaseNames() -> Result<()> {
    assert_eq!(TranslationProvider::from_str("openai")?, TranslationProvider::OpenAI);
    assert_eq!(TranslationProvider::from_str("OLLAMA")?, TranslationProvider::Ollama);
    assert_eq!(TranslationProvider::LMStudio.display_name(), "LM Studio");
    assert!(TranslationProvider::from_str("anthropic").is_err());
    assert_eq!(AlignmentProvider::from_str("uniform")?, AlignmentProvider::Uniform);
    Ok(())
}

/// Test the active provider lookup
#[test]
fn test_translationConfig_withOllama_shouldUseOllamaDefaults() {
    let mut config = Config::default();
    config.translation.provider = TranslationProvider::Ollama;

    assert_eq!(config.translation.get_model(), "llama3.2:3b");
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
    assert!(config.translation.get_api_key().is_empty());
}
