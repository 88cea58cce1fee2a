use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::timeline::DEFAULT_PADDING_SECONDS;

/// Application configuration module
/// This module handles loading, validating and saving the settings of
/// every pipeline stage.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the lyrics (ISO code)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language of the translated subtitles (ISO code)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Alignment oracle settings
    #[serde(default)]
    pub alignment: AlignmentConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Timeline repair settings
    #[serde(default)]
    pub timeline: TimelineConfig,

    /// Subtitle layout settings
    #[serde(default)]
    pub subtitle: SubtitleConfig,

    /// Video encoding settings
    #[serde(default)]
    pub render: RenderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Alignment oracle type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentProvider {
    // @provider: Music.ai workflow API
    #[default]
    MusicAi,
    // @provider: Offline fixed spacing, for previews
    Uniform,
}

impl std::fmt::Display for AlignmentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MusicAi => write!(f, "musicai"),
            Self::Uniform => write!(f, "uniform"),
        }
    }
}

impl std::str::FromStr for AlignmentProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "musicai" => Ok(Self::MusicAi),
            "uniform" => Ok(Self::Uniform),
            _ => Err(anyhow!("Invalid alignment provider: {}", s)),
        }
    }
}

/// Alignment oracle configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AlignmentConfig {
    /// Which aligner to use
    #[serde(default)]
    pub provider: AlignmentProvider,

    /// API key for the alignment service
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Service endpoint URL
    #[serde(default = "default_musicai_endpoint")]
    pub endpoint: String,

    /// Workflow that performs transcription and alignment
    #[serde(default = "default_workflow_slug")]
    pub workflow_slug: String,

    /// Seconds between job status polls
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Give up on a job after this many seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Line spacing used by the uniform aligner
    #[serde(default = "default_uniform_spacing_secs")]
    pub uniform_spacing_secs: f64,

    /// Line duration used by the uniform aligner
    #[serde(default = "default_uniform_duration_secs")]
    pub uniform_duration_secs: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            provider: AlignmentProvider::default(),
            api_key: String::new(),
            endpoint: default_musicai_endpoint(),
            workflow_slug: default_workflow_slug(),
            poll_interval_secs: default_poll_interval_secs(),
            job_timeout_secs: default_job_timeout_secs(),
            timeout_secs: default_timeout_secs(),
            uniform_spacing_secs: default_uniform_spacing_secs(),
            uniform_duration_secs: default_uniform_duration_secs(),
        }
    }
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: OpenAI
    #[default]
    OpenAI,
    // @provider: Ollama
    Ollama,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::OpenAI => "openai".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: HTTP timeout seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        let (model, endpoint) = match provider_type {
            TranslationProvider::OpenAI => (default_openai_model(), default_openai_endpoint()),
            TranslationProvider::Ollama => (default_ollama_model(), default_ollama_endpoint()),
            TranslationProvider::LMStudio => (default_lmstudio_model(), default_lmstudio_endpoint()),
        };
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model,
            api_key: String::new(),
            endpoint,
            timeout_secs: default_translation_timeout_secs(),
        }
    }
}

/// How the translation oracle is asked to lay out its answer
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// One `original,translation` pair per line
    #[default]
    Pairs,
    /// A JSON array of translated strings
    JsonArray,
}

/// Most temperatures a schedule may hold
pub const MAX_TEMPERATURE_ATTEMPTS: usize = 50;

/// Escalating sampling temperatures, each tried once
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TemperatureSchedule {
    /// First temperature tried
    #[serde(default)]
    pub start: f32,

    /// Increment after each rejected response
    #[serde(default = "default_temperature_step")]
    pub step: f32,

    /// Highest temperature tried (inclusive)
    #[serde(default = "default_max_temperature")]
    pub max: f32,
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self {
            start: 0.0,
            step: default_temperature_step(),
            max: default_max_temperature(),
        }
    }
}

impl TemperatureSchedule {
    /// Number of temperatures between `start` and `max`, uncapped
    pub fn attempt_count(&self) -> usize {
        if !(self.step > 0.0) || self.max < self.start {
            return 1;
        }
        // Saturates for steps too small to count
        let steps = ((self.max - self.start) / self.step + 1e-4).floor() as usize;
        steps.saturating_add(1)
    }

    /// All temperatures in the order they are tried
    ///
    /// Values are computed as `start + i * step` rather than by repeated
    /// addition, so `max` is reached exactly when it lies on the grid.
    /// At most `MAX_TEMPERATURE_ATTEMPTS` values are returned.
    pub fn temperatures(&self) -> Vec<f32> {
        (0..self.attempt_count().min(MAX_TEMPERATURE_ATTEMPTS))
            .map(|i| {
                let t = self.start + i as f32 * self.step;
                (t * 1000.0).round() / 1000.0
            })
            .collect()
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default = "default_available_providers")]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Temperatures tried until the response has the right line count
    #[serde(default)]
    pub temperature_schedule: TemperatureSchedule,

    /// Fixed sampling seed sent with every attempt
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Timeout for a single oracle attempt in seconds
    #[serde(default = "default_translation_timeout_secs")]
    pub timeout_secs: u64,

    /// Requested response layout
    #[serde(default)]
    pub response_format: ResponseFormat,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            temperature_schedule: TemperatureSchedule::default(),
            seed: default_seed(),
            timeout_secs: default_translation_timeout_secs(),
            response_format: ResponseFormat::default(),
        }
    }
}

/// Timeline repair configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TimelineConfig {
    /// Seconds each line may linger before the next one starts
    #[serde(default = "default_padding_seconds")]
    pub padding_seconds: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            padding_seconds: default_padding_seconds(),
        }
    }
}

/// Configuration for subtitle layout
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SubtitleConfig {
    /// Font size of the lyric line
    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Font size of the translation (defaults to half the lyric size)
    #[serde(default)]
    pub translation_font_size: Option<u32>,

    /// Distance between the frame bottom and the lyric line
    #[serde(default = "default_bottom_margin")]
    pub bottom_margin: u32,

    /// Offset of the translation below the bottom margin line
    #[serde(default = "default_translation_offset")]
    pub translation_offset: u32,

    /// Fade subtitles in and out
    #[serde(default)]
    pub enable_fade: bool,

    /// Fade length in seconds
    #[serde(default = "default_fade_seconds")]
    pub fade_seconds: f64,

    /// Treat a timeline with no valid lines as an error
    #[serde(default)]
    pub fail_on_empty: bool,
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            font_size: default_font_size(),
            translation_font_size: None,
            bottom_margin: default_bottom_margin(),
            translation_offset: default_translation_offset(),
            enable_fade: false,
            fade_seconds: default_fade_seconds(),
            fail_on_empty: false,
        }
    }
}

impl SubtitleConfig {
    /// Effective translation font size
    pub fn effective_translation_font_size(&self) -> u32 {
        self.translation_font_size.unwrap_or((self.font_size / 2).max(1))
    }
}

/// Configuration for video encoding
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenderConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Font (fontconfig name or font file path) for the lyric line
    #[serde(default = "default_primary_font")]
    pub primary_font: String,

    /// Font for the translation line
    #[serde(default = "default_translation_font")]
    pub translation_font: String,

    /// Text color
    #[serde(default = "default_font_color")]
    pub font_color: String,

    /// Outline color
    #[serde(default = "default_outline_color")]
    pub outline_color: String,

    /// Outline width in pixels (0 disables the outline)
    #[serde(default)]
    pub outline_width: u32,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Encoder preset
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Encoder threads
    #[serde(default = "default_threads")]
    pub threads: u32,

    /// Share of the frame width a caption may occupy
    #[serde(default = "default_caption_width_ratio")]
    pub caption_width_ratio: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            primary_font: default_primary_font(),
            translation_font: default_translation_font(),
            font_color: default_font_color(),
            outline_color: default_outline_color(),
            outline_width: 0,
            fps: default_fps(),
            video_codec: default_video_codec(),
            audio_codec: default_audio_codec(),
            preset: default_preset(),
            threads: default_threads(),
            caption_width_ratio: default_caption_width_ratio(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the log crate
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_musicai_endpoint() -> String {
    "https://api.music.ai".to_string()
}

fn default_workflow_slug() -> String {
    "subtitle-transcription-and-alignment".to_string()
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_job_timeout_secs() -> u64 {
    900
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_uniform_spacing_secs() -> f64 {
    4.0
}

fn default_uniform_duration_secs() -> f64 {
    1.0
}

fn default_translation_timeout_secs() -> u64 {
    120
}

fn default_seed() -> u64 {
    42
}

fn default_temperature_step() -> f32 {
    0.2
}

fn default_max_temperature() -> f32 {
    1.0
}

fn default_padding_seconds() -> f64 {
    DEFAULT_PADDING_SECONDS
}

fn default_font_size() -> u32 {
    32
}

fn default_bottom_margin() -> u32 {
    50
}

fn default_translation_offset() -> u32 {
    10
}

fn default_fade_seconds() -> f64 {
    0.5
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_primary_font() -> String {
    "Noto Sans JP".to_string()
}

fn default_translation_font() -> String {
    "Arial".to_string()
}

fn default_font_color() -> String {
    "#FFFFFF".to_string()
}

fn default_outline_color() -> String {
    "#000000".to_string()
}

fn default_fps() -> u32 {
    24
}

fn default_video_codec() -> String {
    "libx264".to_string()
}

fn default_audio_codec() -> String {
    "aac".to_string()
}

fn default_preset() -> String {
    "ultrafast".to_string()
}

fn default_threads() -> u32 {
    4
}

fn default_caption_width_ratio() -> f64 {
    0.9
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_lmstudio_endpoint() -> String {
    // LM Studio default server (OpenAI compatible) runs on port 1234 under /v1
    "http://localhost:1234/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-mini".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_lmstudio_model() -> String {
    // Placeholder; users should set to the loaded model name in LM Studio
    "local-model".to_string()
}

fn default_available_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new(TranslationProvider::OpenAI),
        ProviderConfig::new(TranslationProvider::Ollama),
        ProviderConfig::new(TranslationProvider::LMStudio),
    ]
}

impl Config {
    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| anyhow!("Failed to open config file {}: {}", path.display(), e))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path.as_ref().display(), e))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.validate_common()?;
        self.validate_alignment()?;
        self.validate_translation()
    }

    /// Checks that apply to every command
    pub fn validate_common(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        if !(self.timeline.padding_seconds >= 0.0) {
            return Err(anyhow!("Timeline padding must not be negative"));
        }

        if !(self.subtitle.fade_seconds >= 0.0) {
            return Err(anyhow!("Fade length must not be negative"));
        }

        if !(self.render.caption_width_ratio > 0.0 && self.render.caption_width_ratio <= 1.0) {
            return Err(anyhow!("Caption width ratio must be in (0, 1]"));
        }

        Ok(())
    }

    /// Checks needed before calling the alignment oracle
    pub fn validate_alignment(&self) -> Result<()> {
        if self.alignment.provider == AlignmentProvider::MusicAi && self.alignment.api_key.is_empty() {
            return Err(anyhow!("Alignment API key is required for the Music.ai provider"));
        }
        Ok(())
    }

    /// Checks needed before calling the translation oracle
    pub fn validate_translation(&self) -> Result<()> {
        if self.translation.provider == TranslationProvider::OpenAI && self.translation.get_api_key().is_empty() {
            return Err(anyhow!("Translation API key is required for OpenAI provider"));
        }

        let schedule = &self.translation.common.temperature_schedule;
        if !(schedule.step > 0.0) || schedule.max < schedule.start || schedule.start < 0.0 {
            return Err(anyhow!(
                "Invalid temperature schedule: start {}, step {}, max {}",
                schedule.start, schedule.step, schedule.max
            ));
        }
        if schedule.attempt_count() > MAX_TEMPERATURE_ATTEMPTS {
            return Err(anyhow!(
                "Temperature schedule from {} to {} in steps of {} exceeds {} attempts",
                schedule.start, schedule.max, schedule.step, MAX_TEMPERATURE_ATTEMPTS
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            alignment: AlignmentConfig::default(),
            translation: TranslationConfig::default(),
            timeline: TimelineConfig::default(),
            subtitle: SubtitleConfig::default(),
            render: RenderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        self.get_provider_config(&self.provider)
    }

    /// Get a specific provider configuration by type
    pub fn get_provider_config(&self, provider_type: &TranslationProvider) -> Option<&ProviderConfig> {
        let provider_str = provider_type.to_lowercase_string();
        self.available_providers.iter()
            .find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider configuration, created on demand
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        if let Some(index) = self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            &mut self.available_providers[index]
        } else {
            self.available_providers.push(ProviderConfig::new(self.provider.clone()));
            let last = self.available_providers.len() - 1;
            &mut self.available_providers[last]
        }
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.model.is_empty() {
                return provider_config.model.clone();
            }
        }

        match self.provider {
            TranslationProvider::OpenAI => default_openai_model(),
            TranslationProvider::Ollama => default_ollama_model(),
            TranslationProvider::LMStudio => default_lmstudio_model(),
        }
    }

    /// Get the API key for the active provider
    pub fn get_api_key(&self) -> String {
        self.get_active_provider_config()
            .map(|p| p.api_key.clone())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if let Some(provider_config) = self.get_active_provider_config() {
            if !provider_config.endpoint.is_empty() {
                return provider_config.endpoint.clone();
            }
        }

        match self.provider {
            TranslationProvider::OpenAI => default_openai_endpoint(),
            TranslationProvider::Ollama => default_ollama_endpoint(),
            TranslationProvider::LMStudio => default_lmstudio_endpoint(),
        }
    }

    /// Get the HTTP timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        self.get_active_provider_config()
            .map(|p| p.timeout_secs)
            .filter(|&secs| secs > 0)
            .unwrap_or_else(default_translation_timeout_secs)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: default_available_providers(),
            common: TranslationCommonConfig::default(),
        }
    }
}
