/*!
 * # lyricvid - Lyric videos from lyrics, audio and a still image
 *
 * A Rust library that times lyric lines against a song, translates them and
 * renders bilingual subtitles over a background image.
 *
 * ## Features
 *
 * - Lyric alignment through an alignment oracle:
 *   - Music.ai workflow jobs
 *   - Offline uniform spacing for previews
 * - Timeline repair: source text restored, line ends padded without overlap
 * - Line-count exact translation with temperature escalation:
 *   - OpenAI API (and OpenAI-compatible LM Studio)
 *   - Ollama (local LLM)
 * - Subtitle timeline with bilingual layout and optional fades
 * - ffmpeg rendering
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `lyrics`: Lyric lines and the line timeline interchange format
 * - `timeline`: Timestamp reconciliation against the source lyrics
 * - `translation`: Translation oracle and escalation loop:
 *   - `translation::oracle`: Oracle trait and provider-backed oracle
 *   - `translation::prompts`: Prompt templates
 *   - `translation::response`: Response parsing
 *   - `translation::reconciler`: Temperature escalation
 * - `subtitle`: Subtitle entries, layout and the timeline builder
 * - `alignment`: Alignment oracle trait and implementations
 * - `render`: Renderer trait and the ffmpeg renderer
 * - `providers`: Client implementations for LLM providers:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::openai`: OpenAI API client
 * - `app_config`: Configuration management
 * - `app_controller`: Per-request pipeline driver
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod alignment;
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod lyrics;
pub mod providers;
pub mod render;
pub mod subtitle;
pub mod timeline;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, CreateRequest, PipelineReport, RequestContext};
pub use lyrics::{LineTimeline, LyricLine};
pub use timeline::TimelineReconciler;
pub use translation::{TranslationOracle, TranslationReconciler};
pub use subtitle::{SubtitleEntry, SubtitleTimeline, SubtitleTimelineBuilder};
pub use language_utils::{language_codes_match, normalize_to_part1_or_part2t, get_language_name};
pub use errors::{AppError, ProviderError, SubtitleError, TimelineError, TranslationError};
