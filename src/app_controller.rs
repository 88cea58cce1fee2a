use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use tempfile::TempDir;
use uuid::Uuid;

use crate::alignment::{self, AlignmentOracle};
use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::{FileManager, FileType};
use crate::language_utils;
use crate::lyrics::{LineTimeline, split_source_lyrics};
use crate::render::{FfmpegRenderer, RenderJob, Renderer};
use crate::subtitle::{SubtitleLayout, SubtitleTimeline, SubtitleTimelineBuilder};
use crate::timeline::TimelineReconciler;
use crate::translation::{ProviderOracle, TranslationOracle, TranslationReconciler};

// @module: Per-request pipeline driver

/// State owned by a single pipeline run
///
/// Every stage receives the context explicitly; nothing is shared between
/// requests. The working directory is removed when the context is dropped.
#[derive(Debug)]
pub struct RequestContext {
    id: Uuid,
    workdir: TempDir,
}

impl RequestContext {
    pub fn new() -> Result<Self, AppError> {
        let id = Uuid::new_v4();
        let workdir = tempfile::Builder::new()
            .prefix(&format!("lyricvid-{}-", id.simple()))
            .tempdir()
            .map_err(|e| AppError::File(format!("Failed to create work directory: {}", e)))?;
        Ok(Self { id, workdir })
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    /// Log prefix, e.g. `[request 1b4e28ba]`
    pub fn tag(&self) -> String {
        let simple = self.id.simple().to_string();
        format!("[request {}]", &simple[..8])
    }
}

/// Inputs of the `create` pipeline
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub lyrics: PathBuf,
    pub audio: PathBuf,
    pub image: PathBuf,
    pub output: PathBuf,
    /// Also save the reconciled (and translated) line timeline here
    pub timeline_out: Option<PathBuf>,
    pub translate: bool,
    pub force_overwrite: bool,
}

impl CreateRequest {
    /// Whether an existing output is kept and the run skipped
    pub fn keeps_existing_output(&self) -> bool {
        self.output.exists() && !self.force_overwrite
    }
}

/// Summary of a finished pipeline run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub request_id: Uuid,
    pub line_count: usize,
    pub entry_count: usize,
    pub skipped_count: usize,
    pub missing_translation_count: usize,
    pub output: PathBuf,
    pub elapsed: Duration,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self, AppError> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Language key translations are stored under
    pub fn translation_key(&self) -> String {
        language_utils::normalize_to_part1_or_part2t(&self.config.target_language)
            .unwrap_or_else(|_| self.config.target_language.clone())
    }

    fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        spinner.set_style(style);
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Align raw lyrics against audio and repair the timestamps
    pub async fn align(
        &self,
        ctx: &RequestContext,
        raw_lyrics: &str,
        audio: &Path,
        oracle: &dyn AlignmentOracle,
    ) -> Result<LineTimeline, AppError> {
        let source_lines = split_source_lyrics(raw_lyrics);
        if source_lines.is_empty() {
            warn!("{} Lyrics contain no lines", ctx.tag());
            return Ok(LineTimeline::new());
        }

        let request = alignment::build_alignment_request(&source_lines, &self.config.source_language)
            .map_err(|e| AppError::Config(e.to_string()))?;

        info!("{} Aligning {} lines with {}", ctx.tag(), source_lines.len(), oracle.name());
        let spinner = Self::spinner("Aligning lyrics");
        let aligned = oracle.align(audio, &request).await;
        spinner.finish_and_clear();
        let aligned = aligned?;

        let reconciler = TimelineReconciler::new(self.config.timeline.padding_seconds);
        let timeline = reconciler.reconcile(&source_lines, aligned)?;
        debug!("{} Reconciled {} lines", ctx.tag(), timeline.len());
        Ok(timeline)
    }

    /// Translate the timeline in place under the target language key
    pub async fn translate(
        &self,
        ctx: &RequestContext,
        timeline: &mut LineTimeline,
        oracle: &dyn TranslationOracle,
    ) -> Result<(), AppError> {
        let reconciler = TranslationReconciler::new(
            &self.config.source_language,
            &self.config.target_language,
            &self.config.translation.common,
        );

        info!(
            "{} Translating {} lines with {} - {}",
            ctx.tag(),
            timeline.len(),
            self.config.translation.provider.display_name(),
            self.config.translation.get_model()
        );
        let spinner = Self::spinner("Translating lyrics");
        let result = reconciler.translate_timeline(timeline, &self.translation_key(), oracle).await;
        spinner.finish_and_clear();
        result?;
        Ok(())
    }

    /// Build renderer input for a timeline
    pub fn build_subtitles(
        &self,
        ctx: &RequestContext,
        timeline: &LineTimeline,
        media_duration: f64,
    ) -> Result<SubtitleTimeline, AppError> {
        let layout = SubtitleLayout::from_config(
            &self.config.subtitle,
            &self.config.source_language,
            &self.translation_key(),
        );
        let subtitles = SubtitleTimelineBuilder::new(layout).build(timeline, media_duration)?;

        if !subtitles.skipped.is_empty() {
            warn!("{} Skipped {} invalid lines", ctx.tag(), subtitles.skipped.len());
        }
        if !subtitles.missing_translations.is_empty() {
            warn!(
                "{} {} lines have no translation and are shown untranslated",
                ctx.tag(),
                subtitles.missing_translations.len()
            );
        }
        Ok(subtitles)
    }

    /// Render a subtitle timeline over the image and audio
    pub async fn render(
        &self,
        ctx: &RequestContext,
        subtitles: &SubtitleTimeline,
        image: &Path,
        audio: &Path,
        output: &Path,
        renderer: &dyn Renderer,
    ) -> Result<(), AppError> {
        let job = RenderJob {
            subtitles,
            image,
            audio,
            output,
            workdir: ctx.workdir(),
        };

        info!("{} Rendering {} captions", ctx.tag(), subtitles.len());
        let spinner = Self::spinner("Rendering video");
        let result = renderer.render(&job).await;
        spinner.finish_and_clear();
        Ok(result?)
    }

    /// Align and reconcile, using the configured alignment oracle
    pub async fn run_align(&self, lyrics: &Path, audio: &Path) -> Result<LineTimeline, AppError> {
        let ctx = RequestContext::new()?;
        let raw = read_input(lyrics, FileType::Lyrics)?;
        require_input(audio, FileType::Audio)?;
        let oracle = alignment::from_config(&self.config.alignment);
        self.align(&ctx, &raw, audio, oracle.as_ref()).await
    }

    /// Make sure the translation provider answers before any work is spent on it
    async fn check_translation_provider(&self, oracle: &ProviderOracle) -> Result<(), AppError> {
        debug!(
            "Checking {} at {}",
            self.config.translation.provider.display_name(),
            self.config.translation.get_endpoint()
        );
        oracle.test_connection().await?;
        Ok(())
    }

    /// Translate a saved timeline, using the configured translation provider
    pub async fn run_translate(&self, timeline: &Path) -> Result<LineTimeline, AppError> {
        let ctx = RequestContext::new()?;
        require_input(timeline, FileType::Timeline)?;
        let mut timeline = LineTimeline::load(timeline).map_err(|e| AppError::File(e.to_string()))?;
        if timeline.is_empty() {
            warn!("{} Timeline has no lines to translate", ctx.tag());
            return Ok(timeline);
        }
        let oracle = ProviderOracle::from_config(&self.config.translation);
        self.check_translation_provider(&oracle).await?;
        self.translate(&ctx, &mut timeline, &oracle).await?;
        Ok(timeline)
    }

    /// Render a saved timeline with the ffmpeg renderer
    pub async fn run_render(&self, timeline: &Path, audio: &Path, image: &Path, output: &Path) -> Result<(), AppError> {
        let ctx = RequestContext::new()?;
        reject_output_over_inputs(output, &[timeline, audio, image])?;
        require_input(timeline, FileType::Timeline)?;
        require_input(audio, FileType::Audio)?;
        require_input(image, FileType::Image)?;

        let timeline = LineTimeline::load(timeline).map_err(|e| AppError::File(e.to_string()))?;
        let renderer = FfmpegRenderer::new(self.config.render.clone());
        let media_duration = renderer.media_duration(audio).await?;
        let subtitles = self.build_subtitles(&ctx, &timeline, media_duration)?;
        self.render(&ctx, &subtitles, image, audio, output, &renderer).await
    }

    /// Run the full pipeline with the configured collaborators
    ///
    /// Returns `None` when the output exists and overwriting was not requested.
    pub async fn run(&self, request: CreateRequest) -> Result<Option<PipelineReport>, AppError> {
        let alignment = alignment::from_config(&self.config.alignment);
        let provider_oracle = ProviderOracle::from_config(&self.config.translation);
        let renderer = FfmpegRenderer::new(self.config.render.clone());
        let translation: Option<&dyn TranslationOracle> = if request.translate {
            if !request.keeps_existing_output() {
                self.check_translation_provider(&provider_oracle).await?;
            }
            Some(&provider_oracle)
        } else {
            None
        };
        self.run_with(request, alignment.as_ref(), translation, &renderer).await
    }

    /// Run the full pipeline with explicit collaborators
    pub async fn run_with(
        &self,
        request: CreateRequest,
        alignment: &dyn AlignmentOracle,
        translation: Option<&dyn TranslationOracle>,
        renderer: &dyn Renderer,
    ) -> Result<Option<PipelineReport>, AppError> {
        let start_time = Instant::now();

        reject_output_over_inputs(
            &request.output,
            &[request.lyrics.as_path(), request.audio.as_path(), request.image.as_path()],
        )?;
        if request.keeps_existing_output() {
            warn!(
                "Skipping, output already exists (use -f to force overwrite): {}",
                request.output.display()
            );
            return Ok(None);
        }

        let raw = read_input(&request.lyrics, FileType::Lyrics)?;
        require_input(&request.audio, FileType::Audio)?;
        require_input(&request.image, FileType::Image)?;

        let ctx = RequestContext::new()?;
        info!("{} Creating {}", ctx.tag(), request.output.display());

        let mut timeline = self.align(&ctx, &raw, &request.audio, alignment).await?;

        match translation {
            Some(oracle) if !timeline.is_empty() => self.translate(&ctx, &mut timeline, oracle).await?,
            Some(_) => debug!("{} Nothing to translate", ctx.tag()),
            None => info!("{} Translation disabled", ctx.tag()),
        }

        if let Some(path) = &request.timeline_out {
            timeline.save(path).map_err(|e| AppError::File(e.to_string()))?;
            info!("{} Timeline saved to {}", ctx.tag(), path.display());
        }

        let media_duration = renderer.media_duration(&request.audio).await?;
        let subtitles = self.build_subtitles(&ctx, &timeline, media_duration)?;
        self.render(&ctx, &subtitles, &request.image, &request.audio, &request.output, renderer).await?;

        let report = PipelineReport {
            request_id: *ctx.id(),
            line_count: timeline.len(),
            entry_count: subtitles.len(),
            skipped_count: subtitles.skipped.len(),
            missing_translation_count: subtitles.missing_translations.len(),
            output: request.output.clone(),
            elapsed: start_time.elapsed(),
        };
        info!(
            "{} Success: {} in {}",
            ctx.tag(),
            report.output.display(),
            format_duration(report.elapsed)
        );
        Ok(Some(report))
    }
}

fn reject_output_over_inputs(output: &Path, inputs: &[&Path]) -> Result<(), AppError> {
    match inputs.iter().find(|input| FileManager::is_same_file(output, input)) {
        Some(input) => Err(AppError::File(format!(
            "Output would overwrite input file: {}",
            input.display()
        ))),
        None => Ok(()),
    }
}

fn require_input(path: &Path, expected: FileType) -> Result<(), AppError> {
    FileManager::require_file_type(path, expected).map_err(|e| AppError::File(e.to_string()))
}

fn read_input(path: &Path, expected: FileType) -> Result<String, AppError> {
    require_input(path, expected)?;
    FileManager::read_to_string(path).map_err(|e| AppError::File(e.to_string()))
}

// Format duration in a human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}.{:03}s", seconds, duration.subsec_millis())
    }
}
