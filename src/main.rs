// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};

use lyricvid::app_config::{self, AlignmentProvider, Config, ProviderConfig, TranslationProvider};
use lyricvid::app_controller::{Controller, CreateRequest};
use lyricvid::file_utils::FileManager;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    Ollama,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
        }
    }
}

/// CLI Wrapper for AlignmentProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliAligner {
    #[value(name = "musicai")]
    MusicAi,
    Uniform,
}

impl From<CliAligner> for AlignmentProvider {
    fn from(cli_aligner: CliAligner) -> Self {
        match cli_aligner {
            CliAligner::MusicAi => AlignmentProvider::MusicAi,
            CliAligner::Uniform => AlignmentProvider::Uniform,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Options shared by every pipeline command
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Alignment oracle to use
    #[arg(short, long, value_enum, global = true)]
    aligner: Option<CliAligner>,

    /// Lyrics language code (e.g., 'ja', 'ko', 'en')
    #[arg(short, long, global = true)]
    source_language: Option<String>,

    /// Translation language code (e.g., 'en', 'es', 'fr')
    #[arg(short, long, global = true)]
    target_language: Option<String>,

    /// Fade captions in and out
    #[arg(long, global = true)]
    fade: bool,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    openai_api_key: Option<String>,

    /// Music.ai API key
    #[arg(long, env = "MUSICAI_API_KEY", hide_env_values = true, global = true)]
    musicai_api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Align, translate and render a lyric video
    Create {
        /// Lyrics text file, one line per lyric line
        lyrics: PathBuf,
        /// Audio track
        audio: PathBuf,
        /// Background image
        image: PathBuf,
        /// Output video path (default: <audio stem>.lyrics.mp4 next to the audio file)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also save the line timeline JSON here
        #[arg(long)]
        timeline_out: Option<PathBuf>,
        /// Render the lyrics without translation
        #[arg(long)]
        no_translate: bool,
        /// Force overwrite of existing output files
        #[arg(short, long)]
        force_overwrite: bool,
    },

    /// Align lyrics to audio and save the repaired timeline
    Align {
        lyrics: PathBuf,
        audio: PathBuf,
        /// Output timeline path (default: <lyrics stem>.timeline.json next to the lyrics file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Translate a saved timeline
    Translate {
        timeline: PathBuf,
        /// Output timeline path (default: <timeline stem>.translated.json next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a saved timeline
    Render {
        timeline: PathBuf,
        audio: PathBuf,
        image: PathBuf,
        /// Output video path (default: <audio stem>.lyrics.mp4 next to the audio file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions for lyricvid
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// lyricvid - lyric videos with timed, translated subtitles
#[derive(Parser, Debug)]
#[command(name = "lyricvid")]
#[command(version)]
#[command(about = "Create lyric videos with aligned, translated subtitles")]
#[command(long_about = "lyricvid aligns lyric lines to a song, translates them and renders them over a still image.

EXAMPLES:
    lyricvid create song.txt song.mp3 cover.png             # Full pipeline using conf.json
    lyricvid create -f song.txt song.mp3 cover.png          # Overwrite an existing video
    lyricvid create --no-translate song.txt song.mp3 cover.png
    lyricvid -a uniform create song.txt song.mp3 cover.png  # Preview timing without Music.ai
    lyricvid align song.txt song.mp3 -o song.json           # Save the repaired timeline
    lyricvid -p ollama translate song.json                  # Translate with a local model
    lyricvid --fade render song.json song.mp3 cover.png     # Render an edited timeline
    lyricvid completions bash > lyricvid.bash               # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, marker, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Everything is enabled at the logger; the max level filters
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "lyricvid", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&cli.common)?;
    config.validate_common().context("Configuration validation failed")?;

    if cli.common.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config.clone())?;

    match cli.command {
        Commands::Create { lyrics, audio, image, output, timeline_out, no_translate, force_overwrite } => {
            config.validate_alignment().context("Configuration validation failed")?;
            if !no_translate {
                config.validate_translation().context("Configuration validation failed")?;
            }

            let output = output.unwrap_or_else(|| FileManager::default_output_path(&audio, "lyrics", "mp4"));
            let request = CreateRequest {
                lyrics,
                audio,
                image,
                output,
                timeline_out,
                translate: !no_translate,
                force_overwrite,
            };
            controller.run(request).await?;
        }
        Commands::Align { lyrics, audio, output } => {
            config.validate_alignment().context("Configuration validation failed")?;
            let timeline = controller.run_align(&lyrics, &audio).await?;
            let output = output.unwrap_or_else(|| FileManager::default_output_path(&lyrics, "timeline", "json"));
            timeline.save(&output)?;
            info!("Success: {}", output.display());
        }
        Commands::Translate { timeline, output } => {
            config.validate_translation().context("Configuration validation failed")?;
            let translated = controller.run_translate(&timeline).await?;
            let output = output.unwrap_or_else(|| FileManager::default_output_path(&timeline, "translated", "json"));
            translated.save(&output)?;
            info!("Success: {}", output.display());
        }
        Commands::Render { timeline, audio, image, output } => {
            let output = output.unwrap_or_else(|| FileManager::default_output_path(&audio, "lyrics", "mp4"));
            controller.run_render(&timeline, &audio, &image, &output).await?;
            info!("Success: {}", output.display());
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Load or create the configuration, then apply CLI overrides
fn load_config(options: &CommonArgs) -> Result<Config> {
    let mut config = if options.config.exists() {
        Config::load(&options.config)?
    } else {
        warn!("Config file not found at '{}', creating default config.", options.config.display());
        let config = Config::default();
        config.save(&options.config)
            .with_context(|| format!("Failed to write default config to file: {}", options.config.display()))?;
        config
    };

    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(aligner) = &options.aligner {
        config.alignment.provider = aligner.clone().into();
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if options.fade {
        config.subtitle.enable_fade = true;
    }

    if let Some(key) = options.openai_api_key.as_ref().filter(|k| !k.is_empty()) {
        let openai_type = TranslationProvider::OpenAI.to_lowercase_string();
        let providers = &mut config.translation.available_providers;
        match providers.iter_mut().find(|p| p.provider_type == openai_type) {
            Some(openai) => openai.api_key = key.clone(),
            None => {
                let mut openai = ProviderConfig::new(TranslationProvider::OpenAI);
                openai.api_key = key.clone();
                providers.push(openai);
            }
        }
    }

    if let Some(key) = options.musicai_api_key.as_ref().filter(|k| !k.is_empty()) {
        config.alignment.api_key = key.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}
