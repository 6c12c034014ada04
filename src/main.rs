// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use phasewai::app_config::{self, Config, TranslationProvider};
use phasewai::app_controller::Controller;
use phasewai::drive_sync::{DriveLayout, DriveOptions, DriveSync};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Anthropic,
    #[value(name = "openai")]
    OpenAI,
    Ollama,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate lesson captions (default command)
    Translate(TranslateArgs),

    /// Sync captions from a shared remote folder, translate new ones and sync the results back
    Drive(DriveArgs),

    /// Generate shell completions for phasewai
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that loads the configuration
#[derive(clap::Args, Debug, Clone)]
struct CommonArgs {
    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(clap::Args, Debug)]
struct TranslateArgs {
    /// Input SRT file or directory containing SRT files
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output SRT file or directory; defaults to <input>_<target>.srt next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Glossary CSV file (columns: Chinese, English, Category, Notes)
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Number of subtitles per translation batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Number of subtitles repeated from the previous batch
    #[arg(long)]
    overlap: Option<usize>,

    /// Write a review log of subtitles with ambiguous phase context
    #[arg(long)]
    review_log: Option<PathBuf>,

    /// Fail when any subtitle is left untranslated
    #[arg(long)]
    strict: bool,

    /// Source language code (e.g., 'zh')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en')
    #[arg(short, long)]
    target_language: Option<String>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(clap::Args, Debug)]
struct DriveArgs {
    /// Show what would be processed without translating
    #[arg(long)]
    dry_run: bool,

    /// Skip the remote sync and use files already in the local input folder
    #[arg(long)]
    skip_sync: bool,

    /// Re-translate one input file by name (e.g., lesson1.srt)
    #[arg(long, value_name = "NAME")]
    reprocess: Option<String>,

    /// Glossary CSV file
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

/// phasewai - phase-aware translation of watercolor lesson captions
///
/// Translates SRT captions with an LLM, telling the model for every batch
/// whether the instructor is still sketching or already painting.
#[derive(Parser, Debug)]
#[command(name = "phasewai")]
#[command(version)]
#[command(about = "Phase-aware caption translation for painting lessons")]
#[command(long_about = "phasewai translates SRT captions of watercolor lessons with an LLM. It finds where the \
instructor switches from the pencil sketch to painting and tells the model which phase every batch belongs to.

EXAMPLES:
    phasewai lesson1.srt                                  # Translate next to the input (lesson1_en.srt)
    phasewai translate lesson1.srt -g glossary.csv -o out/ # Use a glossary, write into out/
    phasewai input/ -o output/ --review-log review.log    # Translate a folder and keep a review log
    phasewai lesson1.srt -p ollama -m qwen2.5:14b         # Use a local model
    phasewai drive --dry-run                              # Show which shared files are new
    phasewai completions bash > phasewai.bash             # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    anthropic - Anthropic Claude API (default, requires ANTHROPIC_API_KEY or a key in the config)
    openai    - OpenAI API (requires OPENAI_API_KEY or a key in the config)
    ollama    - Local Ollama server
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input SRT file or directory containing SRT files
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output SRT file or directory; defaults to <input>_<target>.srt next to the input
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Glossary CSV file (columns: Chinese, English, Category, Notes)
    #[arg(short, long)]
    glossary: Option<PathBuf>,

    /// Number of subtitles per translation batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Number of subtitles repeated from the previous batch
    #[arg(long)]
    overlap: Option<usize>,

    /// Write a review log of subtitles with ambiguous phase context
    #[arg(long)]
    review_log: Option<PathBuf>,

    /// Fail when any subtitle is left untranslated
    #[arg(long)]
    strict: bool,

    /// Source language code (e.g., 'zh')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'en')
    #[arg(short, long)]
    target_language: Option<String>,

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

    // @initializes: Global logger; the real level is applied later with log::set_max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Color escape and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let (color, emoji) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the configuration says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "phasewai", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Drive(args)) => run_drive(args).await,
        None => {
            // Top-level arguments act as the translate command
            let input = cli
                .input
                .ok_or_else(|| anyhow!("INPUT is required when no subcommand is specified"))?;

            let args = TranslateArgs {
                input,
                output: cli.output,
                glossary: cli.glossary,
                batch_size: cli.batch_size,
                overlap: cli.overlap,
                review_log: cli.review_log,
                strict: cli.strict,
                source_language: cli.source_language,
                target_language: cli.target_language,
                common: cli.common,
            };
            run_translate(args).await
        }
    }
}

/// Load the configuration, apply the shared CLI overrides and the log level
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level((&level).into());
    }

    let mut config = Config::load_or_create(&common.config_path)?;

    if let Some(provider) = &common.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &common.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }
    if let Some(level) = &common.log_level {
        config.log_level = level.clone().into();
    }

    log::set_max_level((&config.log_level).into());
    Ok(config)
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;

    if let Some(source_language) = &args.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(target_language) = &args.target_language {
        config.target_language = target_language.clone();
    }
    if let Some(batch_size) = args.batch_size {
        config.batching.batch_size = batch_size;
    }
    if let Some(overlap) = args.overlap {
        config.batching.overlap = overlap;
    }
    if args.strict {
        config.batching.strict_coverage = true;
    }

    config.validate().context("Configuration validation failed")?;

    info!(
        "phasewai: {} - {}",
        config.translation.provider.display_name(),
        config.translation.get_model()
    );

    let controller = Controller::with_config(config)?;
    controller
        .run(
            &args.input,
            args.output.as_deref(),
            args.glossary.as_deref(),
            args.review_log.as_deref(),
        )
        .await?;

    info!("Done.");
    Ok(())
}

async fn run_drive(args: DriveArgs) -> Result<()> {
    let config = load_config(&args.common)?;

    // A dry run never calls the provider, so it needs no credentials
    let validation = if args.dry_run {
        config.validate_settings()
    } else {
        config.validate()
    };
    validation.context("Configuration validation failed")?;

    let controller = if args.dry_run {
        None
    } else {
        Some(Controller::with_config(config.clone())?)
    };

    let options = DriveOptions {
        dry_run: args.dry_run,
        skip_sync: args.skip_sync,
        reprocess: args.reprocess,
        glossary: args.glossary,
    };

    let sync = DriveSync::new(DriveLayout::from_config(&config.drive));
    let report = sync.run(&options, controller.as_ref()).await?;

    if !report.failed.is_empty() {
        return Err(anyhow!("{} file(s) failed and will be retried on the next run", report.failed.len()));
    }
    info!("All done!");
    Ok(())
}
