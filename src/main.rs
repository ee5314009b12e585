// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use hbs_translate::app_config::{self, BackendKind, Config, DispatchStrategy};
use hbs_translate::app_controller::{Controller, FileOutcome};
use hbs_translate::server;
use hbs_translate::translation::TranslationPipeline;

/// CLI Wrapper for BackendKind to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliBackend {
    Google,
    Libretranslate,
    Identity,
}

impl From<CliBackend> for BackendKind {
    fn from(cli_backend: CliBackend) -> Self {
        match cli_backend {
            CliBackend::Google => BackendKind::Google,
            CliBackend::Libretranslate => BackendKind::LibreTranslate,
            CliBackend::Identity => BackendKind::Identity,
        }
    }
}

/// CLI Wrapper for DispatchStrategy to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDispatch {
    Limiter,
    WorkerPool,
}

impl From<CliDispatch> for DispatchStrategy {
    fn from(cli_dispatch: CliDispatch) -> Self {
        match cli_dispatch {
            CliDispatch::Limiter => DispatchStrategy::Limiter,
            CliDispatch::WorkerPool => DispatchStrategy::WorkerPool,
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
    /// Translate a template file or every template in a folder (default command)
    Translate(TranslateArgs),

    /// Serve the upload endpoint
    Serve(ServeArgs),

    /// Inspect or clear the persistent translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for hbs-translate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    /// Show cache statistics
    Stats,
    /// Delete every cached translation
    Clear,
}

/// Options shared by every command that reads the configuration
#[derive(Args, Debug, Clone)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Overrides of the translation settings
#[derive(Args, Debug, Clone)]
struct TranslationOverrides {
    /// Translation backend to use
    #[arg(short, long, value_enum)]
    backend: Option<CliBackend>,

    /// Source language code (e.g., 'en', 'auto')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'es', 'ja')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Scheduling strategy for translation requests
    #[arg(long, value_enum)]
    dispatch: Option<CliDispatch>,

    /// Maximum number of simultaneous translation requests
    #[arg(long)]
    concurrency: Option<usize>,

    /// Disable the translation cache
    #[arg(long)]
    no_cache: bool,
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    /// Template file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Directory for translated files (defaults to next to each input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    #[command(flatten)]
    overrides: TranslationOverrides,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    #[command(flatten)]
    overrides: TranslationOverrides,

    #[command(flatten)]
    common: CommonArgs,
}

/// hbs-translate - selective translation of Handlebars/HTML templates
///
/// Translates only the human-readable text of a template; tags, attributes,
/// template expressions, URLs and style blocks are copied unchanged.
#[derive(Parser, Debug)]
#[command(name = "hbs-translate")]
#[command(version)]
#[command(about = "Selective translation of Handlebars/HTML templates")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "hbs-translate translates the text of Handlebars/HTML templates while keeping markup and template expressions intact.

EXAMPLES:
    hbs-translate email.handlebars                 # Translate using default config
    hbs-translate -f email.handlebars              # Force overwrite existing output
    hbs-translate -t ja views/                     # Translate a whole folder to Japanese
    hbs-translate -b libretranslate -t de page.html
    hbs-translate serve --port 3000                # Start the upload endpoint
    hbs-translate cache stats                      # Show persistent cache statistics
    hbs-translate completions bash > hbs-translate.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED BACKENDS:
    google         - Public Google Translate web endpoint (default)
    libretranslate - LibreTranslate server (requires endpoint)
    identity       - Dry run, text is returned unchanged")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
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
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn decoration_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => ("✅ ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
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
            let (emoji, colour) = Self::decoration_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the max level is lowered once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "hbs-translate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        Some(Commands::Serve(args)) => run_serve(args).await,
        Some(Commands::Cache { action, common }) => run_cache(action, common).await,
        None => run_translate(cli.translate).await,
    }
}

/// Load the configuration file, apply CLI overrides and set the log level
fn load_config(common: &CommonArgs, overrides: Option<&TranslationOverrides>) -> Result<Config> {
    if let Some(level) = &common.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(Path::new(&common.config_path))?;

    if let Some(overrides) = overrides {
        if let Some(backend) = &overrides.backend {
            config.translation.backend = backend.clone().into();
        }
        if let Some(source_lang) = &overrides.source_language {
            config.source_language = source_lang.clone();
        }
        if let Some(target_lang) = &overrides.target_language {
            config.target_language = target_lang.clone();
        }
        if let Some(dispatch) = &overrides.dispatch {
            config.translation.dispatch = dispatch.clone().into();
        }
        if let Some(concurrency) = overrides.concurrency {
            config.translation.max_concurrent_requests = concurrency;
            config.translation.worker_count = concurrency;
        }
        if overrides.no_cache {
            config.cache.enabled = false;
        }
    }

    if let Some(level) = &common.log_level {
        config.log_level = level.clone().into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let input_path = options
        .input_path
        .clone()
        .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;

    let config = load_config(&options.common, Some(&options.overrides))?;
    let controller = Controller::with_config(config)?;

    if input_path.is_file() {
        match controller.run(input_path, options.output, options.force_overwrite).await? {
            FileOutcome::Translated { output, .. } => info!("Success: {:?}", output),
            FileOutcome::Skipped { .. } => {}
        }
    } else if input_path.is_dir() {
        let summary = controller
            .run_folder(input_path, options.output, options.force_overwrite)
            .await?;
        if summary.failed > 0 {
            return Err(anyhow!("{} file(s) failed to translate", summary.failed));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

async fn run_serve(options: ServeArgs) -> Result<()> {
    let config = load_config(&options.common, Some(&options.overrides))?;
    let pipeline = TranslationPipeline::from_config(&config)?;
    server::serve(pipeline, &options.host, options.port).await
}

async fn run_cache(action: CacheAction, common: CommonArgs) -> Result<()> {
    let config = load_config(&common, None)?;

    match action {
        CacheAction::Stats => {
            let stats = Controller::cache_stats(&config.cache).await?;
            info!("{}", stats);
            if let (Some(oldest), Some(newest)) = (&stats.oldest_entry, &stats.newest_entry) {
                info!("Oldest entry: {}, newest entry: {}", oldest, newest);
            }
        }
        CacheAction::Clear => {
            let deleted = Controller::clear_cache(&config.cache).await?;
            info!("Removed {} cached translations", deleted);
        }
    }

    Ok(())
}
