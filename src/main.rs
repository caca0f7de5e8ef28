// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Result, Context};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use docbatch::app_config::{self, Config, TranslationProvider};
use docbatch::app_controller::{Controller, resolve_config_path};

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Ollama,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
    #[value(name = "lmstudio")]
    LMStudio,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
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
    /// Translate a JSON file of text units
    Translate(TranslateArgs),

    /// Inspect or empty the translation cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        /// Configuration file path
        #[arg(short, long)]
        config_path: Option<PathBuf>,
    },

    /// Generate shell completions for docbatch
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    /// Show where the cache lives and how many entries it holds
    Stats,
    /// Remove every cached translation
    Clear,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// JSON file with the text units to translate
    #[arg(value_name = "UNITS_JSON")]
    input_path: PathBuf,

    /// Output file (defaults to <input>.<target language>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language (e.g., 'English')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language (e.g., 'French')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Neither read nor write the translation cache
    #[arg(long)]
    no_cache: bool,

    /// Batches sent to the provider at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Character budget per batch
    #[arg(long)]
    context_window: Option<i64>,
}

/// docbatch - Batch translation of document text with AI
///
/// Packs document text units into size-bounded batches and translates
/// them concurrently using various AI providers (OpenAI, Anthropic, Ollama).
#[derive(Parser, Debug)]
#[command(name = "docbatch")]
#[command(version)]
#[command(about = "AI-powered batch document translation tool")]
#[command(long_about = "docbatch translates the text units of a document in batches using AI providers.

EXAMPLES:
    docbatch translate units.json                        # Translate using default config
    docbatch translate -p openai -m gpt-4o units.json    # Use specific provider and model
    docbatch translate -s English -t German units.json   # Translate from English to German
    docbatch translate --concurrency 5 units.json        # Send up to 5 batches at once
    docbatch translate --no-cache units.json             # Bypass the translation cache
    docbatch cache stats                                 # Show the translation cache
    docbatch completions bash > docbatch.bash            # Generate bash completions

INPUT:
    A JSON array of {\"id\", \"text\"} objects, or {\"units\": [...]}.

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    openai    - OpenAI API (requires API key)
    anthropic - Anthropic Claude API (requires API key)
    ollama    - Local Ollama server (default: llama3.2:3b)
    lmstudio  - LM Studio local server (OpenAI-compatible on http://localhost:1234/v1)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set through max_level
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "docbatch", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => run_translate(args).await,
        Commands::Cache { action, config_path } => run_cache(action, config_path),
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = resolve_config_path(options.config_path.as_deref());
    let mut config = Config::load_or_create(&config_path)?;
    apply_overrides(&mut config, &options);

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let controller = Controller::with_config(config)?;
    let report = controller.run(options.input_path, options.output).await?;

    if report.failed_units > 0 {
        info!("Done with {} untranslated units", report.failed_units);
    }
    Ok(())
}

fn run_cache(action: CacheAction, config_path: Option<PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(config_path.as_deref());
    let config = Config::load_or_create(&config_path)?;
    log::set_max_level(config.log_level.to_level_filter());
    let controller = Controller::with_config(config)?;

    match action {
        CacheAction::Stats => {
            let summary = controller.cache_summary()?;
            match summary.path {
                Some(path) => info!("Translation cache: {} ({} entries)", path.display(), summary.entries),
                None => info!("Translation cache is disabled"),
            }
        }
        CacheAction::Clear => {
            let removed = controller.clear_cache()?;
            info!("Removed {} cached translations", removed);
        }
    }
    Ok(())
}

// Override config with CLI options if provided
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &options.model {
        config.translation.active_provider_config_mut().model = model.clone();
    }

    if let Some(concurrency) = options.concurrency {
        config.translation.active_provider_config_mut().concurrent_requests = concurrency;
    }

    if let Some(context_window) = options.context_window {
        config.translation.active_provider_config_mut().max_chars_per_request = context_window;
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }

    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    if options.no_cache {
        config.cache.enabled = false;
    }
}
