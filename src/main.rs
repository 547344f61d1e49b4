// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use pagewise::app_config::{self, Config, TranslationProvider};
use pagewise::app_controller::Controller;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Google,
    Ollama,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Google => TranslationProvider::Google,
            CliTranslationProvider::Ollama => TranslationProvider::Ollama,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
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
    /// Translate PDF documents page by page (default command)
    Translate(TranslateArgs),

    /// Show the stored progress of a document
    Status {
        /// Input PDF file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "conf.json")]
        config_path: String,

        /// Output directory holding translation state
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Generate shell completions for pagewise
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug, Clone)]
struct TranslateArgs {
    /// Input PDF file or directory; omit to pick from the input folder
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Source language code (e.g., 'en', 'fr') or 'auto'
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g., 'id', 'es')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output directory for translation state and results
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Discard stored progress and translate from the first page
    #[arg(long)]
    restart: bool,

    /// Do not retry pages that failed in an earlier run
    #[arg(long)]
    skip_failed: bool,
}

/// pagewise - resumable page-by-page PDF translation
///
/// Translates the text of PDF documents one page at a time, recording
/// progress after every page so an interrupted job picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(version)]
#[command(about = "Resumable page-by-page PDF translation")]
#[command(long_about = "pagewise translates the text of PDF documents page by page and keeps
progress on disk, so interrupted jobs resume without repeating finished pages.

EXAMPLES:
    pagewise report.pdf                      # Translate using default config
    pagewise -s en -t de report.pdf          # Translate from English to German
    pagewise -p ollama -m llama3.2:3b docs/  # Translate a whole folder with Ollama
    pagewise                                 # Pick a document from the input folder
    pagewise --restart report.pdf            # Forget earlier progress
    pagewise status report.pdf               # Show stored progress
    pagewise completions bash > pagewise.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

OUTPUT:
    <output_dir>/<document>/translated_<document>.txt and .pdf, next to the
    progress record (progress.json) and per-page results (pages/).")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or CLI says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "pagewise", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Status { input, config_path, output_dir }) => {
            let mut config = load_config(&config_path)?;
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            set_log_level(&config.log_level);
            Controller::with_config(config)?.status(&input)
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

fn set_log_level(level: &app_config::LogLevel) {
    log::set_max_level(level.to_level_filter());
}

/// Load the config file, creating it with defaults when missing
fn load_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        Ok(config)
    }
}

/// Apply command line overrides on top of the loaded config
fn apply_overrides(config: &mut Config, options: &TranslateArgs) {
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &options.model {
        if let Some(provider_config) = config.translation.get_active_provider_config_mut() {
            provider_config.model = model.clone();
        }
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if let Some(output_dir) = &options.output_dir {
        config.output_dir = output_dir.clone();
    }
    if options.skip_failed {
        config.pipeline.retry_failed_pages = false;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    // A command line level applies before the config is even read
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        set_log_level(&level);
    }

    let mut config = load_config(&options.config_path)?;
    apply_overrides(&mut config, &options);
    config.validate().context("Configuration validation failed")?;
    set_log_level(&config.log_level);

    let controller = Controller::with_config(config)?;
    match &options.input_path {
        Some(path) if path.is_file() => {
            controller.run(path.clone(), options.restart).await?;
        }
        Some(path) if path.is_dir() => {
            controller.run_folder(path.clone(), options.restart).await?;
        }
        Some(path) => {
            return Err(anyhow::anyhow!("Input path does not exist: {:?}", path));
        }
        None => controller.run_interactive(options.restart).await?,
    }

    Ok(())
}
