// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};

use crate::app_config::{Credentials, RunConfig};
use crate::app_controller::Controller;
use crate::language_utils::StatisticalDetector;
use crate::providers::google::GoogleTranslate;
use crate::providers::opensubtitles::OpenSubtitles;

mod app_config;
mod app_controller;
mod errors;
mod file_utils;
mod language_utils;
mod nfo_processor;
mod providers;
mod subtitle_processor;

/// CLI log level argument, mapped to the log crate's LevelFilter
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch missing subtitles for the video files under a directory
    Subtitles(SubtitlesArgs),

    /// Translate the text fields of NFO/XML files under a directory
    Translate(TranslateArgs),

    /// Generate shell completions for subnfo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct SubtitlesArgs {
    /// Directory containing video files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Target subtitle language code (e.g. 'en', 'fr')
    #[arg(value_name = "LANGUAGE", default_value = "en")]
    language: String,

    /// OpenSubtitles username (or OPENSUBTITLES_USERNAME)
    #[arg(value_name = "USERNAME")]
    username: Option<String>,

    /// OpenSubtitles password (or OPENSUBTITLES_PASSWORD)
    #[arg(value_name = "PASSWORD")]
    password: Option<String>,

    /// OpenSubtitles API key (or OPENSUBTITLES_API_KEY)
    #[arg(value_name = "API_KEY")]
    api_key: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Directory containing NFO or XML files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// Target language code (e.g. 'en', 'fr')
    #[arg(value_name = "LANGUAGE", default_value = "en")]
    language: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subnfo - subtitle fetching and NFO translation for media libraries
#[derive(Parser, Debug)]
#[command(name = "subnfo")]
#[command(version)]
#[command(about = "Batch subtitle fetching and NFO metadata translation")]
#[command(long_about = "subnfo walks a media directory tree and either fetches missing subtitles \
from OpenSubtitles or translates NFO/XML metadata fields into a target language.

EXAMPLES:
    subnfo subtitles /media/Movies fr                      # Fetch French subtitles
    subnfo subtitles /media/Movies en myuser mypass mykey  # Credentials as arguments
    subnfo translate /media/Movies en                      # Translate metadata to English
    subnfo completions bash > subnfo.bash                  # Generate bash completions

CREDENTIALS:
    The subtitles command needs an OpenSubtitles account. Credentials are read
    from OPENSUBTITLES_USERNAME, OPENSUBTITLES_PASSWORD and OPENSUBTITLES_API_KEY,
    which take precedence over the positional arguments.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
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
    // Filter on the global max level so command-line overrides applied
    // after init take effect
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info level until a command-line override is known
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subnfo", &mut std::io::stdout());
            Ok(())
        }
        Commands::Subtitles(args) => run_subtitles(args).await,
        Commands::Translate(args) => run_translate(args).await,
    }
}

async fn run_subtitles(args: SubtitlesArgs) -> Result<()> {
    if let Some(level) = args.log_level {
        log::set_max_level(level.into());
    }

    let credentials = Credentials::resolve(args.username, args.password, args.api_key)?;

    let config = RunConfig::new(args.directory, args.language.to_lowercase());
    let controller = Controller::with_config(config)?;

    let mut source = OpenSubtitles::new(credentials.api_key, app_config::USER_AGENT);
    source.login(&credentials.username, &credentials.password).await?;

    let summary = controller.run_subtitles(&source).await?;

    // Quota exhaustion ends the run cleanly; a scheduler re-invokes later
    if summary.quota_stop.is_some() {
        info!("Stopping until the download quota resets");
    }

    Ok(())
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    if let Some(level) = args.log_level {
        log::set_max_level(level.into());
    }

    let config = RunConfig::new(args.directory, args.language.to_lowercase());
    let controller = Controller::with_config(config)?;

    let translator = GoogleTranslate::new();
    let detector = StatisticalDetector::new();

    controller.run_translate(&translator, &detector).await?;

    Ok(())
}
