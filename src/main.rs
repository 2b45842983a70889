// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info};

use crate::app_config::{Config, LogLevel};
use crate::batch::BatchController;
use crate::providers::chat::ChatClient;
use crate::scoring::ChrfClient;
use crate::translation::{PromptProfile, RetryPolicy, Translator};

mod app_config;
mod batch;
mod errors;
mod extraction;
mod providers;
mod scoring;
mod translation;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the legacy-code column of a CSV table (default command)
    #[command(alias = "translate")]
    Translate(TranslateArgs),

    /// Generate shell completions for esotran
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input CSV file
    #[arg(value_name = "INPUT_CSV")]
    input_csv: PathBuf,

    /// Output CSV file
    #[arg(value_name = "OUTPUT_CSV")]
    output_csv: PathBuf,

    /// Column containing the legacy code
    #[arg(long, default_value = "legacy_code")]
    legacy_col: String,

    /// Column to write the translated code to
    #[arg(long, default_value = "translated_code")]
    translated_col: String,

    /// Column containing the reference translation for scoring
    #[arg(long, default_value = "Reference")]
    reference_col: String,

    /// Sampling temperature
    #[arg(short = 'T', long, default_value_t = 0.1)]
    temperature: f32,

    /// Maximum tokens to generate (fixed-budget profiles)
    #[arg(short = 'M', long, default_value_t = 2048)]
    max_tokens: u32,

    /// Prompt profile: 'json' (structured contract) or 'plain' (bare code)
    #[arg(short, long, default_value = "json")]
    profile: String,

    /// Field delimiter; auto-detected from the header when omitted
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Skip chrF scoring even when a scoring endpoint is configured
    #[arg(long)]
    no_score: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// esotran - legacy ESOPE/Fortran to Fortran 2008 batch translator
///
/// Feeds each row of a CSV table to an LLM completion endpoint and writes the
/// table back out with the translated code (and optionally a chrF score).
#[derive(Parser, Debug)]
#[command(name = "esotran")]
#[command(version = "0.1.0")]
#[command(about = "LLM-backed ESOPE/Fortran to Fortran 2008 CSV translator")]
#[command(long_about = "esotran translates the legacy-code column of a CSV table to modern \
Fortran 2008 by calling an OpenAI-compatible completion endpoint row by row.

EXAMPLES:
    esotran input.csv output.csv                 # Translate with defaults
    esotran -p plain input.csv output.csv        # Bare-code response contract
    esotran --legacy-col src input.csv out.csv   # Non-default column name
    esotran -T 0.3 -M 4096 input.csv out.csv     # Sampling overrides
    esotran completions bash > esotran.bash      # Generate bash completions

ENVIRONMENT:
    API_URL    Completion endpoint (default http://localhost:8000/v1/chat/completions)
    MODEL_ID   Model identifier sent with every request
    CHRF_URL   chrF scoring endpoint; scoring is skipped when unset")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input CSV file
    #[arg(value_name = "INPUT_CSV")]
    input_csv: Option<PathBuf>,

    /// Output CSV file
    #[arg(value_name = "OUTPUT_CSV")]
    output_csv: Option<PathBuf>,

    /// Column containing the legacy code
    #[arg(long, default_value = "legacy_code")]
    legacy_col: String,

    /// Column to write the translated code to
    #[arg(long, default_value = "translated_code")]
    translated_col: String,

    /// Column containing the reference translation for scoring
    #[arg(long, default_value = "Reference")]
    reference_col: String,

    /// Sampling temperature
    #[arg(short = 'T', long, default_value_t = 0.1)]
    temperature: f32,

    /// Maximum tokens to generate (fixed-budget profiles)
    #[arg(short = 'M', long, default_value_t = 2048)]
    max_tokens: u32,

    /// Prompt profile: 'json' (structured contract) or 'plain' (bare code)
    #[arg(short, long, default_value = "json")]
    profile: String,

    /// Field delimiter; auto-detected from the header when omitted
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Skip chrF scoring even when a scoring endpoint is configured
    #[arg(long)]
    no_score: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
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
    // Initialize the logger once with info level by default;
    // the level is adjusted after parsing the CLI if needed.
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "esotran", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let input_csv = cli
                .input_csv
                .ok_or_else(|| anyhow!("INPUT_CSV is required when no subcommand is specified"))?;
            let output_csv = cli
                .output_csv
                .ok_or_else(|| anyhow!("OUTPUT_CSV is required when no subcommand is specified"))?;

            let args = TranslateArgs {
                input_csv,
                output_csv,
                legacy_col: cli.legacy_col,
                translated_col: cli.translated_col,
                reference_col: cli.reference_col,
                temperature: cli.temperature,
                max_tokens: cli.max_tokens,
                profile: cli.profile,
                delimiter: cli.delimiter,
                no_score: cli.no_score,
                log_level: cli.log_level,
            };
            run_translate(args).await
        }
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level = match LogLevel::from(cmd_log_level.clone()) {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        };
        log::set_max_level(level);
    }

    if !Path::new(&options.input_csv).is_file() {
        return Err(anyhow!(
            "Input file '{}' does not exist",
            options.input_csv.display()
        ));
    }

    // Defaults + environment, then CLI overrides on top.
    let mut config = Config::from_env();
    config.legacy_col = options.legacy_col;
    config.translated_col = options.translated_col;
    config.reference_col = options.reference_col;
    config.temperature = options.temperature;
    config.max_tokens = options.max_tokens;
    config.validate()?;

    let profile: PromptProfile = options.profile.parse()?;

    info!("completion endpoint: {}", config.endpoint);
    info!("model: {}", if config.model.is_empty() { "<unset>" } else { config.model.as_str() });
    info!("prompt profile: {}", profile.name);

    let backend = ChatClient::new(&config.endpoint, config.timeout_secs);
    let translator = Translator::new(backend, &config.model, profile).with_retry(RetryPolicy {
        max_attempts: config.max_retries,
        backoff_base: std::time::Duration::from_millis(config.backoff_base_ms),
    });

    let scorer = if options.no_score {
        None
    } else {
        config
            .chrf_endpoint
            .as_ref()
            .map(|url| ChrfClient::new(url, config.timeout_secs))
    };
    if scorer.is_none() {
        info!("scoring disabled, score column will be left empty");
    }

    let delimiter = options.delimiter.map(|c| c as u8);
    let mut table = batch::read_table(&options.input_csv, &config, delimiter)?;
    info!("loaded {} rows from {}", table.rows.len(), options.input_csv.display());

    let controller = BatchController::new(config.clone(), translator, scorer);
    controller.run(&mut table).await;

    batch::write_table(&options.output_csv, &table, &config, true)?;
    info!("wrote {}", options.output_csv.display());

    Ok(())
}
