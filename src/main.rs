// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_arguments)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use app_controller::{Controller, RunOptions};

mod app_config;
mod content;
mod store;
mod generator;
mod quiz;
mod app_controller;
mod language_utils;
mod errors;

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

/// Map a configured log level to the logger's filter
fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Gate stored lessons and their quiz questions (default command)
    Run(RunArgs),

    /// Restore a lesson's question set from a backup snapshot
    Restore(RestoreArgs),

    /// Generate shell completions for coursewarden
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Course ids to process (repeatable); all stored courses when omitted
    #[arg(short = 'c', long = "course", value_name = "COURSE_ID")]
    courses: Vec<String>,

    /// Day number of a single lesson to process
    #[arg(short = 'd', long, value_name = "DAY")]
    day: Option<i64>,

    /// Zero-based question position to repair in isolation (requires --day)
    #[arg(short = 'q', long, value_name = "INDEX", requires = "day")]
    question: Option<usize>,

    /// Compute and report without writing store or backup state
    #[arg(long)]
    dry_run: bool,

    /// Minimum lesson quality score (0-100)
    #[arg(long, value_name = "SCORE")]
    min_score: Option<u8>,

    /// Candidates requested from the generator per attempt
    #[arg(long, value_name = "N")]
    candidates_per_attempt: Option<usize>,

    /// Generation attempts per question replacement
    #[arg(long, value_name = "N")]
    replace_attempts: Option<usize>,

    /// Generation rounds when filling missing questions
    #[arg(long, value_name = "N")]
    fill_attempts: Option<usize>,

    /// Configuration file path
    #[arg(long = "config", value_name = "PATH", default_value = "conf.json")]
    config_path: String,

    /// Database file path, overriding the configuration
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Set logging level
    #[arg(short = 'l', long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct RestoreArgs {
    /// Course the lesson belongs to
    #[arg(short = 'c', long = "course", value_name = "COURSE_ID")]
    course: String,

    /// Lesson id whose question set should be restored
    #[arg(long = "lesson", value_name = "LESSON_ID")]
    lesson: String,

    /// Snapshot file to restore from; the lesson's latest snapshot when omitted
    #[arg(long, value_name = "PATH")]
    snapshot: Option<PathBuf>,

    /// Configuration file path
    #[arg(long = "config", value_name = "PATH", default_value = "conf.json")]
    config_path: String,

    /// Database file path, overriding the configuration
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Set logging level
    #[arg(short = 'l', long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Coursewarden - course content and quiz gating
///
/// Checks machine-authored course lessons for language integrity and
/// pedagogical quality, validates their quiz questions, and repairs failing
/// quizzes through a generator backend.
#[derive(Parser, Debug)]
#[command(name = "coursewarden")]
#[command(version = "1.0.0")]
#[command(about = "Content integrity and quiz quality gating for authored courses")]
#[command(long_about = "Coursewarden checks stored course lessons and their quiz questions,
replaces questions that fail validation and fills missing ones through a
generator backend.

EXAMPLES:
    coursewarden                                  # Gate every stored course
    coursewarden -c fr-design-systems             # Gate a single course
    coursewarden -c fr-design-systems -d 3        # Gate one lesson
    coursewarden -c fr-design-systems -d 3 -q 2   # Repair one question
    coursewarden --dry-run                        # Report without writing
    coursewarden --min-score 80                   # Stricter quality threshold
    coursewarden restore -c fr-design-systems --lesson LESSON_ID
    coursewarden completions bash > coursewarden.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

ARTIFACTS:
    Every run writes a JSON report and, when lessons need attention, a markdown
    task list under the configured report directory. Question sets are
    snapshot to the backup directory before any rewrite.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
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

    // @returns: ANSI color prefix for log level
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
            let emoji = Self::get_emoji_for_level(record.level());
            let color = Self::get_color_for_level(record.level());

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
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "coursewarden", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Run(args)) => run_gate(args).await,
        Some(Commands::Restore(args)) => run_restore(args).await,
        None => {
            // Default behavior - gate with the top-level args
            run_gate(cli.run).await
        }
    }
}

async fn run_gate(options: RunArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    let mut config = load_or_create_config(&options.config_path)?;

    // Override config with CLI options if provided
    if let Some(min_score) = options.min_score {
        config.gate.min_score = min_score;
    }

    if let Some(candidates) = options.candidates_per_attempt {
        config.gate.candidates_per_attempt = candidates;
    }

    if let Some(attempts) = options.replace_attempts {
        config.gate.replace_attempts = attempts;
    }

    if let Some(rounds) = options.fill_attempts {
        config.gate.fill_attempts = rounds;
    }

    if let Some(db) = &options.db {
        config.storage.db_path = Some(db.clone());
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;

    controller
        .run(RunOptions {
            courses: options.courses,
            day: options.day,
            question: options.question,
            dry_run: options.dry_run,
        })
        .await?;

    Ok(())
}

async fn run_restore(options: RestoreArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    let mut config = load_or_create_config(&options.config_path)?;

    if let Some(db) = &options.db {
        config.storage.db_path = Some(db.clone());
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    let controller = Controller::with_config(config)?;
    controller
        .restore(&options.course, &options.lesson, options.snapshot)
        .await?;

    Ok(())
}

/// Load the configuration file, creating a default one when missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);

        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        Ok(config)
    }
}
