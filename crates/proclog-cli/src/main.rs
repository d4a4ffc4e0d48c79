//! proclog CLI
//!
//! Thin wrapper around proclog-core for writing structured log events from
//! shell scripts and cron jobs.
//!
//! ## Usage
//!
//! ```bash
//! # Write one event
//! proclog --dir /var/log/myapp write --process backup --category nightly \
//!     --action start --message "Backup started" --details '{"target":"s3"}'
//!
//! # Write every stdin line as an event
//! ./long_job.sh 2>&1 | proclog --dir /var/log/myapp pipe --process long_job --action output
//!
//! # Show which file the next event would go to
//! proclog --dir /var/log/myapp path --process backup --category nightly
//! ```

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use proclog_core::{LogFormat, LogLevel, LoggerConfig, ProcessLogger, TimeZoneMode};
use serde_json::Value;

/// proclog - structured per-process log writer
#[derive(Parser)]
#[command(name = "proclog")]
#[command(version)]
#[command(about = "Append structured events to per-process, date-partitioned log files")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Base log directory (default: ./logs)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// JSON configuration file; flags and PROCLOG_* variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Minimum level to record (debug, info, warn, error, fatal)
    #[arg(short, long, global = true)]
    level: Option<LogLevel>,

    /// Line format (json or text)
    #[arg(short, long, global = true)]
    format: Option<LogFormat>,

    /// Rotate a file once it reaches this many bytes (0 disables rotation)
    #[arg(long, global = true)]
    max_file_size: Option<u64>,

    /// Use UTC instead of local time for dates and timestamps
    #[arg(long, global = true)]
    utc: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a single event
    Write {
        /// Process name (directory under the base directory)
        #[arg(short, long)]
        process: String,

        /// Category (file name prefix); empty writes to <date>.log
        #[arg(long, default_value = "")]
        category: String,

        #[arg(short, long)]
        action: String,

        #[arg(short, long)]
        message: String,

        /// Details as JSON; anything that is not JSON is kept as a string
        #[arg(long)]
        details: Option<String>,

        /// Severity of the event
        #[arg(short, long, default_value = "info")]
        severity: LogLevel,
    },

    /// Write each non-empty stdin line as the message of one event
    Pipe {
        #[arg(short, long)]
        process: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(short, long)]
        action: String,

        #[arg(short, long, default_value = "info")]
        severity: LogLevel,
    },

    /// Print the file the next event would be appended to
    Path {
        #[arg(short, long)]
        process: String,

        #[arg(long, default_value = "")]
        category: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config = build_config(&cli)?;
    tracing::debug!(?config, "resolved configuration");
    let logger = ProcessLogger::new(config).context("failed to create logger")?;

    match cli.command {
        Commands::Write {
            process,
            category,
            action,
            message,
            details,
            severity,
        } => {
            let details = details.as_deref().map(parse_details);
            logger
                .log_to_process(
                    severity,
                    &process,
                    &category,
                    &action,
                    &message,
                    details.as_ref(),
                )
                .context("failed to write event")?;
            tracing::info!(%process, %category, "wrote event");
        }

        Commands::Pipe {
            process,
            category,
            action,
            severity,
        } => {
            let stdin = std::io::stdin();
            let mut count = 0usize;
            for line in stdin.lock().lines() {
                let line = line.context("failed to read stdin")?;
                let line = line.trim_end();
                if line.trim().is_empty() {
                    continue;
                }
                logger
                    .log_to_process(severity, &process, &category, &action, line, None)
                    .context("failed to write event")?;
                count += 1;
            }
            tracing::info!(%process, %category, count, "piped events");
        }

        Commands::Path { process, category } => {
            let path = logger
                .active_path(&process, &category)
                .context("failed to resolve log path")?;
            println!("{}", path.display());
        }
    }

    logger.close().context("failed to close log files")?;
    Ok(())
}

/// Layer configuration: file (or defaults), then PROCLOG_* variables, then flags.
fn build_config(cli: &Cli) -> Result<LoggerConfig> {
    let mut config = match &cli.config {
        Some(path) => LoggerConfig::from_json_file(path)?,
        None => LoggerConfig::default(),
    };
    config = config.apply_overrides(|key| std::env::var(key).ok())?;

    if let Some(dir) = &cli.dir {
        config.base_dir = dir.clone();
    }
    if let Some(level) = cli.level {
        config.min_level = level;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(bytes) = cli.max_file_size {
        config.max_file_size = bytes;
    }
    if cli.utc {
        config.timezone = TimeZoneMode::Utc;
    }
    Ok(config)
}

fn parse_details(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();
}
