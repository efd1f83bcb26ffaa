use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rolling_logger::config::{DEFAULT_MAX_LOG_SIZE, DEFAULT_RETENTION};
use rolling_logger::{Level, Logger, LoggerConfig};
use tracing_subscriber::EnvFilter;

/// Append messages to a rotating set of log files
#[derive(Parser, Debug)]
#[command(name = "rolling_logger")]
#[command(about = "Append messages to size-rotated, retention-limited log files")]
struct Args {
    /// Directory holding the log files (created if missing)
    #[arg(short, long, default_value = "logs")]
    dir: PathBuf,

    /// Bytes a file may grow to before rotating (0 = never rotate)
    #[arg(short = 's', long, default_value_t = DEFAULT_MAX_LOG_SIZE)]
    max_size: u64,

    /// Number of log files to keep (0 = keep all)
    #[arg(short, long, default_value_t = DEFAULT_RETENTION)]
    retention: usize,

    /// Do not echo records to standard output
    #[arg(long)]
    no_stdout: bool,

    /// Level of every record written: info, warn or crit
    #[arg(short, long, default_value = "info")]
    level: Level,

    /// Messages to log, one record each; read lines from stdin when omitted
    messages: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = LoggerConfig::new(&args.dir)
        .max_log_size(args.max_size)
        .retention(args.retention)
        .mirror_to_stdout(!args.no_stdout);
    let logger = match Logger::init(config) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("rolling_logger: {err}");
            std::process::exit(1);
        }
    };

    log_messages(&logger, args.level, &args.messages, io::stdin().lock())?;
    logger.flush().context("failed to flush log file")?;
    Ok(())
}

/// Logs each of `messages` as one record, or each line of `input` when there are none.
fn log_messages(
    logger: &Logger,
    level: Level,
    messages: &[String],
    input: impl BufRead,
) -> anyhow::Result<()> {
    if messages.is_empty() {
        for line in input.lines() {
            let line = line.context("failed to read from stdin")?;
            logger.write(level, &[&line])?;
        }
    } else {
        for message in messages {
            logger.write(level, &[message])?;
        }
    }
    Ok(())
}
