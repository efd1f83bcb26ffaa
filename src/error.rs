use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the logger.
///
/// Failing to open a new file during rotation is deliberately absent: it is
/// fatal and panics instead of returning.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    #[error("failed to open log file {}: {source}", path.display())]
    OpenFile { path: PathBuf, source: io::Error },

    #[error("failed to write log record: {0}")]
    Write(#[from] io::Error),

    #[error("the global logger is already initialised")]
    AlreadyInitialized,
}
