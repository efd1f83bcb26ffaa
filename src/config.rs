use std::path::PathBuf;

/// Default size threshold before rotation: 1 MiB.
pub const DEFAULT_MAX_LOG_SIZE: u64 = 1024 * 1024;

/// Default number of log files kept.
pub const DEFAULT_RETENTION: usize = 7;

/// Settings for a [`Logger`](crate::Logger).
///
/// # Examples
///
/// ```
/// # use rolling_logger::LoggerConfig;
/// let config = LoggerConfig::new("/tmp/app-logs")
///     .max_log_size(64 * 1024)
///     .retention(3)
///     .mirror_to_stdout(false);
/// assert_eq!(config.retention, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Directory the log files live in. Created on init if missing.
    pub directory: PathBuf,
    /// Bytes before rotation; 0 disables rotation.
    pub max_log_size: u64,
    /// Maximum number of log files kept; 0 keeps everything.
    pub retention: usize,
    /// Duplicate every record to standard output.
    pub mirror_to_stdout: bool,
}

impl LoggerConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    pub fn max_log_size(mut self, bytes: u64) -> Self {
        self.max_log_size = bytes;
        self
    }

    pub fn retention(mut self, files: usize) -> Self {
        self.retention = files;
        self
    }

    pub fn mirror_to_stdout(mut self, enabled: bool) -> Self {
        self.mirror_to_stdout = enabled;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            max_log_size: DEFAULT_MAX_LOG_SIZE,
            retention: DEFAULT_RETENTION,
            mirror_to_stdout: true,
        }
    }
}
