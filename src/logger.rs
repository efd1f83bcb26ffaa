//! Core implementation of the rotating text logger.
//!
//! This module provides the `Logger` struct, its builder, and the `Record`
//! guard that holds the logger's exclusive section while a line is assembled.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::clock::{Clock, LocalClock};
use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::fs::{FileSystem, LogFile, StdFileSystem};
use crate::loggable::Loggable;
use crate::record::{Level, LineBuffer};
use crate::rotation::{next_log_path, purge, RotationPolicy};

/// Initial capacity of the shared line buffer.
const LINE_CAPACITY: usize = 256;

/// A thread-safe, append-only text logger with size-based rotation.
///
/// Every record is written as one line, `[YYYY-MM-DD HH:MM:SS Level]: message`,
/// to the active file in the log directory and, when mirroring is enabled, to a
/// secondary sink (standard output by default).
///
/// # Thread Safety
///
/// `Logger` is `Send + Sync` and is meant to be shared, usually as an
/// `Arc<Logger>`. A record holds the logger's lock from [`begin`](Logger::begin)
/// until it is ended, so records from different threads never interleave. The
/// order of records in the file is the order in which callers acquired the lock.
///
/// # Rotation
///
/// After each record the size of the active file is compared with
/// `max_log_size`. Once it is exceeded the file is closed, a new one named after
/// the current time is opened, and the oldest files beyond `retention` are
/// deleted. A record is never split across two files.
///
/// # Examples
///
/// ```
/// # use rolling_logger::{Logger, LoggerConfig, Level, log_record};
/// # let dir = tempfile::tempdir().unwrap();
/// let logger = Logger::init(LoggerConfig::new(dir.path()).mirror_to_stdout(false)).unwrap();
///
/// log_record!(logger, Level::Info, "disk usage: ", 87, "%").unwrap();
///
/// logger
///     .begin(Level::Warn)
///     .append("queue depth ")
///     .append(1024)
///     .end()
///     .unwrap();
///
/// logger.flush().unwrap();
/// ```
pub struct Logger {
    directory: PathBuf,
    policy: RotationPolicy,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    state: Mutex<LoggerState>,
}

/// Everything mutated while a record is open.
struct LoggerState {
    file: Option<Box<dyn LogFile>>,
    active_path: PathBuf,
    mirror: Option<Box<dyn Write + Send>>,
    line: LineBuffer,
}

/// Builds a [`Logger`] with custom collaborators.
///
/// The defaults are the real filesystem, the local wall clock and, when
/// `mirror_to_stdout` is set, standard output as the mirror sink.
pub struct LoggerBuilder {
    config: LoggerConfig,
    fs: Option<Arc<dyn FileSystem>>,
    clock: Option<Arc<dyn Clock>>,
    mirror: Option<Box<dyn Write + Send>>,
}

impl LoggerBuilder {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            config,
            fs: None,
            clock: None,
            mirror: None,
        }
    }

    /// Uses `fs` for every file operation.
    pub fn filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    /// Uses `clock` for record timestamps and file names.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Mirrors records to `sink` instead of standard output.
    ///
    /// An explicit sink is always written to, regardless of `mirror_to_stdout`.
    /// Errors from the mirror are logged through `tracing` and never fail a record.
    pub fn mirror(mut self, sink: impl Write + Send + 'static) -> Self {
        self.mirror = Some(Box::new(sink));
        self
    }

    /// Creates the log directory if needed, opens the first log file, writes
    /// the initialisation record and purges files beyond the retention count.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::CreateDirectory`] or [`LogError::OpenFile`] when the
    /// directory or the first file cannot be created. A failure to write the
    /// initialisation record is only reported through `tracing`.
    pub fn build(self) -> Result<Logger, LogError> {
        let LoggerBuilder {
            config,
            fs,
            clock,
            mirror,
        } = self;
        let fs = fs.unwrap_or_else(|| Arc::new(StdFileSystem));
        let clock = clock.unwrap_or_else(|| Arc::new(LocalClock));
        let directory = config.directory;

        if !fs.exists(&directory) {
            fs.create_dir_all(&directory)
                .map_err(|source| LogError::CreateDirectory {
                    path: directory.clone(),
                    source,
                })?;
        }

        let active_path = next_log_path(&*fs, &directory, &*clock);
        let file = fs
            .open_append(&active_path)
            .map_err(|source| LogError::OpenFile {
                path: active_path.clone(),
                source,
            })?;

        let mirror = match mirror {
            Some(sink) => Some(sink),
            None if config.mirror_to_stdout => Some(Box::new(io::stdout()) as Box<dyn Write + Send>),
            None => None,
        };

        let policy = RotationPolicy::new(config.max_log_size, config.retention);
        tracing::debug!(
            dir = %directory.display(),
            file = %active_path.display(),
            max_log_size = policy.max_size,
            retention = policy.retention,
            "opened log file"
        );

        let logger = Logger {
            directory,
            policy,
            fs,
            clock,
            state: Mutex::new(LoggerState {
                file: Some(file),
                active_path,
                mirror,
                line: LineBuffer::with_capacity(LINE_CAPACITY),
            }),
        };

        let marker = logger.write(
            Level::Info,
            &[
                &"Logger initialised (max size: ",
                &policy.max_size,
                &" bytes, retention: ",
                &policy.retention,
                &" files)",
            ],
        );
        if let Err(err) = marker {
            tracing::warn!(error = %err, "failed to write initialisation record");
        }

        {
            let state = logger.state.lock();
            purge(&*logger.fs, &logger.directory, &logger.policy, &state.active_path);
        }

        Ok(logger)
    }
}

impl Logger {
    /// Creates a logger on the real filesystem and local clock.
    ///
    /// See [`LoggerBuilder::build`] for what initialisation does and how it fails.
    pub fn init(config: LoggerConfig) -> Result<Self, LogError> {
        LoggerBuilder::new(config).build()
    }

    pub fn builder(config: LoggerConfig) -> LoggerBuilder {
        LoggerBuilder::new(config)
    }

    /// Opens a record at `level`, blocking until no other record is open.
    ///
    /// The returned guard holds the logger's lock. The record is completed,
    /// and the lock released, by [`Record::end`] or by dropping the guard.
    /// Calling `begin` again on the same thread while a record is still open
    /// deadlocks.
    ///
    /// # Panics
    ///
    /// Panics if an earlier rotation failed to open its new file; the logger
    /// has no file to write to after that.
    pub fn begin(&self, level: Level) -> Record<'_> {
        let mut state = self.state.lock();
        assert!(
            state.file.is_some(),
            "logger has no active file after a failed rotation"
        );
        state.line.open(level, self.clock.now());
        Record {
            logger: self,
            state,
            ended: false,
        }
    }

    /// Writes one record made of `fragments`, in order.
    ///
    /// Equivalent to `begin(level)`, one `push` per fragment, then `end()`.
    pub fn write(&self, level: Level, fragments: &[&dyn Loggable]) -> Result<(), LogError> {
        let mut record = self.begin(level);
        for fragment in fragments {
            record.push(*fragment);
        }
        record.end()
    }

    pub fn info(&self, fragments: &[&dyn Loggable]) -> Result<(), LogError> {
        self.write(Level::Info, fragments)
    }

    pub fn warn(&self, fragments: &[&dyn Loggable]) -> Result<(), LogError> {
        self.write(Level::Warn, fragments)
    }

    pub fn crit(&self, fragments: &[&dyn Loggable]) -> Result<(), LogError> {
        self.write(Level::Crit, fragments)
    }

    /// Pushes buffered bytes to durable storage and flushes the mirror sink.
    ///
    /// Only a failure to sync the log file is returned; the mirror is best effort.
    ///
    /// Waits for any open record to finish first. Calling it again with no
    /// writes in between does nothing further.
    pub fn flush(&self) -> Result<(), LogError> {
        let mut state = self.state.lock();
        if let Some(file) = state.file.as_mut() {
            file.sync()?;
        }
        if let Some(mirror) = state.mirror.as_mut() {
            if let Err(err) = mirror.flush() {
                tracing::warn!(error = %err, "failed to flush log mirror");
            }
        }
        Ok(())
    }

    /// Path of the file records are currently appended to.
    pub fn active_path(&self) -> PathBuf {
        self.state.lock().active_path.clone()
    }

    /// Directory holding the log files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Size threshold and retention count this logger rotates with.
    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Terminates the record in `state`, writes it to every sink and rotates
    /// if the active file has outgrown its threshold.
    fn commit(&self, state: &mut LoggerState) -> Result<(), LogError> {
        state.line.terminate();

        let (result, size) = {
            let LoggerState {
                file, mirror, line, ..
            } = &mut *state;
            let Some(file) = file.as_mut() else {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "no active log file").into());
            };
            let result = file.write_all(line.as_bytes());
            // The mirror is best effort; only the file decides the record's outcome.
            if let Some(mirror) = mirror.as_mut() {
                if let Err(err) = mirror.write_all(line.as_bytes()) {
                    tracing::warn!(error = %err, "failed to mirror log record");
                }
            }
            (result, file.size())
        };

        // Size is only checked here, after a whole line, so a record never spans two files.
        if self.policy.should_rotate(size) {
            self.rotate(state);
        }

        result.map_err(LogError::from)
    }

    /// Replaces the active file with a freshly named one, then purges.
    ///
    /// # Panics
    ///
    /// Panics if the new file cannot be opened. Carrying on would mean either
    /// dropping records or growing the old file without bound.
    fn rotate(&self, state: &mut LoggerState) {
        if let Some(mut old) = state.file.take() {
            if let Err(err) = old.flush() {
                tracing::warn!(path = %state.active_path.display(), error = %err, "failed to flush rotated log file");
            }
        }

        let path = next_log_path(&*self.fs, &self.directory, &*self.clock);
        match self.fs.open_append(&path) {
            Ok(file) => {
                tracing::debug!(
                    from = %state.active_path.display(),
                    to = %path.display(),
                    "rotated log file"
                );
                state.file = Some(file);
                state.active_path = path;
            }
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "failed to open new log file during rotation");
                panic!("failed to open new log file {} during rotation: {err}", path.display());
            }
        }

        purge(&*self.fs, &self.directory, &self.policy, &state.active_path);
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        // Best effort; there is nobody left to report to.
        let state = self.state.get_mut();
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush();
        }
        if let Some(mirror) = state.mirror.as_mut() {
            let _ = mirror.flush();
        }
    }
}

/// An open log record.
///
/// Created by [`Logger::begin`]. While it is alive no other record can be
/// started on the same logger. The terminator is written, and the lock
/// released, when the record is [`end`](Record::end)ed or dropped, so early
/// returns and panics between `begin` and `end` still leave a complete line.
#[must_use = "a record is written when it is ended or dropped"]
pub struct Record<'a> {
    logger: &'a Logger,
    state: MutexGuard<'a, LoggerState>,
    ended: bool,
}

impl<'a> Record<'a> {
    /// Appends a fragment and hands the record back for chaining.
    pub fn append<T: Loggable>(mut self, fragment: T) -> Self {
        self.state.line.push(&fragment);
        self
    }

    /// Appends a fragment through a mutable reference, for use in loops.
    pub fn push(&mut self, fragment: &dyn Loggable) -> &mut Self {
        self.state.line.push(fragment);
        self
    }

    /// Writes the line terminator, checks for rotation and releases the logger.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Write`] if the line could not be written to the log
    /// file. Mirror failures are not reported here. The logger stays usable.
    ///
    /// # Panics
    ///
    /// Panics if rotation is due and the new log file cannot be opened.
    pub fn end(mut self) -> Result<(), LogError> {
        self.ended = true;
        self.logger.commit(&mut self.state)
    }
}

impl Drop for Record<'_> {
    fn drop(&mut self) {
        if self.ended {
            return;
        }
        if let Err(err) = self.logger.commit(&mut self.state) {
            tracing::warn!(error = %err, "failed to write log record");
        }
    }
}

/// Writes one record built from any number of loggable fragments.
///
/// Expands to [`Logger::write`], so it returns `Result<(), LogError>`.
///
/// # Examples
///
/// ```
/// # use rolling_logger::{Logger, LoggerConfig, Level, log_record};
/// # let dir = tempfile::tempdir().unwrap();
/// # let logger = Logger::init(LoggerConfig::new(dir.path()).mirror_to_stdout(false)).unwrap();
/// log_record!(logger, Level::Info, "Temperature: ", 25.5, " C").unwrap();
/// log_record!(logger, Level::Crit, "Status: ", false, ", Count: ", 42).unwrap();
/// log_record!(logger, Level::Warn).unwrap();
/// ```
#[macro_export]
macro_rules! log_record {
    ($logger:expr, $level:expr $(, $fragment:expr)* $(,)?) => {
        $logger.write($level, &[$(&$fragment as &dyn $crate::Loggable),*])
    };
}
