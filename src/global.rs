//! Process-wide logger instance and the `log` crate bridge.
//!
//! Libraries and tests should prefer passing an `Arc<Logger>` around. This
//! module exists for applications that want a single logger reachable from
//! anywhere, and for routing `log::info!` and friends into the rotating files.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::config::LoggerConfig;
use crate::error::LogError;
use crate::logger::Logger;
use crate::record::Level;

lazy_static! {
    /// The process-wide logger, once initialised.
    static ref INSTANCE: RwLock<Option<Arc<Logger>>> = RwLock::new(None);
}

/// Initialises the process-wide logger with `config`.
///
/// # Errors
///
/// Returns [`LogError::AlreadyInitialized`] if a global logger already exists,
/// or the error from [`Logger::init`] if initialisation fails.
pub fn init_global(config: LoggerConfig) -> Result<Arc<Logger>, LogError> {
    let mut slot = INSTANCE.write();
    if slot.is_some() {
        return Err(LogError::AlreadyInitialized);
    }
    let logger = Arc::new(Logger::init(config)?);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// Returns the process-wide logger if it has been initialised.
pub fn global() -> Option<Arc<Logger>> {
    INSTANCE.read().clone()
}

/// Returns the process-wide logger, initialising it with
/// [`LoggerConfig::default`] on first use.
pub fn instance() -> Result<Arc<Logger>, LogError> {
    if let Some(logger) = global() {
        return Ok(logger);
    }
    let mut slot = INSTANCE.write();
    // Another thread may have won the race between the read and the write lock.
    if let Some(logger) = slot.as_ref() {
        return Ok(Arc::clone(logger));
    }
    let logger = Arc::new(Logger::init(LoggerConfig::default())?);
    *slot = Some(Arc::clone(&logger));
    Ok(logger)
}

/// Maps a `log` crate level onto the three record levels.
pub fn level_from_log(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Crit,
        log::Level::Warn => Level::Warn,
        log::Level::Info | log::Level::Debug | log::Level::Trace => Level::Info,
    }
}

/// Adapter that lets the `log` facade write through a [`Logger`].
pub struct LogBridge {
    logger: Arc<Logger>,
    max_level: log::LevelFilter,
}

impl LogBridge {
    pub fn new(logger: Arc<Logger>, max_level: log::LevelFilter) -> Self {
        Self { logger, max_level }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let result = self
            .logger
            .begin(level_from_log(record.level()))
            .append(record.args())
            .end();
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to write bridged log record");
        }
    }

    fn flush(&self) {
        if let Err(err) = self.logger.flush() {
            tracing::warn!(error = %err, "failed to flush log bridge");
        }
    }
}

/// Registers `logger` as the `log` crate's global logger.
///
/// # Errors
///
/// Fails if another `log` implementation has already been installed.
pub fn install_log_bridge(
    logger: Arc<Logger>,
    max_level: log::LevelFilter,
) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger, max_level)))?;
    log::set_max_level(max_level);
    Ok(())
}
