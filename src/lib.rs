//! # Rolling Logger
//!
//! A thread-safe, append-only text logger with size-triggered file rotation
//! and count-based retention.
//!
//! ## Key Features
//!
//! * Whole-line atomicity: records from concurrent threads never interleave
//! * Size-based rotation that never splits a record across files
//! * Retention: only the newest N log files are kept
//! * Optional mirroring of every record to standard output
//! * Any `Display` value can be logged as a message fragment
//!
//! ## On-disk format
//!
//! Each log file is named after the local time it was opened,
//! `YYYY-MM-DD HH-MM-SS`, so name order is creation order. Every record is one
//! line:
//!
//! ```text
//! [2024-03-07 09:05:03 Info]: disk usage: 87%
//! ```
//!
//! ## Main Components
//!
//! * `Logger`: the shared log sink (lock, sinks, rotation)
//! * `Record`: guard for one line, written on `end()` or drop
//! * `rotation`: rotation threshold, file naming and purging
//! * `clock`: wall-clock abstraction and timestamp formatting
//! * `fs`: filesystem abstraction over `std::fs`
//! * `global`: optional process-wide instance and `log` crate bridge
//!
//! ## Quick Start
//!
//! ```
//! use rolling_logger::{Logger, LoggerConfig, Level, log_record};
//! use std::sync::Arc;
//! use std::thread;
//!
//! # let dir = tempfile::tempdir().unwrap();
//! let config = LoggerConfig::new(dir.path())
//!     .max_log_size(64 * 1024)
//!     .retention(5)
//!     .mirror_to_stdout(false);
//! let logger = Arc::new(Logger::init(config).unwrap());
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|id| {
//!         let logger = Arc::clone(&logger);
//!         thread::spawn(move || {
//!             log_record!(logger, Level::Info, "worker ", id, " started").unwrap();
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//!
//! logger.flush().unwrap();
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod fs;
pub mod global;
pub mod loggable;
pub mod logger;
pub mod record;
pub mod rotation;

pub use clock::{Clock, LocalClock, ManualClock};
pub use config::LoggerConfig;
pub use error::LogError;
pub use fs::{FileSystem, LogFile, StdFileSystem};
pub use global::{global, init_global, install_log_bridge, instance, LogBridge};
pub use loggable::{Addr, Loggable};
pub use logger::{Logger, LoggerBuilder, Record};
pub use record::{format_line, Level, ParseLevelError};
pub use rotation::RotationPolicy;
