use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::clock::write_timestamp;
use crate::loggable::Loggable;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Info,
    Warn,
    Crit,
}

impl Level {
    /// Name written inside the record tag.
    pub const fn name(self) -> &'static str {
        match self {
            Level::Info => "Info",
            Level::Warn => "Warn",
            Level::Crit => "Crit",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown log level `{0}` (expected info, warn or crit)")]
pub struct ParseLevelError(String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "crit" | "critical" => Ok(Level::Crit),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Reusable line buffer for one record at a time.
///
/// A record is assembled here in full (`[timestamp Level]: ` tag, fragments,
/// terminator) and handed to the sinks in one piece. The buffer keeps its
/// capacity between records, so steady-state logging does not allocate.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    line: String,
}

impl LineBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            line: String::with_capacity(capacity),
        }
    }

    /// Starts a new record, discarding anything left from the previous one.
    pub(crate) fn open(&mut self, level: Level, time: NaiveDateTime) {
        self.line.clear();
        self.line.push('[');
        write_timestamp(&mut self.line, time);
        self.line.push(' ');
        self.line.push_str(level.name());
        self.line.push_str("]: ");
    }

    #[inline]
    pub(crate) fn push(&mut self, fragment: &dyn Loggable) {
        fragment.write_text(&mut self.line);
    }

    pub(crate) fn terminate(&mut self) {
        self.line.push('\n');
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.line.as_bytes()
    }
}

/// Formats a complete record line, terminator included.
///
/// This is the exact byte sequence the logger writes for
/// `write(level, fragments)` at `time`.
pub fn format_line(level: Level, time: NaiveDateTime, fragments: &[&dyn Loggable]) -> String {
    let mut buf = LineBuffer::default();
    buf.open(level, time);
    for fragment in fragments {
        buf.push(*fragment);
    }
    buf.terminate();
    buf.line
}
