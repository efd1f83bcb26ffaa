//! Size-triggered rotation and count-based retention.
//!
//! A `RotationPolicy` is evaluated once per completed record. Files are named
//! after the local time they were opened at (`YYYY-MM-DD HH-MM-SS`), so sorting
//! names sorts them chronologically and purging the first names in that order
//! removes the oldest files.

use std::path::{Path, PathBuf};

use crate::clock::{file_stamp, parse_file_stamp, Clock};
use crate::fs::FileSystem;

/// Maximum number of same-second suffixes tried before giving up on uniqueness.
const MAX_COLLISION_SUFFIX: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Bytes a file may hold before the next completed record rotates it (0 = unbounded).
    pub max_size: u64,
    /// Number of log files kept in the directory (0 = unbounded).
    pub retention: usize,
}

impl RotationPolicy {
    pub const fn new(max_size: u64, retention: usize) -> Self {
        Self { max_size, retention }
    }

    /// Returns true once a file of `size` bytes has outgrown the threshold.
    #[inline]
    pub fn should_rotate(&self, size: u64) -> bool {
        self.max_size != 0 && size > self.max_size
    }

    /// Number of files to delete from a directory currently holding `count` log files.
    pub fn excess(&self, count: usize) -> usize {
        if self.retention == 0 {
            0
        } else {
            count.saturating_sub(self.retention)
        }
    }
}

/// Returns true if `path`'s file name is one this crate generates.
///
/// Accepts `YYYY-MM-DD HH-MM-SS` and the collision form `YYYY-MM-DD HH-MM-SS.NNN`.
pub fn is_log_file_name(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let stem = match name.split_once('.') {
        Some((stem, suffix)) => {
            if suffix.len() != 3 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                return false;
            }
            stem
        }
        None => name,
    };
    parse_file_stamp(stem).is_some()
}

/// Picks the path for a new log file in `dir`, named after the clock's current time.
///
/// If a file with that name already exists (two files opened within the same
/// second) a zero-padded `.NNN` suffix is added, which keeps name order equal to
/// creation order.
pub fn next_log_path(fs: &dyn FileSystem, dir: &Path, clock: &dyn Clock) -> PathBuf {
    let stamp = file_stamp(clock.now());
    let candidate = dir.join(&stamp);
    if !fs.exists(&candidate) {
        return candidate;
    }
    for n in 1..=MAX_COLLISION_SUFFIX {
        let candidate = dir.join(format!("{stamp}.{n:03}"));
        if !fs.exists(&candidate) {
            return candidate;
        }
    }
    // Out of suffixes; share the last one.
    dir.join(format!("{stamp}.{MAX_COLLISION_SUFFIX:03}"))
}

/// Outcome of a purge pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Deletes the oldest log files in `dir` until at most `policy.retention` remain.
///
/// The file at `active` is never deleted. Failures are collected in the report
/// and otherwise ignored: purging is best effort and must not stop logging.
pub fn purge(fs: &dyn FileSystem, dir: &Path, policy: &RotationPolicy, active: &Path) -> PurgeReport {
    let mut report = PurgeReport::default();
    if policy.retention == 0 {
        return report;
    }

    let mut files = match fs.list_files(dir) {
        Ok(files) => files,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to list log directory for purge");
            return report;
        }
    };
    files.retain(|path| is_log_file_name(path));
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let excess = policy.excess(files.len());
    for path in files.into_iter().take(excess) {
        if path == active {
            continue;
        }
        match fs.remove(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "purged old log file");
                report.removed.push(path);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to purge old log file");
                report.failed.push(path);
            }
        }
    }
    report
}
