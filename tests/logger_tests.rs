use rolling_logger::fs::{FileSystem, LogFile};
use rolling_logger::rotation::is_log_file_name;
use rolling_logger::{
    log_record, Level, LogError, Logger, LoggerConfig, ManualClock, RotationPolicy,
};
use std::fs;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use tempfile::tempdir;

/// Mirror sink that collects everything written to it.
#[derive(Clone, Default)]
struct CollectingSink {
    data: Arc<Mutex<Vec<u8>>>,
}

impl CollectingSink {
    fn contents(&self) -> String {
        String::from_utf8(self.data.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CollectingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Mirror sink whose every write and flush fails, like a closed stdout.
struct FailingSink;

impl Write for FailingSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }
}

/// Log file that rejects every write, like a full disk.
struct FullDiskFile;

impl Write for FullDiskFile {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "no space left on device"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogFile for FullDiskFile {
    fn size(&self) -> u64 {
        0
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Filesystem whose files can be opened but never written.
struct FullDiskFs;

impl FileSystem for FullDiskFs {
    fn exists(&self, _path: &Path) -> bool {
        false
    }

    fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn open_append(&self, _path: &Path) -> io::Result<Box<dyn LogFile>> {
        Ok(Box::new(FullDiskFile))
    }

    fn list_files(&self, _dir: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }

    fn remove(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

fn quiet_config(dir: &Path) -> LoggerConfig {
    LoggerConfig::new(dir).mirror_to_stdout(false)
}

fn log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| is_log_file_name(path))
        .collect();
    files.sort();
    files
}

fn fixed_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::from_ymd_hms(2024, 3, 7, 9, 5, 3))
}

#[test]
fn test_init_creates_directory() {
    let root = tempdir().unwrap();
    let dir = root.path().join("nested").join("logs");
    assert!(!dir.exists());

    let logger = Logger::init(quiet_config(&dir)).unwrap();
    logger.flush().unwrap();

    assert!(dir.is_dir(), "Init should create the log directory");
    let files = log_files(&dir);
    assert_eq!(files.len(), 1, "Init should open exactly one log file");
    assert_eq!(files[0], logger.active_path());
}

#[test]
fn test_init_writes_marker_record() {
    let dir = tempdir().unwrap();
    let logger = Logger::builder(quiet_config(dir.path()).max_log_size(4096).retention(2))
        .clock(fixed_clock())
        .build()
        .unwrap();
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    assert_eq!(
        contents,
        "[2024-03-07 09:05:03 Info]: Logger initialised (max size: 4096 bytes, retention: 2 files)\n"
    );
    assert_eq!(
        logger.active_path().file_name().unwrap().to_str().unwrap(),
        "2024-03-07 09-05-03"
    );
}

#[test]
fn test_init_fails_when_directory_cannot_be_created() {
    let root = tempdir().unwrap();
    let blocker = root.path().join("not_a_dir");
    fs::write(&blocker, b"occupied").unwrap();

    let result = Logger::init(quiet_config(&blocker.join("logs")));
    assert!(
        matches!(result, Err(LogError::CreateDirectory { .. })),
        "Init under a regular file should fail to create the directory"
    );
}

#[test]
fn test_init_fails_when_file_cannot_be_opened() {
    let root = tempdir().unwrap();
    let blocker = root.path().join("not_a_dir");
    fs::write(&blocker, b"occupied").unwrap();

    // The path exists, so no directory is created, but nothing can be opened inside it.
    let result = Logger::init(quiet_config(&blocker));
    assert!(matches!(result, Err(LogError::OpenFile { .. })));
}

#[test]
fn test_record_format_and_mirror() {
    let dir = tempdir().unwrap();
    let sink = CollectingSink::default();
    let logger = Logger::builder(quiet_config(dir.path()))
        .clock(fixed_clock())
        .mirror(sink.clone())
        .build()
        .unwrap();

    log_record!(logger, Level::Info, "disk usage: ", 87, "%").unwrap();
    logger.flush().unwrap();

    let file = fs::read_to_string(logger.active_path()).unwrap();
    let mirrored = sink.contents();
    assert_eq!(file, mirrored, "File and mirror should receive identical bytes");
    assert_eq!(
        file.lines().last().unwrap(),
        "[2024-03-07 09:05:03 Info]: disk usage: 87%"
    );
    assert!(file.ends_with("87%\n"));
}

#[test]
fn test_level_names() {
    let dir = tempdir().unwrap();
    let logger = Logger::builder(quiet_config(dir.path()))
        .clock(fixed_clock())
        .build()
        .unwrap();

    logger.info(&[&"a"]).unwrap();
    logger.warn(&[&"b"]).unwrap();
    logger.crit(&[&"c"]).unwrap();
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    let lines: Vec<_> = contents.lines().skip(1).collect();
    assert_eq!(
        lines,
        vec![
            "[2024-03-07 09:05:03 Info]: a",
            "[2024-03-07 09:05:03 Warn]: b",
            "[2024-03-07 09:05:03 Crit]: c",
        ]
    );
}

#[test]
fn test_mixed_fragment_types() {
    let dir = tempdir().unwrap();
    let logger = Logger::builder(quiet_config(dir.path()))
        .clock(fixed_clock())
        .build()
        .unwrap();

    let name = String::from("backup");
    logger
        .begin(Level::Warn)
        .append(&name)
        .append(" ok=")
        .append(false)
        .append(" ratio=")
        .append(0.25f64)
        .append(" bytes=")
        .append(u64::MAX)
        .append(" delta=")
        .append(-3i8)
        .end()
        .unwrap();
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    assert!(contents.ends_with(
        "[2024-03-07 09:05:03 Warn]: backup ok=false ratio=0.25 bytes=18446744073709551615 delta=-3\n"
    ));
}

#[test]
fn test_push_in_loop() {
    let dir = tempdir().unwrap();
    let logger = Logger::init(quiet_config(dir.path())).unwrap();

    let mut record = logger.begin(Level::Info);
    record.push(&"items:");
    for i in 0..5 {
        record.push(&" ").push(&i);
    }
    record.end().unwrap();
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    assert!(contents.ends_with("Info]: items: 0 1 2 3 4\n"));
}

#[test]
fn test_dropped_record_is_terminated() {
    let dir = tempdir().unwrap();
    let logger = Logger::init(quiet_config(dir.path())).unwrap();

    {
        let _record = logger.begin(Level::Warn).append("never ended");
    }
    log_record!(logger, Level::Info, "next").unwrap();
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with("Warn]: never ended"));
    assert!(lines[2].ends_with("Info]: next"));
}

#[test]
fn test_panic_inside_record_releases_logger() {
    let dir = tempdir().unwrap();
    let logger = Logger::init(quiet_config(dir.path())).unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _record = logger.begin(Level::Crit).append("before panic");
        panic!("boom");
    }));
    assert!(result.is_err());

    // Would deadlock if the guard had not released the lock.
    log_record!(logger, Level::Info, "after panic").unwrap();
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    assert!(contents.contains("Crit]: before panic\n"));
    assert!(contents.ends_with("Info]: after panic\n"));
}

#[test]
fn test_concurrent_records_never_interleave() {
    const THREADS: usize = 8;
    const RECORDS: usize = 250;

    let dir = tempdir().unwrap();
    let sink = CollectingSink::default();
    let logger = Arc::new(
        Logger::builder(quiet_config(dir.path()).max_log_size(0))
            .mirror(sink.clone())
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for r in 0..RECORDS {
                    // Many small fragments give other threads every chance to cut in.
                    let mut record = logger.begin(Level::Info);
                    record.push(&"thread=").push(&t);
                    for _ in 0..10 {
                        record.push(&" ").push(&t);
                    }
                    record.push(&" record=").push(&r);
                    record.end().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    assert_eq!(contents, sink.contents(), "Mirror should see the same order as the file");

    let mut per_thread = vec![Vec::new(); THREADS];
    for line in contents.lines().skip(1) {
        let (_, message) = line.split_once("]: ").expect("Every line should carry a tag");
        let rest = message.strip_prefix("thread=").expect("Message should be intact");
        let mut parts = rest.split(' ');
        let t: usize = parts.next().unwrap().parse().unwrap();
        for _ in 0..10 {
            assert_eq!(parts.next().unwrap(), t.to_string(), "Foreign bytes inside line: {line}");
        }
        let r: usize = parts
            .next()
            .and_then(|p| p.strip_prefix("record="))
            .unwrap()
            .parse()
            .unwrap();
        assert!(parts.next().is_none());
        per_thread[t].push(r);
    }

    for (t, records) in per_thread.iter().enumerate() {
        let expected: Vec<_> = (0..RECORDS).collect();
        assert_eq!(records, &expected, "Thread {t} records should be complete and in order");
    }
}

#[test]
fn test_flush_is_idempotent() {
    let dir = tempdir().unwrap();
    let logger = Logger::init(quiet_config(dir.path())).unwrap();
    log_record!(logger, Level::Info, "flush me").unwrap();

    logger.flush().unwrap();
    let after_first = fs::read(logger.active_path()).unwrap();
    for _ in 0..3 {
        logger.flush().unwrap();
    }
    let after_more = fs::read(logger.active_path()).unwrap();
    assert_eq!(after_first, after_more);
    assert!(String::from_utf8(after_more).unwrap().ends_with("flush me\n"));
}

#[test]
fn test_drop_flushes_buffered_records() {
    let dir = tempdir().unwrap();
    let path = {
        let logger = Logger::init(quiet_config(dir.path())).unwrap();
        log_record!(logger, Level::Crit, "last words").unwrap();
        logger.active_path()
    };
    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.ends_with("Crit]: last words\n"));
}

#[test]
fn test_restart_in_same_second_gets_new_file() {
    let dir = tempdir().unwrap();
    let clock = fixed_clock();

    let first = Logger::builder(quiet_config(dir.path()))
        .clock(clock.clone())
        .build()
        .unwrap();
    let first_path = first.active_path();
    drop(first);

    let second = Logger::builder(quiet_config(dir.path()))
        .clock(clock)
        .build()
        .unwrap();
    assert_ne!(first_path, second.active_path());
    assert_eq!(
        second.active_path().file_name().unwrap().to_str().unwrap(),
        "2024-03-07 09-05-03.001"
    );
}

#[test]
fn test_failing_mirror_does_not_fail_init_or_records() {
    let dir = tempdir().unwrap();
    let logger = Logger::builder(LoggerConfig::new(dir.path()))
        .clock(fixed_clock())
        .mirror(FailingSink)
        .build()
        .expect("A broken mirror should not fail init");

    log_record!(logger, Level::Info, "a").unwrap();
    logger.begin(Level::Warn).append("b").end().unwrap();
    {
        let _record = logger.begin(Level::Crit).append("c");
    }
    logger.flush().unwrap();

    let contents = fs::read_to_string(logger.active_path()).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 4, "Every record should reach the file: {contents}");
    assert!(lines[0].contains("Info]: Logger initialised"));
    assert_eq!(lines[1], "[2024-03-07 09:05:03 Info]: a");
    assert_eq!(lines[2], "[2024-03-07 09:05:03 Warn]: b");
    assert_eq!(lines[3], "[2024-03-07 09:05:03 Crit]: c");
}

#[test]
fn test_file_write_failure_is_reported() {
    let dir = tempdir().unwrap();
    let logger = Logger::builder(quiet_config(dir.path()))
        .filesystem(Arc::new(FullDiskFs))
        .build()
        .expect("Init only fails on directory or file creation");

    let result = log_record!(logger, Level::Info, "lost");
    assert!(matches!(result, Err(LogError::Write(_))));

    let result = logger.begin(Level::Warn).append("also lost").end();
    assert!(matches!(result, Err(LogError::Write(_))));

    // A dropped record swallows the error and still releases the logger.
    {
        let _record = logger.begin(Level::Crit).append("dropped");
    }
    assert!(matches!(
        log_record!(logger, Level::Info, "still usable"),
        Err(LogError::Write(_))
    ));
}

#[test]
fn test_logger_reports_its_settings() {
    let dir = tempdir().unwrap();
    let logger = Logger::init(quiet_config(dir.path()).max_log_size(2048).retention(4)).unwrap();

    assert_eq!(logger.directory(), dir.path());
    assert_eq!(logger.policy(), RotationPolicy::new(2048, 4));
    assert_eq!(logger.active_path().parent().unwrap(), logger.directory());
}
