use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Filesystem access used by the logger.
///
/// The logger never touches `std::fs` directly; it goes through a `FileSystem`
/// so that directory creation, file opening, listing and removal can be swapped
/// out (for example to inject failures in tests). Closing a file is dropping
/// its handle.
pub trait FileSystem: Send + Sync {
    /// Returns true if something exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Creates `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Opens `path` for appending, creating it if needed.
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogFile>>;

    /// Lists the regular files directly inside `dir`, in no particular order.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Removes the file at `path`.
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// An open, append-only log file handle.
pub trait LogFile: Write + Send {
    /// Current size of the file in bytes, including bytes still buffered.
    fn size(&self) -> u64;

    /// Flushes buffered bytes and asks the OS to persist them.
    fn sync(&mut self) -> io::Result<()>;
}

/// `FileSystem` backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn LogFile>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(StdLogFile::new(file)?))
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Buffered append handle that keeps a running byte count so size checks
/// never need a `stat` call.
#[derive(Debug)]
pub struct StdLogFile {
    writer: BufWriter<File>,
    size: u64,
}

impl StdLogFile {
    /// Wraps an already-open file, starting the byte count at its current length.
    pub fn new(file: File) -> io::Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            writer: BufWriter::new(file),
            size,
        })
    }
}

impl Write for StdLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.writer.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl LogFile for StdLogFile {
    fn size(&self) -> u64 {
        self.size
    }

    fn sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()
    }
}
