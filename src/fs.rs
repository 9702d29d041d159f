//! Filesystem capability used by the log worker.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// The filesystem operations a logger needs.
///
/// The worker owns its `FileSystem` exclusively, so implementations only need
/// to be `Send`.
pub trait FileSystem: Send + 'static {
    /// Create `dir` and its parents. An existing directory is success.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Size of `path` in bytes, or `None` when it does not exist.
    fn file_size(&self, path: &Path) -> io::Result<Option<u64>>;

    /// Append `bytes` to `path`, creating it if needed.
    fn append(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;

    /// Names of the regular files directly inside `dir`.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Delete `path`.
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        if dir.as_os_str().is_empty() || dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(dir)
    }

    fn file_size(&self, path: &Path) -> io::Result<Option<u64>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn append(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(bytes)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
