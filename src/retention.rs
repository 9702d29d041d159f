use std::io;
use std::path::{Path, PathBuf};

use crate::fs::FileSystem;
use crate::rotation::LogFileName;
use crate::writer::WORKER_TARGET;
use crate::{Error, Result};

/// Pick the files to delete so that, together with `current`, at most
/// `max_files` files remain for `base_name`.
///
/// Returned names are oldest first. `current` is never returned and
/// `max_files == 0` disables retention.
pub fn expired_files<I>(base_name: &str, current: &str, names: I, max_files: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    if max_files == 0 {
        return Vec::new();
    }

    let mut candidates: Vec<(LogFileName, String)> = names
        .into_iter()
        .filter(|name| name != current)
        .filter_map(|name| LogFileName::parse(base_name, &name).map(|parsed| (parsed, name)))
        .collect();
    candidates.sort();

    // The current file is about to be written, so it takes one of the slots.
    let excess = (candidates.len() + 1).saturating_sub(max_files);
    candidates
        .into_iter()
        .take(excess)
        .map(|(_, name)| name)
        .collect()
}

/// Delete expired files from `directory`, returning the removed paths.
///
/// A missing directory has nothing to clean. The first listing or deletion
/// failure stops the pass.
pub fn enforce(
    fs: &dyn FileSystem,
    directory: &Path,
    base_name: &str,
    current: &str,
    max_files: usize,
) -> Result<Vec<PathBuf>> {
    if max_files == 0 {
        return Ok(Vec::new());
    }

    let names = match fs.list_files(directory) {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(Error::Cleanup {
                path: directory.to_path_buf(),
                source,
            });
        }
    };

    let mut removed = Vec::new();
    for name in expired_files(base_name, current, names, max_files) {
        let path = directory.join(&name);
        match fs.remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => return Err(Error::Cleanup { path, source }),
        }
        tracing::debug!(target: WORKER_TARGET, path = %path.display(), "removed expired log file");
        removed.push(path);
    }

    Ok(removed)
}
