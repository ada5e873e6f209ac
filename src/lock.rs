//! File-based locking for single-writer safety.
//!
//! One process owns a snapshot path at a time: `Cache::open` takes an
//! exclusive advisory lock (fs2) on `<snapshot>.lock` and keeps it until drop.
//! Readers of the snapshot file (dump/status) do not lock; the atomic
//! rename on write means they always see a complete file.

use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::{CacheError, Result};

pub struct LockGuard {
    file: std::fs::File,
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // unlock errors on drop are ignored; closing the fd releases it anyway
        let _ = self.file.unlock();
    }
}

pub fn lock_file_path(snapshot_path: &Path) -> PathBuf {
    let mut name = snapshot_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".lock");
    snapshot_path.with_file_name(name)
}

fn open_lock_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::io(format!("create dir {}", parent.display()), e))?;
        }
    }
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| CacheError::io(format!("open lock file {}", path.display()), e))
}

/// Exclusive lock without blocking; `LockHeld` if another owner exists.
pub fn try_acquire_exclusive_lock(snapshot_path: &Path) -> Result<LockGuard> {
    let path = lock_file_path(snapshot_path);
    let file = open_lock_file(&path)?;
    file.try_lock_exclusive()
        .map_err(|_| CacheError::LockHeld { path: path.clone() })?;
    Ok(LockGuard { file, path })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_is_sibling() {
        assert_eq!(
            lock_file_path(Path::new("/d/snapshot")),
            PathBuf::from("/d/snapshot.lock")
        );
    }
}
