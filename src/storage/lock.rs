//! Advisory lock on the entries directory.
//!
//! Two processes autosaving into the same directory would race on every
//! entry they share, so the front-end holds an exclusive lock for as long as
//! it has a store open.

use crate::constants::LOCK_FILE_NAME;
use crate::errors::{AppResult, LockError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Holds an exclusive lock on `<root>/.freewrite.lock` until dropped.
#[derive(Debug)]
pub struct DirectoryLock {
    file: File,
    path: PathBuf,
}

impl DirectoryLock {
    /// Takes the lock without blocking.
    ///
    /// # Errors
    ///
    /// - `LockError::FileBusy` if another process holds the lock.
    /// - `LockError::AcquisitionFailed` if the lock file cannot be opened or locked.
    pub fn acquire(root: &Path) -> AppResult<Self> {
        let path = root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::AcquisitionFailed {
                path: path.clone(),
                source,
            })?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(LockError::FileBusy { path }.into());
            }
            return Err(LockError::AcquisitionFailed { path, source: e }.into());
        }

        debug!("Acquired lock {:?}", path);
        Ok(DirectoryLock { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!("Failed to release lock {:?}: {}", self.path, e);
        }
    }
}
