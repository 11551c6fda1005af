//! Filesystem access for entry files.
//!
//! The entry store never touches `std::fs` directly. Everything goes through
//! the [`EntryStorage`] trait so the store can be driven against a real
//! directory in production and an instrumented one in tests. Implementations
//! are synchronous; the store runs them on the blocking thread pool.

mod lock;

pub use lock::DirectoryLock;

use crate::errors::{AppError, AppResult};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A regular file found in the entries directory.
#[derive(Debug)]
pub struct ListedFile {
    /// Bare file name, no directory component.
    pub name: String,
    /// Last modification time, or the error raised while reading it.
    pub modified: AppResult<SystemTime>,
}

/// Filesystem operations the entry store depends on.
///
/// All names are bare file names relative to [`EntryStorage::root`].
pub trait EntryStorage: Send + Sync + 'static {
    /// Directory holding the entry files.
    fn root(&self) -> &Path;

    /// Creates the root directory if it does not exist yet.
    fn ensure_root(&self) -> AppResult<()>;

    /// Lists the regular files directly inside the root.
    fn list(&self) -> AppResult<Vec<ListedFile>>;

    /// Reads a file as UTF-8 text.
    fn read(&self, name: &str) -> AppResult<String>;

    /// Replaces a file's content. Readers never observe a partial write.
    fn write(&self, name: &str, contents: &str) -> AppResult<()>;

    /// Deletes a file.
    fn remove(&self, name: &str) -> AppResult<()>;
}

/// [`EntryStorage`] backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileSystemStorage { root: root.into() }
    }
}

impl EntryStorage for FileSystemStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_root(&self) -> AppResult<()> {
        if self.root.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create entries directory: {}", e),
            ))
        })?;

        #[cfg(unix)]
        {
            use crate::constants::DEFAULT_DIR_PERMISSIONS;
            use std::os::unix::fs::PermissionsExt;

            fs::set_permissions(
                &self.root,
                fs::Permissions::from_mode(DEFAULT_DIR_PERMISSIONS),
            )?;
            debug!("Set 0o700 permissions on entries directory");
        }

        Ok(())
    }

    fn list(&self) -> AppResult<Vec<ListedFile>> {
        // Surface a missing or unreadable root as a single error instead of
        // letting walkdir report it as an item.
        fs::read_dir(&self.root)?;

        let mut files = Vec::new();
        for item in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
        {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    warn!("Skipping unreadable directory item: {}", e);
                    continue;
                }
            };
            if !item.file_type().is_file() {
                continue;
            }
            let Some(name) = item.file_name().to_str() else {
                debug!("Skipping non UTF-8 file name {:?}", item.file_name());
                continue;
            };

            let modified = item
                .metadata()
                .map_err(|e| {
                    AppError::Io(
                        e.into_io_error()
                            .unwrap_or_else(|| std::io::Error::other("metadata unavailable")),
                    )
                })
                .and_then(|metadata| Ok(metadata.modified()?));

            files.push(ListedFile {
                name: name.to_string(),
                modified,
            });
        }
        Ok(files)
    }

    fn read(&self, name: &str) -> AppResult<String> {
        Ok(fs::read_to_string(self.root.join(name))?)
    }

    fn write(&self, name: &str, contents: &str) -> AppResult<()> {
        let mut file = tempfile::NamedTempFile::new_in(&self.root)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.root.join(name)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> AppResult<()> {
        Ok(fs::remove_file(self.root.join(name))?)
    }
}
