//! Error handling utilities for the freewrite crate.
//!
//! This module provides the central error type `AppError` which represents all
//! error conditions that can reach a caller, as well as the convenience type
//! alias `AppResult` for functions that can return these errors.
//!
//! Most filesystem failures never get this far: the entry store logs them and
//! falls back to a safe default (empty content, skipped entry, error preview).
//! What remains are caller mistakes and hard stops.

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised when an operation names an entry the store cannot act on.
///
/// # Examples
///
/// ```
/// use freewrite::errors::EntryError;
/// use uuid::Uuid;
///
/// let error = EntryError::NotFound(Uuid::nil());
/// assert!(format!("{}", error).contains("not found"));
/// ```
#[derive(Debug, Error)]
pub enum EntryError {
    /// No entry with this id is in the store.
    #[error("Entry {0} not found")]
    NotFound(Uuid),

    /// The buffer can only be saved into the selected entry.
    #[error("Entry {0} is not the selected entry. Select it before saving.")]
    NotSelected(Uuid),
}

/// Represents errors that can occur when attempting to lock the entries directory.
///
/// # Examples
///
/// ```
/// use freewrite::errors::LockError;
/// use std::path::PathBuf;
///
/// let error = LockError::FileBusy {
///     path: PathBuf::from("/path/to/Freewrite/.freewrite.lock"),
/// };
///
/// assert!(format!("{}", error).contains("another freewrite process"));
/// ```
#[derive(Debug, Error)]
pub enum LockError {
    /// Error when the directory is already locked by another process.
    #[error("Entries directory is in use by another freewrite process: {path}. Close the other instance and try again.")]
    FileBusy {
        /// The path to the lock file
        path: PathBuf,
    },

    /// Error when acquiring the lock fails for a technical reason.
    #[error("Failed to acquire lock {path}: {source}. Please check file permissions and ensure the directory is accessible.")]
    AcquisitionFailed {
        /// The path to the lock file that couldn't be locked
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Errors raised while exporting an entry as a document.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The entry's saved content could not be read back.
    #[error("Failed to read entry {path} for export: {source}")]
    Read {
        /// Path of the entry file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The renderer rejected the document.
    #[error("Failed to render document: {0}")]
    Render(String),
}

/// Represents all errors that can reach a caller of the freewrite crate.
///
/// Note: This type does not implement `Clone` to avoid losing error context when
/// cloning `std::io::Error` values.
///
/// # Examples
///
/// Converting from an IO error:
/// ```
/// use freewrite::errors::AppError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "file not found");
/// let app_error: AppError = io_error.into();
///
/// match app_error {
///     AppError::Io(inner) => assert_eq!(inner.kind(), ErrorKind::NotFound),
///     _ => panic!("Expected Io variant"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operation referenced an entry the store cannot act on.
    #[error("Entry error: {0}")]
    Entry(#[from] EntryError),

    /// Errors related to locking the entries directory.
    #[error("File locking error: {0}")]
    Lock(#[from] LockError),

    /// Errors raised while exporting a document.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The entry store task has stopped and no longer accepts requests.
    #[error("Entry store is no longer running")]
    StoreClosed,
}

impl AppError {
    /// Returns true when this is an I/O error of kind `NotFound`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;
