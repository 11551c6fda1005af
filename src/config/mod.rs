//! Configuration management for freewrite.
//!
//! This module handles loading and validating configuration settings from environment
//! variables, with sensible defaults.
//!
//! # Environment Variables
//!
//! - `FREEWRITE_DIR`: Path to the entries directory (defaults to `<Documents>/Freewrite`)
//! - `FREEWRITE_WELCOME`: Path to a document replacing the bundled welcome text
//! - `FREEWRITE_DEBOUNCE_MS`: Autosave delay after the last edit (defaults to 1000)
//! - `HOME`: Used to locate the documents folder when the platform reports none

use crate::constants::{
    DEFAULT_DEBOUNCE_MS, ENTRIES_DIR_NAME, ENV_VAR_FREEWRITE_DEBOUNCE_MS, ENV_VAR_FREEWRITE_DIR,
    ENV_VAR_FREEWRITE_WELCOME, ENV_VAR_HOME, FALLBACK_DOCUMENTS_DIR, MAX_DEBOUNCE_MS,
    REDACTED_PLACEHOLDER,
};
use crate::errors::{AppError, AppResult};
use crate::store::StoreOptions;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// The welcome document compiled into the binary.
pub const BUNDLED_WELCOME: &str = include_str!("../../assets/default.md");

/// Configuration for freewrite.
///
/// # Examples
///
/// ```
/// use freewrite::Config;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// let config = Config {
///     entries_dir: PathBuf::from("/path/to/Freewrite"),
///     welcome_template: None,
///     debounce: Duration::from_millis(500),
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct Config {
    /// Directory where entry files live.
    pub entries_dir: PathBuf,

    /// Replacement for the bundled welcome document. `None` uses the bundled one.
    pub welcome_template: Option<PathBuf>,

    /// Autosave delay after the last edit.
    pub debounce: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("entries_dir", &REDACTED_PLACEHOLDER)
            .field(
                "welcome_template",
                &self.welcome_template.as_ref().map(|_| REDACTED_PLACEHOLDER),
            )
            .field("debounce", &self.debounce)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            entries_dir: PathBuf::from(""),
            welcome_template: None,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        }
    }
}

/// Expands `~` and environment variables in a user supplied path.
fn expand_path(raw: &str) -> AppResult<PathBuf> {
    let expanded = shellexpand::full(raw)
        .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// `<Documents>/Freewrite` for the current user.
fn default_entries_dir() -> PathBuf {
    let documents = dirs::document_dir().unwrap_or_else(|| {
        let home = env::var(ENV_VAR_HOME).unwrap_or_default();
        Path::new(&home).join(FALLBACK_DOCUMENTS_DIR)
    });
    documents.join(ENTRIES_DIR_NAME)
}

impl Config {
    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a path cannot be expanded or
    /// `FREEWRITE_DEBOUNCE_MS` is not a number.
    pub fn load() -> AppResult<Self> {
        let entries_dir = match env::var(ENV_VAR_FREEWRITE_DIR) {
            Ok(raw) if !raw.is_empty() => expand_path(&raw)?,
            _ => default_entries_dir(),
        };

        let welcome_template = match env::var(ENV_VAR_FREEWRITE_WELCOME) {
            Ok(raw) if !raw.is_empty() => Some(expand_path(&raw)?),
            _ => None,
        };

        let debounce = match env::var(ENV_VAR_FREEWRITE_DEBOUNCE_MS) {
            Ok(raw) => {
                let millis = raw.trim().parse::<u64>().map_err(|e| {
                    AppError::Config(format!(
                        "{} must be a whole number of milliseconds: {}",
                        ENV_VAR_FREEWRITE_DEBOUNCE_MS, e
                    ))
                })?;
                Duration::from_millis(millis)
            }
            Err(_) => Duration::from_millis(DEFAULT_DEBOUNCE_MS),
        };

        Ok(Config {
            entries_dir,
            welcome_template,
            debounce,
        })
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the entries directory is empty or
    /// relative, or the debounce is zero or longer than a minute.
    pub fn validate(&self) -> AppResult<()> {
        if self.entries_dir.as_os_str().is_empty() {
            return Err(AppError::Config(
                "Entries directory path is empty".to_string(),
            ));
        }

        if !self.entries_dir.is_absolute() {
            return Err(AppError::Config(
                "Entries directory must be an absolute path".to_string(),
            ));
        }

        if self.debounce.is_zero() || self.debounce > Duration::from_millis(MAX_DEBOUNCE_MS) {
            return Err(AppError::Config(format!(
                "Autosave delay must be between 1 and {} milliseconds",
                MAX_DEBOUNCE_MS
            )));
        }

        Ok(())
    }

    /// Text used to seed the first entry of an empty journal.
    ///
    /// An unreadable replacement document is logged and seeds nothing.
    pub fn welcome_text(&self) -> Option<String> {
        match &self.welcome_template {
            None => Some(BUNDLED_WELCOME.to_string()),
            Some(path) => match fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!("Failed to read welcome document {:?}: {}", path, e);
                    None
                }
            },
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            debounce: self.debounce,
            welcome_text: self.welcome_text(),
        }
    }
}
