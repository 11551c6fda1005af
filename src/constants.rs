//! Constants used throughout the application.
//!
//! This module contains all constants used in the freewrite crate, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "freewrite";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "A distraction-free journal backed by plain-text entries";

// CLI Arguments & Defaults
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for overriding the entries directory.
pub const ENV_VAR_FREEWRITE_DIR: &str = "FREEWRITE_DIR";
/// Environment variable pointing at a replacement welcome document.
pub const ENV_VAR_FREEWRITE_WELCOME: &str = "FREEWRITE_WELCOME";
/// Environment variable for the autosave debounce window in milliseconds.
pub const ENV_VAR_FREEWRITE_DEBOUNCE_MS: &str = "FREEWRITE_DEBOUNCE_MS";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Name of the entries directory inside the user's documents folder.
pub const ENTRIES_DIR_NAME: &str = "Freewrite";
/// Documents folder name used when the platform does not report one.
pub const FALLBACK_DOCUMENTS_DIR: &str = "Documents";
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// File System Parameters
/// File extension (without the dot) for journal entries.
pub const ENTRY_FILE_EXTENSION: &str = "md";
/// Name of the advisory lock file kept in the entries directory.
pub const LOCK_FILE_NAME: &str = ".freewrite.lock";
/// Default POSIX permissions for newly created directories (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;

// Entry Naming
/// `chrono` format of the timestamp group inside an entry filename.
pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";
/// `chrono` format of the short date shown next to an entry.
pub const DISPLAY_DATE_FORMAT: &str = "%b %-d";

// Autosave & Previews
/// Default delay between the last edit and the automatic save.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
/// Upper bound accepted for the debounce window.
pub const MAX_DEBOUNCE_MS: u64 = 60_000;
/// Number of characters kept in a preview before it is cut.
pub const PREVIEW_MAX_CHARS: usize = 30;
/// Marker appended to a truncated preview.
pub const PREVIEW_ELLIPSIS: &str = "...";
/// Preview shown when an entry's content could not be read.
pub const PREVIEW_ERROR_TEXT: &str = "Error loading preview";
/// Capacity of the command channel feeding the entry store.
pub const STORE_COMMAND_BUFFER: usize = 64;

// Export
/// Number of leading words used to build an export filename.
pub const EXPORT_TITLE_WORDS: usize = 4;
/// Punctuation stripped from both ends of each title word.
pub const EXPORT_TITLE_TRIM_CHARS: &[char] = &[
    ',', '.', '!', '?', ';', ':', '\'', '(', ')', '[', ']', '{', '}', '<', '>',
];
/// File extension appended to exported documents.
pub const EXPORT_FILE_EXTENSION: &str = "pdf";
/// Default font family for exported documents.
pub const DEFAULT_EXPORT_FONT: &str = "Palatino";
/// Default font size for exported documents, in points.
pub const DEFAULT_EXPORT_FONT_SIZE: f32 = 18.0;
/// Line height as a multiple of the font size.
pub const DEFAULT_LINE_HEIGHT_MULTIPLE: f32 = 1.5;
/// US Letter page width in points.
pub const PAGE_WIDTH_PT: f32 = 612.0;
/// US Letter page height in points.
pub const PAGE_HEIGHT_PT: f32 = 792.0;
/// Page margin on every side, in points.
pub const PAGE_MARGIN_PT: f32 = 72.0;
/// Hard stop for pagination on pathological input.
pub const MAX_EXPORT_PAGES: usize = 1000;
