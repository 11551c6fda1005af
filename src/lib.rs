/*!
# freewrite

freewrite is a distraction-free journal. Every writing session is an entry backed by
one plain-text file in a single directory, and the text is saved as you type.

## Core Features

- Discover entries from the entries directory, newest first
- Resume today's entry on startup, or start a fresh one
- Debounced autosave of the text buffer
- Lazily loaded single-line previews
- Deleting entries while keeping a valid selection
- Exporting an entry as a paginated PDF document

## Architecture

- `entry`: the entry record, filenames and previews
- `storage`: filesystem access behind the `EntryStorage` trait, plus the directory lock
- `store`: the entry store, a single task that owns all entry state
- `export`: filename suggestion and document rendering
- `config`, `logging`, `cli`: the ambient pieces the binary wires together

## Usage Example

```rust,no_run
use freewrite::{Config, EntryStore};

#[tokio::main]
async fn main() -> freewrite::AppResult<()> {
    let config = Config::load()?;
    config.validate()?;

    let store = EntryStore::open_dir(&config.entries_dir, config.store_options()).await;
    store.text_changed("Morning pages").await?;
    store.shutdown().await
}
```
*/

/// Command-line interface for parsing and handling user arguments
pub mod cli;
/// Source of the current time
pub mod clock;
/// Configuration loading and management
pub mod config;
/// Application-wide constants
pub mod constants;
/// The entry record and its filename format
pub mod entry;
/// Error types and utilities for error handling
pub mod errors;
/// Exporting entries as documents
pub mod export;
/// Tracing subscriber setup
pub mod logging;
/// Filesystem access for entry files
pub mod storage;
/// The entry store
pub mod store;

// Re-export important types for convenience
pub use cli::CliArgs;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use entry::{Entry, Preview};
pub use errors::{AppError, AppResult};
pub use storage::{DirectoryLock, EntryStorage, FileSystemStorage};
pub use store::{EntryStore, StoreOptions, StoreSnapshot};
