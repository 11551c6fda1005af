/*!
# freewrite

Command-line front-end for the freewrite entry store.

## Usage

```
freewrite [OPTIONS] [COMMAND]

Commands:
  today   Prints the entry selected at startup (today's entry or a fresh one)
  list    Lists entries, most recently modified first
  new     Creates a new entry, optionally with initial text ("-" reads stdin)
  write   Appends lines from stdin to an entry, saving as you go
  show    Prints an entry's content
  delete  Deletes an entry and its file
  export  Exports an entry as a PDF document

Options:
      --log-format <LOG_FORMAT>  Log output format [default: text] [possible values: text, json]
      --log-level <LOG_LEVEL>    Log level filter (overridden by RUST_LOG)
  -h, --help                     Print help
  -V, --version                  Print version
```

## Configuration

- `FREEWRITE_DIR`: The directory holding entry files (defaults to `~/Documents/Freewrite`)
- `FREEWRITE_WELCOME`: A document to seed the first entry with instead of the bundled one
- `FREEWRITE_DEBOUNCE_MS`: Autosave delay after the last edit (defaults to 1000)
*/

use freewrite::cli::{CliArgs, Command};
use freewrite::clock::SystemClock;
use freewrite::config::Config;
use freewrite::entry::Preview;
use freewrite::errors::{AppError, AppResult};
use freewrite::export::PdfRenderer;
use freewrite::logging;
use freewrite::storage::{DirectoryLock, EntryStorage, FileSystemStorage};
use freewrite::store::EntryStore;
use std::fs;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{debug, error, info};

/// The main entry point for the freewrite binary.
///
/// 1. Initializes logging
/// 2. Loads and validates configuration
/// 3. Creates the entries directory if needed and locks it
/// 4. Opens the entry store
/// 5. Runs the requested command
/// 6. Shuts the store down, saving any pending edit
#[tokio::main]
async fn main() -> AppResult<()> {
    let args = CliArgs::parse();
    logging::init(args.log_format, args.log_level.as_deref())?;
    debug!("CLI arguments: {:?}", args);

    info!("Loading configuration");
    let config = Config::load()?;
    config.validate()?;
    debug!("Configuration: {:?}", config);

    let storage = FileSystemStorage::new(&config.entries_dir);
    if let Err(e) = storage.ensure_root() {
        error!("Failed to create entries directory: {}", e);
    }
    // The lock file lives inside the entries directory, so a directory that
    // could not be created surfaces here as a lock error.
    let _lock = DirectoryLock::acquire(&config.entries_dir)?;

    let store = EntryStore::open(
        Arc::new(storage),
        Arc::new(SystemClock),
        config.store_options(),
    )
    .await;

    let outcome = run(&store, args.command()).await;
    let stopped = store.shutdown().await;
    outcome.and(stopped)
}

async fn run(store: &EntryStore, command: Command) -> AppResult<()> {
    let render_config = command.render_config().unwrap_or_default();

    match command {
        Command::Today => {
            let snapshot = store.snapshot().await?;
            if let Some(entry) = snapshot.selected_entry() {
                info!("Selected entry {}", entry.filename);
            }
            print!("{}", snapshot.text);
        }
        Command::List { json, previews } => {
            if previews {
                for entry in store.snapshot().await?.entries {
                    store.load_preview(entry.id).await?;
                }
                store.flush().await?;
            }

            let snapshot = store.snapshot().await?;
            if json {
                let rendered = serde_json::to_string_pretty(&snapshot.entries)
                    .map_err(|e| AppError::Config(format!("Failed to encode entries: {}", e)))?;
                println!("{}", rendered);
            } else {
                for entry in &snapshot.entries {
                    let marker = if snapshot.selected == Some(entry.id) {
                        "*"
                    } else {
                        " "
                    };
                    match &entry.preview {
                        Preview::Ready(_) | Preview::Failed => println!(
                            "{} {}  {:<7} {}",
                            marker,
                            entry.id,
                            entry.display_date(),
                            entry.preview.display_text().unwrap_or_default()
                        ),
                        _ => println!("{} {}  {}", marker, entry.id, entry.display_date()),
                    }
                }
            }
        }
        Command::New { text } => {
            let id = store.create_new().await?;
            let initial = match text.as_deref() {
                Some("-") => Some(read_stdin().await?),
                other => other.map(str::to_string),
            };
            if let Some(initial) = initial {
                store.text_changed(initial).await?;
                store.save(id).await?;
            }
            println!("{}", id);
        }
        Command::Write { entry } => {
            if let Some(id) = entry {
                store.select(id).await?;
            }
            let mut buffer = store.snapshot().await?.text;
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if !buffer.is_empty() && !buffer.ends_with('\n') {
                    buffer.push('\n');
                }
                buffer.push_str(&line);
                buffer.push('\n');
                store.text_changed(buffer.clone()).await?;
            }
        }
        Command::Show { id } => {
            store.select(id).await?;
            print!("{}", store.snapshot().await?.text);
        }
        Command::Delete { id } => {
            store.delete(id).await?;
            println!("Deleted {}", id);
        }
        Command::Export { id, out, .. } => {
            let exported = store
                .export_document(id, &PdfRenderer::default(), &render_config)
                .await?;

            let dir = match out {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            fs::create_dir_all(&dir)?;
            let path = dir.join(&exported.filename);
            fs::write(&path, &exported.document.bytes)?;
            if exported.document.truncated {
                info!("Export stopped at {} pages", exported.document.pages);
            }
            println!("{}", path.display());
        }
    }
    Ok(())
}

async fn read_stdin() -> AppResult<String> {
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}
