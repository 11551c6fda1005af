//! The entry store: the authoritative list of journal entries.
//!
//! All store state lives in a single task. Callers hold an [`EntryStore`]
//! handle and talk to that task over a channel, so state is only ever mutated
//! in one place and no locks are needed. Filesystem work is handed to a FIFO
//! [`io_worker`] and its results come back to the store task before they touch
//! any entry.
//!
//! Persistence is best-effort: failed reads and writes are logged and the
//! store carries on with a safe default.
//! The only errors a caller sees are for entries that do not exist, saves
//! aimed at an entry that is not selected, export failures, and a stopped
//! store.

mod io_worker;

use crate::clock::{Clock, SystemClock};
use crate::constants::{DEFAULT_DEBOUNCE_MS, STORE_COMMAND_BUFFER};
use crate::entry::{derive_preview, parse_entry_filename, Entry, Preview};
use crate::errors::{AppError, AppResult, EntryError, ExportError};
use crate::export::{suggested_filename, DocumentRenderer, ExportedDocument, RenderConfig};
use crate::storage::{EntryStorage, FileSystemStorage, ListedFile};
use chrono::{DateTime, Local};
use io_worker::IoWorker;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Tunables for an [`EntryStore`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Quiet period after the last edit before the buffer is saved.
    pub debounce: Duration,
    /// Seed text for an entry created into an empty store. `None` seeds nothing.
    pub welcome_text: Option<String>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            welcome_text: None,
        }
    }
}

/// Point-in-time copy of the store state.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSnapshot {
    /// Entries, most recently modified first.
    pub entries: Vec<Entry>,
    pub selected: Option<Uuid>,
    /// The live text buffer of the selected entry.
    pub text: String,
}

impl StoreSnapshot {
    pub fn entry(&self, id: Uuid) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.selected.and_then(|id| self.entry(id))
    }
}

/// What the store hands back for an export: the freshly saved content.
#[derive(Debug)]
struct ExportSource {
    content: String,
    display_date: String,
}

enum Command {
    Snapshot(oneshot::Sender<StoreSnapshot>),
    CreateNew(oneshot::Sender<Uuid>),
    Select {
        id: Uuid,
        reply: oneshot::Sender<AppResult<()>>,
    },
    TextChanged(String),
    Save {
        id: Uuid,
        reply: oneshot::Sender<AppResult<()>>,
    },
    LoadPreview(Uuid),
    Delete {
        id: Uuid,
        reply: oneshot::Sender<AppResult<()>>,
    },
    ExportSource {
        id: Uuid,
        reply: oneshot::Sender<AppResult<ExportSource>>,
    },
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Results of background jobs, applied back on the store task.
enum Completion {
    Saved {
        id: Uuid,
        seq: u64,
        filename: String,
        content: String,
        result: AppResult<()>,
    },
    PreviewLoaded {
        id: Uuid,
        result: AppResult<String>,
    },
}

/// Handle to a running entry store.
///
/// Cloning the handle is cheap; every clone talks to the same store. When the
/// last handle is dropped the store saves any pending edit and stops.
#[derive(Clone)]
pub struct EntryStore {
    commands: mpsc::Sender<Command>,
}

impl EntryStore {
    /// Opens the store: scans the entries directory, then picks the entry to
    /// work on (today's entry, or a fresh one).
    ///
    /// Never fails. A directory that cannot be created or listed is logged and
    /// the store starts with a single new entry.
    pub async fn open(
        storage: Arc<dyn EntryStorage>,
        clock: Arc<dyn Clock>,
        options: StoreOptions,
    ) -> Self {
        let root = storage.root().to_path_buf();
        let (commands, inbox) = mpsc::channel(STORE_COMMAND_BUFFER);

        let mut actor = StoreActor {
            io: IoWorker::spawn(storage),
            root,
            clock,
            options,
            entries: Vec::new(),
            selected: None,
            text: String::new(),
            buffer_loaded: true,
            debounce_deadline: None,
            save_seq: 0,
            in_flight: JoinSet::new(),
        };
        actor.initialize().await;
        tokio::spawn(actor.run(inbox));

        EntryStore { commands }
    }

    /// Opens a store over a directory on disk using the system clock.
    pub async fn open_dir(root: impl Into<PathBuf>, options: StoreOptions) -> Self {
        Self::open(
            Arc::new(FileSystemStorage::new(root)),
            Arc::new(SystemClock),
            options,
        )
        .await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> AppResult<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| AppError::StoreClosed)?;
        response.await.map_err(|_| AppError::StoreClosed)
    }

    pub async fn snapshot(&self) -> AppResult<StoreSnapshot> {
        self.request(Command::Snapshot).await
    }

    /// Creates, selects and immediately persists a new entry.
    pub async fn create_new(&self) -> AppResult<Uuid> {
        self.request(Command::CreateNew).await
    }

    /// Switches to another entry.
    ///
    /// The outgoing entry is saved before the incoming entry is read, so the
    /// buffer never leaks from one entry into another.
    pub async fn select(&self, id: Uuid) -> AppResult<()> {
        self.request(|reply| Command::Select { id, reply }).await?
    }

    /// Replaces the text buffer and restarts the autosave countdown.
    pub async fn text_changed(&self, text: impl Into<String>) -> AppResult<()> {
        self.commands
            .send(Command::TextChanged(text.into()))
            .await
            .map_err(|_| AppError::StoreClosed)
    }

    /// Saves the buffer into the selected entry right away.
    pub async fn save(&self, id: Uuid) -> AppResult<()> {
        self.request(|reply| Command::Save { id, reply }).await?
    }

    /// Starts loading an entry's preview if it has not been loaded yet.
    ///
    /// Returns once the load is scheduled; the preview shows up in a later
    /// snapshot.
    pub async fn load_preview(&self, id: Uuid) -> AppResult<()> {
        self.commands
            .send(Command::LoadPreview(id))
            .await
            .map_err(|_| AppError::StoreClosed)
    }

    /// Deletes an entry and its file. A file that is already gone is fine.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.request(|reply| Command::Delete { id, reply }).await?
    }

    /// Renders an entry with `renderer`.
    ///
    /// The selected entry is saved first so the document matches the buffer.
    pub async fn export_document(
        &self,
        id: Uuid,
        renderer: &dyn DocumentRenderer,
        config: &RenderConfig,
    ) -> AppResult<ExportedDocument> {
        let source = self
            .request(|reply| Command::ExportSource { id, reply })
            .await??;

        let filename = suggested_filename(&source.content, &source.display_date);
        let document = renderer.render(&source.content, config)?;
        info!(
            "Exported entry {} as {} ({} pages)",
            id, filename, document.pages
        );
        Ok(ExportedDocument { filename, document })
    }

    /// Saves a pending edit now and waits for all background work to land.
    pub async fn flush(&self) -> AppResult<()> {
        self.request(Command::Flush).await
    }

    /// Flushes and stops the store.
    pub async fn shutdown(self) -> AppResult<()> {
        self.request(Command::Shutdown).await
    }
}

struct StoreActor {
    io: IoWorker,
    root: PathBuf,
    clock: Arc<dyn Clock>,
    options: StoreOptions,
    entries: Vec<Entry>,
    selected: Option<Uuid>,
    text: String,
    /// False while `text` stands in for a file that could not be read.
    /// Such a buffer is never written back.
    buffer_loaded: bool,
    debounce_deadline: Option<Instant>,
    save_seq: u64,
    in_flight: JoinSet<Completion>,
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Turns a directory listing into entries, most recently modified first.
fn discover_entries(root: &Path, files: Vec<ListedFile>) -> Vec<Entry> {
    let mut entries = Vec::new();

    for ListedFile { name, modified } in files {
        if parse_entry_filename(&name).is_none() {
            debug!("Skipping {}: not an entry file", name);
            continue;
        }

        let modified = match modified {
            Ok(modified) => DateTime::<Local>::from(modified),
            Err(e) => {
                error!("Failed to read metadata for {}: {}", name, e);
                continue;
            }
        };

        entries.extend(Entry::from_file(root, &name, modified));
    }

    entries.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    entries
}

impl StoreActor {
    async fn run(mut self, mut inbox: mpsc::Receiver<Command>) {
        loop {
            tokio::select! {
                command = inbox.recv() => match command {
                    Some(Command::Shutdown(reply)) => {
                        self.flush().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle(command).await,
                    None => {
                        self.flush().await;
                        break;
                    }
                },
                () = wait_until(self.debounce_deadline) => self.fire_debounce(),
                Some(joined) = self.in_flight.join_next() => self.complete(joined),
            }
        }
        info!("Entry store stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::CreateNew(reply) => {
                let _ = reply.send(self.create_new());
            }
            Command::Select { id, reply } => {
                let _ = reply.send(self.select(id).await);
            }
            Command::TextChanged(text) => self.text_changed(text),
            Command::Save { id, reply } => {
                let _ = reply.send(self.save(id).await);
            }
            Command::LoadPreview(id) => self.load_preview(id),
            Command::Delete { id, reply } => {
                let _ = reply.send(self.delete(id).await);
            }
            Command::ExportSource { id, reply } => {
                let _ = reply.send(self.export_source(id).await);
            }
            Command::Flush(reply) => {
                self.flush().await;
                let _ = reply.send(());
            }
            // Intercepted by the run loop.
            Command::Shutdown(reply) => {
                let _ = reply.send(());
            }
        }
    }

    async fn initialize(&mut self) {
        info!("Loading entries from {:?}", self.root);

        if let Err(e) = self.io.submit(|s| s.ensure_root()).await {
            error!("Failed to create entries directory {:?}: {}", self.root, e);
        }

        match self.io.submit(|s| s.list()).await {
            Ok(files) => self.entries = discover_entries(&self.root, files),
            Err(e) => {
                error!("Failed to list entries directory: {}. Creating a fresh entry", e);
                self.create_new();
                return;
            }
        }
        info!("Loaded {} entries", self.entries.len());

        self.select_initial().await;
    }

    async fn select_initial(&mut self) {
        if self.entries.is_empty() {
            info!("No entries yet, creating the welcome entry");
            self.create_new();
            return;
        }

        let today = self.clock.now().date_naive();
        let todays_entry = self
            .entries
            .iter()
            .find(|entry| entry.modified_on(today))
            .map(|entry| entry.id);

        match todays_entry {
            Some(id) => {
                debug!("Resuming today's entry {}", id);
                self.selected = Some(id);
                self.load_buffer(id).await;
            }
            None => {
                info!("No entry for today, creating a new one");
                self.create_new();
            }
        }
    }

    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            entries: self.entries.clone(),
            selected: self.selected,
            text: self.text.clone(),
        }
    }

    fn entry(&self, id: Uuid) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    fn entry_mut(&mut self, id: Uuid) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    fn create_new(&mut self) -> Uuid {
        // Pending edits belong to the outgoing entry.
        if self.debounce_deadline.is_some() {
            self.fire_debounce();
        }

        let seed_welcome = self.entries.is_empty();
        let entry = Entry::create(&self.root, self.clock.now());
        let id = entry.id;
        info!("Created entry {}", entry.filename);

        self.entries.insert(0, entry);
        self.selected = Some(id);
        self.buffer_loaded = true;
        self.text = if seed_welcome {
            self.options.welcome_text.clone().unwrap_or_default()
        } else {
            String::new()
        };

        self.spawn_save(id);
        id
    }

    async fn select(&mut self, id: Uuid) -> AppResult<()> {
        if self.entry(id).is_none() {
            return Err(EntryError::NotFound(id).into());
        }
        if self.selected == Some(id) {
            return Ok(());
        }

        if let Some(outgoing) = self.selected {
            self.save_now(outgoing).await;
        }

        self.selected = Some(id);
        self.load_buffer(id).await;
        Ok(())
    }

    fn text_changed(&mut self, text: String) {
        self.text = text;
        self.buffer_loaded = true;
        self.debounce_deadline = Some(Instant::now() + self.options.debounce);
    }

    fn fire_debounce(&mut self) {
        self.debounce_deadline = None;
        if let Some(id) = self.selected {
            self.spawn_save(id);
        }
    }

    async fn save(&mut self, id: Uuid) -> AppResult<()> {
        if self.entry(id).is_none() {
            return Err(EntryError::NotFound(id).into());
        }
        if self.selected != Some(id) {
            return Err(EntryError::NotSelected(id).into());
        }
        self.save_now(id).await;
        Ok(())
    }

    fn next_seq(&mut self) -> u64 {
        self.save_seq += 1;
        self.save_seq
    }

    /// Queues a write of the buffer and lets it complete in the background.
    fn spawn_save(&mut self, id: Uuid) {
        if !self.writable(id) {
            return;
        }
        let Some(filename) = self.entry(id).map(|entry| entry.filename.clone()) else {
            return;
        };
        let content = self.text.clone();
        let seq = self.next_seq();

        let write = {
            let filename = filename.clone();
            let content = content.clone();
            self.io.submit(move |s| s.write(&filename, &content))
        };
        self.in_flight.spawn(async move {
            Completion::Saved {
                id,
                seq,
                filename,
                content,
                result: write.await,
            }
        });
    }

    /// Writes the buffer and waits for the write to finish.
    async fn save_now(&mut self, id: Uuid) {
        self.debounce_deadline = None;
        if !self.writable(id) {
            return;
        }
        let Some(filename) = self.entry(id).map(|entry| entry.filename.clone()) else {
            return;
        };
        let content = self.text.clone();
        let seq = self.next_seq();

        let result = {
            let filename = filename.clone();
            let content = content.clone();
            self.io.submit(move |s| s.write(&filename, &content)).await
        };
        self.apply_saved(id, seq, &filename, &content, result);
    }

    fn apply_saved(&mut self, id: Uuid, seq: u64, filename: &str, content: &str, result: AppResult<()>) {
        if let Err(e) = result {
            error!("Failed to save entry {}: {}", filename, e);
            return;
        }
        debug!("Saved entry {}", filename);

        // Modification time is left alone: the list only reorders on the
        // next scan.
        if let Some(entry) = self.entry_mut(id) {
            if seq > entry.preview_seq {
                entry.preview = Preview::Ready(derive_preview(content));
                entry.preview_seq = seq;
            }
        }
    }

    /// Whether the buffer may be written into `id`'s file.
    fn writable(&self, id: Uuid) -> bool {
        if !self.buffer_loaded {
            warn!("Not saving entry {}: its content could not be loaded", id);
        }
        self.buffer_loaded
    }

    /// Reads an entry's file into the buffer. A missing file reads as empty;
    /// an unreadable one leaves an empty buffer that is not saved until the
    /// user edits it.
    async fn load_buffer(&mut self, id: Uuid) {
        self.text = String::new();
        self.buffer_loaded = true;
        let Some(filename) = self.entry(id).map(|entry| entry.filename.clone()) else {
            return;
        };

        let read = {
            let filename = filename.clone();
            self.io.submit(move |s| s.read(&filename)).await
        };
        match read {
            Ok(text) => self.text = text,
            Err(e) if e.is_not_found() => debug!("Entry {} has no file yet", filename),
            Err(e) => {
                error!("Failed to load entry {}: {}", filename, e);
                self.buffer_loaded = false;
            }
        }
    }

    fn load_preview(&mut self, id: Uuid) {
        let Some(entry) = self.entry_mut(id) else {
            debug!("Preview requested for unknown entry {}", id);
            return;
        };
        if entry.preview != Preview::Unloaded {
            return;
        }
        entry.preview = Preview::Loading;
        let filename = entry.filename.clone();

        let read = self.io.submit(move |s| s.read(&filename));
        self.in_flight.spawn(async move {
            Completion::PreviewLoaded {
                id,
                result: read.await,
            }
        });
    }

    fn apply_preview(&mut self, id: Uuid, result: AppResult<String>) {
        let Some(entry) = self.entry_mut(id) else {
            return;
        };
        // A save may have filled the preview while the read was in flight.
        if entry.preview != Preview::Loading {
            return;
        }
        entry.preview = match result {
            Ok(content) => Preview::Ready(derive_preview(&content)),
            Err(e) => {
                error!("Failed to load preview for {}: {}", entry.filename, e);
                Preview::Failed
            }
        };
    }

    async fn delete(&mut self, id: Uuid) -> AppResult<()> {
        let Some(filename) = self.entry(id).map(|entry| entry.filename.clone()) else {
            return Err(EntryError::NotFound(id).into());
        };

        let removed = {
            let filename = filename.clone();
            self.io.submit(move |s| s.remove(&filename)).await
        };
        match removed {
            Ok(()) => info!("Deleted entry {}", filename),
            Err(e) if e.is_not_found() => debug!("Entry {} was already removed", filename),
            Err(e) => {
                error!("Failed to delete entry {}: {}", filename, e);
                return Ok(());
            }
        }

        self.entries.retain(|entry| entry.id != id);

        if self.selected == Some(id) {
            // Whatever was typed into the deleted entry goes with it.
            self.debounce_deadline = None;
            self.selected = None;

            match self.entries.first().map(|entry| entry.id) {
                Some(next) => {
                    self.selected = Some(next);
                    self.load_buffer(next).await;
                }
                None => {
                    self.create_new();
                }
            }
        }
        Ok(())
    }

    async fn export_source(&mut self, id: Uuid) -> AppResult<ExportSource> {
        let Some((filename, path, display_date)) = self
            .entry(id)
            .map(|entry| (entry.filename.clone(), entry.path.clone(), entry.display_date()))
        else {
            return Err(EntryError::NotFound(id).into());
        };

        if self.selected == Some(id) {
            self.save_now(id).await;
        }

        let content = self
            .io
            .submit(move |s| s.read(&filename))
            .await
            .map_err(|e| match e {
                AppError::Io(source) => ExportError::Read { path, source }.into(),
                other => other,
            })?;

        Ok(ExportSource {
            content,
            display_date,
        })
    }

    async fn flush(&mut self) {
        if self.debounce_deadline.is_some() {
            self.fire_debounce();
        }
        while let Some(joined) = self.in_flight.join_next().await {
            self.complete(joined);
        }
    }

    fn complete(&mut self, joined: Result<Completion, JoinError>) {
        match joined {
            Ok(Completion::Saved {
                id,
                seq,
                filename,
                content,
                result,
            }) => self.apply_saved(id, seq, &filename, &content, result),
            Ok(Completion::PreviewLoaded { id, result }) => self.apply_preview(id, result),
            Err(e) => warn!("Background entry job failed: {}", e),
        }
    }
}
