use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::QueryError;
use crate::model::document::{DocRef, DocumentRevision};

/// A full namespace listing pushed by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderBatch {
    /// The first complete gather after starting
    Gathered(Vec<DocRef>),
    /// A later listing after additions, removals, or metadata changes
    Updated(Vec<DocRef>),
}

/// Sending half handed to a provider. Safe to use from any thread.
#[derive(Debug, Clone)]
pub struct BatchSink {
    tx: mpsc::Sender<ProviderBatch>,
}

impl BatchSink {
    pub fn new(tx: mpsc::Sender<ProviderBatch>) -> Self {
        BatchSink { tx }
    }

    /// Queue a batch. Returns false once the receiving session is gone.
    pub fn send(&self, batch: ProviderBatch) -> bool {
        self.tx.send(batch).is_ok()
    }
}

/// Source of namespace listings behind a query session
pub trait DocumentProvider {
    /// Start gathering. Must deliver a `Gathered` batch through `sink`, then
    /// `Updated` batches whenever the namespace changes.
    fn start(&mut self, sink: BatchSink) -> Result<(), QueryError>;

    /// Stop delivering batches
    fn stop(&mut self);
}

// ---------------------------------------------------------------------------
// Directory-backed provider
// ---------------------------------------------------------------------------

/// Treats a local directory (e.g. a synced cloud drive folder) as the
/// namespace and rescans it whenever the file system reports a change.
pub struct DirectoryProvider {
    root: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirectoryProvider {
            root: root.into(),
            watcher: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentProvider for DirectoryProvider {
    fn start(&mut self, sink: BatchSink) -> Result<(), QueryError> {
        if !self.root.is_dir() {
            return Err(QueryError::Unavailable(self.root.display().to_string()));
        }
        // Watchers report resolved paths
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());

        // Watch before scanning so nothing created in between is missed
        let watch_root = root.clone();
        let events = sink.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let event = match result {
                    Ok(e) => e,
                    Err(e) => {
                        warn!("watch error: {}", e);
                        return;
                    }
                };

                match event.kind {
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
                    _ => return,
                }
                if !event.paths.iter().any(|p| p.starts_with(&root) && !is_hidden(p)) {
                    return;
                }

                // A vanished root degrades to an empty namespace
                let listing = scan_directory(&root).unwrap_or_else(|e| {
                    warn!("rescan failed: {}", e);
                    Vec::new()
                });
                debug!("namespace changed, {} entries", listing.len());
                events.send(ProviderBatch::Updated(listing));
            },
            Config::default(),
        )?;
        watcher.watch(&watch_root, RecursiveMode::Recursive)?;

        sink.send(ProviderBatch::Gathered(scan_directory(&watch_root)?));
        self.watcher = Some(watcher);
        Ok(())
    }

    fn stop(&mut self) {
        // Dropping the watcher ends its event thread
        if self.watcher.take().is_some() {
            debug!("stopped watching {}", self.root.display());
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Recursively list every non-hidden file under `root`
pub fn scan_directory(root: &Path) -> Result<Vec<DocRef>, QueryError> {
    let mut docs = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| QueryError::ReadError {
            path: dir.clone(),
            source: e,
        })?;
        for entry in entries.flatten() {
            let path = entry.path();
            if is_hidden(&path) {
                continue;
            }
            // Files can disappear between readdir and stat
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            if meta.is_dir() {
                pending.push(path);
            } else if meta.is_file() {
                let modified: DateTime<Utc> =
                    meta.modified().unwrap_or(SystemTime::UNIX_EPOCH).into();
                docs.push(DocRef::new(
                    path,
                    DocumentRevision {
                        modified,
                        size: meta.len(),
                    },
                ));
            }
        }
    }
    docs.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(docs)
}

// ---------------------------------------------------------------------------
// In-memory provider
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct MemoryState {
    available: bool,
    listing: Vec<DocRef>,
    sink: Option<BatchSink>,
}

/// In-process namespace, driven through a `MemoryProviderHandle`
#[derive(Debug)]
pub struct MemoryProvider {
    state: Arc<Mutex<MemoryState>>,
}

/// Publishes listings into a `MemoryProvider`, from any thread
#[derive(Debug, Clone)]
pub struct MemoryProviderHandle {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryProvider {
    pub fn new(initial: Vec<DocRef>) -> (Self, MemoryProviderHandle) {
        let state = Arc::new(Mutex::new(MemoryState {
            available: true,
            listing: initial,
            sink: None,
        }));
        (
            MemoryProvider {
                state: Arc::clone(&state),
            },
            MemoryProviderHandle { state },
        )
    }

    /// A provider whose namespace cannot be reached
    pub fn unavailable() -> (Self, MemoryProviderHandle) {
        let (provider, handle) = Self::new(Vec::new());
        lock(&provider.state).available = false;
        (provider, handle)
    }
}

impl DocumentProvider for MemoryProvider {
    fn start(&mut self, sink: BatchSink) -> Result<(), QueryError> {
        let mut state = lock(&self.state);
        if !state.available {
            return Err(QueryError::Unavailable("memory namespace".into()));
        }
        sink.send(ProviderBatch::Gathered(state.listing.clone()));
        state.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) {
        lock(&self.state).sink = None;
    }
}

impl MemoryProviderHandle {
    /// Replace the namespace listing and notify a running query
    pub fn publish(&self, listing: Vec<DocRef>) {
        let mut state = lock(&self.state);
        state.listing = listing;
        if let Some(sink) = &state.sink {
            sink.send(ProviderBatch::Updated(state.listing.clone()));
        }
    }

    /// Report the current listing again without changing it
    pub fn republish(&self) {
        let state = lock(&self.state);
        if let Some(sink) = &state.sink {
            sink.send(ProviderBatch::Updated(state.listing.clone()));
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.state).sink.is_some()
    }
}

fn lock(state: &Mutex<MemoryState>) -> MutexGuard<'_, MemoryState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}
