//! Business rules over the history store.
//!
//! Recording a search is remove-then-reinsert: an existing entry with the
//! same trimmed text is deleted before the fresh insert, which refreshes
//! recency without ever holding duplicates. Every mutation schedules the
//! durable snapshot write on a dedicated single-writer task, so the
//! in-memory store is already up to date when the caller's next query runs
//! and the persisted blob is never written concurrently.

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::history::store::HistoryStore;
use crate::models::{EntryId, HistoryEntry};
use crate::storage::kv::{HISTORY_SNAPSHOT_KEY, KvStore};

/// Longest search text the store will record, matching the service's limit.
pub const MAX_SEARCH_LEN: usize = 200;
/// Entries shown in the suggestion dropdown.
pub const SUGGESTION_LIMIT: usize = 8;
/// Default fuzzy tolerance for live suggestions while typing.
pub const FUZZY_TOLERANCE: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionDirection {
    Up,
    Down,
}

/// Move the keyboard selection circularly through `len` entries.
///
/// Down past the last entry wraps to index 0, Up before index 0 wraps to the
/// last index. An empty list keeps the selection cleared.
pub fn navigate_selection(
    direction: SelectionDirection,
    len: usize,
    current: Option<usize>,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match (direction, current) {
        (SelectionDirection::Down, None) => 0,
        (SelectionDirection::Down, Some(i)) if i + 1 >= len => 0,
        (SelectionDirection::Down, Some(i)) => i + 1,
        (SelectionDirection::Up, None) => len - 1,
        (SelectionDirection::Up, Some(0)) => len - 1,
        (SelectionDirection::Up, Some(i)) => i - 1,
    })
}

/// The text to search on Enter: the selected entry when an index is set,
/// otherwise whatever was typed.
pub fn commit_selection(
    entries: &[HistoryEntry],
    index: Option<usize>,
    raw_input: &str,
) -> String {
    index
        .and_then(|i| entries.get(i))
        .map(|entry| entry.search.clone())
        .unwrap_or_else(|| raw_input.to_string())
}

pub struct HistoryController {
    store: HistoryStore,
    persist_tx: mpsc::UnboundedSender<String>,
}

impl HistoryController {
    /// Load the persisted history and start the snapshot writer task.
    ///
    /// A missing snapshot yields an empty store; a corrupt one is logged and
    /// also yields an empty store, never a failed startup. Must be called
    /// within a Tokio runtime.
    pub fn open(kv: KvStore) -> Self {
        let snapshot = match kv.get(HISTORY_SNAPSHOT_KEY) {
            Ok(blob) => blob,
            Err(err) => {
                warn!("failed to read history snapshot: {err:#}");
                None
            }
        };
        let store = match HistoryStore::open(snapshot.as_deref()) {
            Ok(store) => store,
            Err(err) => {
                warn!("history snapshot failed to load, starting empty: {err}");
                HistoryStore::default()
            }
        };

        let (persist_tx, persist_rx) = mpsc::unbounded_channel();
        tokio::spawn(persist_loop(kv, persist_rx));

        Self { store, persist_tx }
    }

    /// Record a committed search, refreshing recency without duplicates.
    ///
    /// Fire-and-forget for the caller: the in-memory store is updated before
    /// returning and the durable write happens on the writer task.
    pub fn record_search(&mut self, text: &str) {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        if trimmed.chars().count() > MAX_SEARCH_LEN {
            warn!("search text longer than {MAX_SEARCH_LEN} chars, not recorded");
            return;
        }

        if let Some(stale) = self.store.query_exact(trimmed) {
            debug!(entry = stale, "refreshing existing history entry");
            self.store.remove(stale);
        }
        self.store.insert(trimmed, Utc::now());
        self.schedule_persist();
    }

    /// Live projection for the dropdown: recent entries when the input is
    /// empty, fuzzy matches otherwise.
    pub fn suggestions(&mut self, input: &str, limit: usize) -> Vec<HistoryEntry> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            self.store.query_recent(limit)
        } else {
            self.store.query_fuzzy(trimmed, limit, FUZZY_TOLERANCE)
        }
    }

    /// Delete one entry and return the refreshed projection for the current
    /// input, so the UI can redraw without a reload.
    pub fn delete_entry(&mut self, id: EntryId, current_input: &str) -> Vec<HistoryEntry> {
        if self.store.remove(id) {
            self.schedule_persist();
        }
        self.suggestions(current_input, SUGGESTION_LIMIT)
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    fn schedule_persist(&self) {
        match self.store.snapshot() {
            Ok(blob) => {
                // Send fails only once the writer task is gone at shutdown.
                let _ = self.persist_tx.send(blob);
            }
            Err(err) => warn!("failed to serialize history snapshot: {err}"),
        }
    }
}

/// Single writer of the persisted snapshot blob. Coalesces a backlog down to
/// the newest snapshot before touching the disk.
async fn persist_loop(kv: KvStore, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(mut blob) = rx.recv().await {
        while let Ok(newer) = rx.try_recv() {
            blob = newer;
        }
        if let Err(err) = kv.put(HISTORY_SNAPSHOT_KEY, &blob) {
            warn!("failed to persist history snapshot: {err:#}");
        }
    }
}
