//! In-memory store of past queries with exact, fuzzy and recency lookup.
//!
//! The schema is two fields per entry: `search` (text) and `date`. The full
//! state serializes to a version-tagged JSON snapshot after every mutation;
//! loading an unreadable or incompatible snapshot is a [`SnapshotError`] and
//! callers fall back to an empty store instead of failing startup.

use std::fmt;

use chrono::{DateTime, Utc};
use nucleo::pattern::{CaseMatching, Normalization, Pattern};
use nucleo::{Config, Matcher, Utf32Str};
use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::models::{EntryId, HistoryEntry};

/// Snapshot schema version, bumped on layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotState {
    version: u32,
    next_id: EntryId,
    entries: Vec<HistoryEntry>,
}

pub struct HistoryStore {
    /// Entries in insertion order; recency ties resolve to this order.
    entries: Vec<HistoryEntry>,
    next_id: EntryId,
    matcher: Matcher,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self { entries: Vec::new(), next_id: 1, matcher: Matcher::new(Config::DEFAULT) }
    }
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("entries", &self.entries)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl HistoryStore {
    /// Build a store, optionally hydrated from a prior snapshot.
    pub fn open(existing_snapshot: Option<&str>) -> Result<Self, SnapshotError> {
        let Some(blob) = existing_snapshot else {
            return Ok(Self::default());
        };
        let state: SnapshotState = serde_json::from_str(blob)?;
        if state.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                expected: SNAPSHOT_VERSION,
                found: state.version,
            });
        }
        Ok(Self {
            entries: state.entries,
            next_id: state.next_id,
            matcher: Matcher::new(Config::DEFAULT),
        })
    }

    /// Append an entry. Callers pass already-normalized (trimmed) text and
    /// persist the fresh [`Self::snapshot`] afterwards.
    pub fn insert(&mut self, text: &str, date: DateTime<Utc>) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(HistoryEntry { id, search: text.to_string(), date });
        id
    }

    /// Remove an entry, returning whether it existed.
    pub fn remove(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Exact lookup on the `search` field (trimmed equality).
    pub fn query_exact(&self, text: &str) -> Option<EntryId> {
        let needle = text.trim();
        self.entries.iter().find(|entry| entry.search == needle).map(|entry| entry.id)
    }

    /// Fuzzy lookup, most relevant first, `date` descending as tie-break.
    ///
    /// `tolerance` in `0.0..=1.0` keeps matches scoring at least
    /// `(1 - tolerance)` of the best match, so `0.0` returns only the top
    /// score and `1.0` every match.
    pub fn query_fuzzy(&mut self, text: &str, limit: usize, tolerance: f64) -> Vec<HistoryEntry> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let pattern = Pattern::parse(trimmed, CaseMatching::Ignore, Normalization::Smart);
        let Self { entries, matcher, .. } = self;
        let mut buf = Vec::new();
        let mut scored: Vec<(u32, HistoryEntry)> = entries
            .iter()
            .filter_map(|entry| {
                let haystack = Utf32Str::new(&entry.search, &mut buf);
                pattern.score(haystack, matcher).map(|score| (score, entry.clone()))
            })
            .collect();

        let Some(best) = scored.iter().map(|(score, _)| *score).max() else {
            return Vec::new();
        };
        let tolerance = tolerance.clamp(0.0, 1.0);
        let floor = ((best as f64) * (1.0 - tolerance)).ceil() as u32;
        scored.retain(|(score, _)| *score >= floor);
        scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.date.cmp(&a.1.date)));
        scored.into_iter().take(limit).map(|(_, entry)| entry).collect()
    }

    /// Most recent entries, `date` descending, ties in insertion order.
    pub fn query_recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries.truncate(limit);
        entries
    }

    /// Serialize the entire store state.
    pub fn snapshot(&self) -> Result<String, SnapshotError> {
        let state = SnapshotState {
            version: SNAPSHOT_VERSION,
            next_id: self.next_id,
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_string(&state)?)
    }

    pub fn get(&self, id: EntryId) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
