//! Locally persisted, locally searchable query history.
//!
//! [`HistoryStore`] is the in-memory indexed store (exact, fuzzy and recency
//! lookup plus full-state snapshots); [`HistoryController`] layers the
//! business rules on top: trim/validate, remove-then-reinsert dedupe,
//! keyboard-driven selection, and durable snapshot scheduling.

pub mod controller;
pub mod store;

pub use controller::{
    HistoryController, SelectionDirection, commit_selection, navigate_selection,
};
pub use store::HistoryStore;
