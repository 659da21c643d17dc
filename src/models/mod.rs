//! Data models for the workshop search client.
//!
//! This module defines the data structures used throughout the crate:
//!
//! - [`SearchResponse`] / [`SearchAnswer`] / [`Metadata`] / [`SearchStats`] - the
//!   search service wire contract
//! - [`SuggestionPoll`] / [`SuggestionStatus`] - the suggestion polling wire contract
//! - [`PushEvent`] - events delivered by the suggestion push channel
//! - [`HistoryEntry`] - locally stored past queries
//!
//! These models use serde for JSON (de)serialization; timestamps are chrono
//! `DateTime<Utc>` values.

pub mod history;
pub mod search;
pub mod suggestion;

pub use history::{EntryId, HistoryEntry};
pub use search::{Metadata, SearchAnswer, SearchResponse, SearchStats};
pub use suggestion::{PushEvent, SuggestionPoll, SuggestionStatus};
