//! Workshop Search Client - session orchestration for a remote workshop
//! search service with streaming AI suggestions.
//!
//! This library is the client-side core behind a search UI. It provides:
//!
//! - A query session state machine that commits searches with dedup, a
//!   fixed result limit and a hard timeout
//! - A locally persisted, fuzzy-searchable history of past queries
//! - An incremental suggestion feed over server-sent events, with a
//!   bounded polling fallback, cancelled cleanly when a new search
//!   supersedes it
//! - A stable per-device correlation key derived from machine signals
//!
//! The UI layer observes everything through watch-channel snapshots and
//! never mutates state directly.
//!
//! # Example
//!
//! ```no_run
//! use workshop_search_client::{ClientConfig, SessionController};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut session = SessionController::new(ClientConfig::default())?;
//! session.submit("azure functions").await;
//!
//! let snapshot = session.snapshot();
//! println!("{} answers", snapshot.answers.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod history;
pub mod identity;
pub mod models;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use client::{FeedStream, HttpSearchClient, SearchBackend};
pub use config::{ClientConfig, TransportMode};
pub use error::{ErrorInfo, SearchError, SnapshotError};
pub use feed::{FeedPhase, FeedSnapshot, SuggestionFeedController};
pub use history::{
    HistoryController, HistoryStore, SelectionDirection, commit_selection, navigate_selection,
};
pub use identity::{DeviceId, get_or_create_device_id};
pub use models::{
    EntryId, HistoryEntry, Metadata, PushEvent, SearchAnswer, SearchResponse, SearchStats,
    SuggestionPoll, SuggestionStatus,
};
pub use session::{SessionController, SessionPhase, SessionSnapshot};
pub use storage::KvStore;
