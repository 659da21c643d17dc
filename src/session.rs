//! Query session controller.
//!
//! The single source of truth for the current search intent. A commit runs
//! `Idle/Error -> Committing -> AwaitingResult -> Idle | Error`; the dedupe
//! guard drops empty candidates and re-commits of the text already searched,
//! so repeated Enter presses on an unchanged query never reach the service.
//! Results, stats, the moderated "no results" condition and display-ready
//! errors are all published through a watch channel the UI subscribes to.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::client::{HttpSearchClient, SearchBackend};
use crate::config::ClientConfig;
use crate::error::ErrorInfo;
use crate::feed::SuggestionFeedController;
use crate::history::HistoryController;
use crate::identity::{DeviceId, get_or_create_device_id};
use crate::models::{SearchAnswer, SearchStats};
use crate::storage::kv::KvStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Committing,
    AwaitingResult,
    Error,
}

/// Observable state of the query session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub current_text: String,
    pub last_committed: Option<String>,
    pub answers: Vec<SearchAnswer>,
    pub stats: Option<SearchStats>,
    /// The service accepted the query but deliberately returned nothing
    /// (moderated input). Distinct from an error.
    pub no_results: bool,
    pub error: Option<ErrorInfo>,
}

impl SessionSnapshot {
    fn idle() -> Self {
        Self {
            phase: SessionPhase::Idle,
            current_text: String::new(),
            last_committed: None,
            answers: Vec::new(),
            stats: None,
            no_results: false,
            error: None,
        }
    }
}

pub struct SessionController {
    backend: Arc<dyn SearchBackend>,
    device_id: Option<DeviceId>,
    history: HistoryController,
    feed: SuggestionFeedController,
    result_limit: u32,
    last_committed: Option<String>,
    tx: watch::Sender<SessionSnapshot>,
}

impl SessionController {
    /// Build a session against the HTTP service described by `config`.
    ///
    /// Must be called within a Tokio runtime (the history writer task is
    /// spawned here).
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let kv = match &config.data_dir {
            Some(dir) => KvStore::open(dir.clone())?,
            None => KvStore::open_default()?,
        };
        let backend: Arc<dyn SearchBackend> = Arc::new(HttpSearchClient::new(&config)?);
        Ok(Self::with_backend(config, backend, kv))
    }

    /// Build a session over an arbitrary backend and storage namespace.
    pub fn with_backend(
        config: ClientConfig,
        backend: Arc<dyn SearchBackend>,
        kv: KvStore,
    ) -> Self {
        let device_id = get_or_create_device_id(&kv);
        let history = HistoryController::open(kv);
        let feed =
            SuggestionFeedController::new(Arc::clone(&backend), device_id.clone(), &config);
        let (tx, _) = watch::channel(SessionSnapshot::idle());
        Self {
            backend,
            device_id,
            history,
            feed,
            result_limit: config.result_limit,
            last_committed: None,
            tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn history(&mut self) -> &mut HistoryController {
        &mut self.history
    }

    pub fn feed(&self) -> &SuggestionFeedController {
        &self.feed
    }

    pub fn device_id(&self) -> Option<&DeviceId> {
        self.device_id.as_ref()
    }

    /// Mirror the input field while the user types, without committing.
    pub fn set_current_text(&mut self, text: &str) {
        self.tx.send_modify(|snap| snap.current_text = text.to_string());
    }

    /// Commit `candidate` as the current search. Returns whether a service
    /// call was issued; empty and duplicate candidates are no-ops.
    pub async fn submit(&mut self, candidate: &str) -> bool {
        let text = candidate.trim().to_string();
        if text.is_empty() {
            debug!("ignoring empty query");
            return false;
        }
        if self.last_committed.as_deref() == Some(text.as_str()) {
            debug!(query = %text, "ignoring re-commit of unchanged query");
            return false;
        }

        // Entering Committing supersedes any in-flight suggestion.
        self.feed.cancel();
        self.last_committed = Some(text.clone());
        self.tx.send_modify(|snap| {
            snap.phase = SessionPhase::Committing;
            snap.current_text = text.clone();
            snap.last_committed = Some(text.clone());
            snap.no_results = false;
            snap.error = None;
        });

        self.tx.send_modify(|snap| snap.phase = SessionPhase::AwaitingResult);
        let result =
            self.backend.search(&text, self.result_limit, self.device_id.as_ref()).await;

        match result {
            Ok(Some(response)) => {
                debug!(query = %text, answers = response.answers.len(), "search succeeded");
                self.history.record_search(&text);
                let token = response.suggestion_token.clone();
                self.tx.send_modify(|snap| {
                    snap.phase = SessionPhase::Idle;
                    snap.answers = response.answers.clone();
                    snap.stats = Some(response.stats);
                    snap.no_results = false;
                    snap.error = None;
                });
                if !token.is_empty() {
                    self.feed.start(&token);
                }
            }
            Ok(None) => {
                debug!(query = %text, "search returned no results");
                self.tx.send_modify(|snap| {
                    snap.phase = SessionPhase::Idle;
                    snap.answers.clear();
                    snap.stats = None;
                    snap.no_results = true;
                    snap.error = None;
                });
            }
            Err(err) => {
                debug!(query = %text, error = %err, "search failed");
                self.feed.cancel();
                self.tx.send_modify(|snap| {
                    snap.phase = SessionPhase::Error;
                    snap.answers.clear();
                    snap.stats = None;
                    snap.no_results = false;
                    snap.error = Some(ErrorInfo::from(&err));
                });
            }
        }
        true
    }
}
