//! Shared test doubles and helpers for the controller integration suites.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tokio::sync::{mpsc, watch};
use workshop_search_client::{
    ClientConfig, DeviceId, FeedStream, KvStore, Metadata, PushEvent, SearchAnswer,
    SearchBackend, SearchError, SearchResponse, SearchStats, SessionController,
    SuggestionPoll, SuggestionStatus,
};

/// One scripted reply for `search`.
pub enum ScriptedSearch {
    Answers(SearchResponse),
    NoResults,
    Service { code: String, message: String },
    Network(String),
}

/// In-process [`SearchBackend`] with scripted replies and call counters.
///
/// Unscripted searches behave as moderated (no results); unscripted polls
/// report `in_progress` forever; unscripted feeds end immediately without a
/// close event.
#[derive(Default)]
pub struct FakeBackend {
    pub search_calls: AtomicU32,
    pub poll_calls: AtomicU32,
    search_script: Mutex<VecDeque<ScriptedSearch>>,
    static_feeds: Mutex<HashMap<String, Vec<Result<PushEvent, SearchError>>>>,
    live_feeds: Mutex<HashMap<String, mpsc::UnboundedReceiver<Result<PushEvent, SearchError>>>>,
    poll_script: Mutex<VecDeque<SuggestionPoll>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_search(&self, reply: ScriptedSearch) {
        self.search_script.lock().unwrap().push_back(reply);
    }

    /// Register a fixed event sequence for a token's push channel.
    pub fn script_static_feed(&self, token: &str, events: Vec<Result<PushEvent, SearchError>>) {
        self.static_feeds.lock().unwrap().insert(token.to_string(), events);
    }

    /// Register a test-driven push channel for a token; events sent on the
    /// returned handle arrive on the feed as they are sent.
    pub fn script_live_feed(
        &self,
        token: &str,
    ) -> mpsc::UnboundedSender<Result<PushEvent, SearchError>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.live_feeds.lock().unwrap().insert(token.to_string(), rx);
        tx
    }

    pub fn script_poll(&self, poll: SuggestionPoll) {
        self.poll_script.lock().unwrap().push_back(poll);
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn search(
        &self,
        _query: &str,
        _limit: u32,
        _user: Option<&DeviceId>,
    ) -> Result<Option<SearchResponse>, SearchError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match self.search_script.lock().unwrap().pop_front() {
            None | Some(ScriptedSearch::NoResults) => Ok(None),
            Some(ScriptedSearch::Answers(response)) => Ok(Some(response)),
            Some(ScriptedSearch::Service { code, message }) => {
                Err(SearchError::Service { code, message })
            }
            Some(ScriptedSearch::Network(message)) => Err(SearchError::Network(message)),
        }
    }

    async fn open_feed(
        &self,
        token: &str,
        _user: Option<&DeviceId>,
    ) -> Result<FeedStream, SearchError> {
        if let Some(rx) = self.live_feeds.lock().unwrap().remove(token) {
            let stream = futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|event| (event, rx))
            });
            return Ok(Box::pin(stream));
        }
        let events = self.static_feeds.lock().unwrap().remove(token).unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(events)))
    }

    async fn poll_feed(
        &self,
        _token: &str,
        _user: Option<&DeviceId>,
    ) -> Result<SuggestionPoll, SearchError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.poll_script.lock().unwrap().pop_front();
        Ok(next.unwrap_or(SuggestionPoll {
            status: SuggestionStatus::InProgress,
            message: None,
        }))
    }
}

/// A plausible search response carrying `answers` results and the given
/// suggestion token (empty token = no feed started).
pub fn sample_response(token: &str, answers: usize) -> SearchResponse {
    SearchResponse {
        answers: (0..answers)
            .map(|i| SearchAnswer {
                id: format!("answer-{i}"),
                metadata: Metadata {
                    title: format!("Workshop {i}"),
                    url: format!("https://workshops.example/{i}"),
                    description: "Hands-on lab".to_string(),
                    last_updated: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                    audience: vec!["students".to_string()],
                    authors: vec!["Jane Doe".to_string()],
                    language: "en".to_string(),
                    tags: vec!["cloud".to_string()],
                },
                score: 0.9 - (i as f64) * 0.1,
            })
            .collect(),
        query: String::new(),
        stats: SearchStats { total: 42, time: 0.12 },
        suggestion_token: token.to_string(),
    }
}

/// A session over a fake backend and a throwaway storage namespace.
pub fn session_with(
    backend: Arc<FakeBackend>,
    config: ClientConfig,
) -> (SessionController, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let kv = KvStore::open(dir.path()).unwrap();
    (SessionController::with_backend(config, backend, kv), dir)
}

/// Generous bound so paused-clock tests can burn virtual time freely.
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Await the first published state satisfying `pred`.
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, mut pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            let current = rx.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.expect("state channel closed");
        }
    })
    .await
    .expect("timed out waiting for state change")
}
