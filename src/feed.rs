//! Suggestion feed controller.
//!
//! Accumulates incremental suggestion text for one token at a time, over a
//! push channel or a bounded polling loop. Starting a feed for a new token
//! tears the previous one down first: the old task is aborted and the epoch
//! marker bumped under the state lock, so any in-flight completion of a
//! superseded feed is dropped as a no-op instead of racing the new feed's
//! accumulation.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::SearchBackend;
use crate::config::{ClientConfig, TransportMode};
use crate::error::{ErrorInfo, SearchError};
use crate::identity::DeviceId;
use crate::models::PushEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Streaming,
    Polling,
    Done,
    Failed,
}

/// Observable state of the suggestion feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub token: Option<String>,
    /// Accumulated suggestion text; append-only while live, frozen once
    /// Done or Failed.
    pub text: String,
    pub phase: FeedPhase,
    /// Poll attempts made for the current token.
    pub attempt: u32,
    pub error: Option<ErrorInfo>,
    /// Invalidation marker; bumped whenever a feed is superseded.
    epoch: u64,
}

impl FeedSnapshot {
    fn idle() -> Self {
        Self {
            token: None,
            text: String::new(),
            phase: FeedPhase::Idle,
            attempt: 0,
            error: None,
            epoch: 0,
        }
    }
}

/// Epoch-checked writer handle used by feed tasks.
///
/// Every write re-validates the epoch under the watch lock, so a task that
/// outlived its feed can never publish.
#[derive(Clone)]
struct FeedPublisher {
    tx: Arc<watch::Sender<FeedSnapshot>>,
    epoch: u64,
}

impl FeedPublisher {
    /// Apply `update` unless a newer feed superseded this one. Returns
    /// whether the write happened.
    fn publish(&self, update: impl FnOnce(&mut FeedSnapshot)) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.epoch != self.epoch {
                return false;
            }
            update(snap);
            true
        })
    }

    fn fail(&self, err: &SearchError) {
        self.publish(|snap| {
            snap.phase = FeedPhase::Failed;
            snap.error = Some(ErrorInfo::from(err));
        });
    }
}

pub struct SuggestionFeedController {
    backend: Arc<dyn SearchBackend>,
    device_id: Option<DeviceId>,
    transport: TransportMode,
    poll_interval: Duration,
    poll_budget: u32,
    tx: Arc<watch::Sender<FeedSnapshot>>,
    task: Option<JoinHandle<()>>,
}

impl SuggestionFeedController {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        device_id: Option<DeviceId>,
        config: &ClientConfig,
    ) -> Self {
        let (tx, _) = watch::channel(FeedSnapshot::idle());
        Self {
            backend,
            device_id,
            transport: config.transport,
            poll_interval: config.poll_interval,
            poll_budget: config.poll_budget,
            tx: Arc::new(tx),
            task: None,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.tx.borrow().clone()
    }

    /// Begin accumulating for `token`, superseding any live feed.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(&mut self, token: &str) {
        self.teardown();

        let phase = match self.transport {
            TransportMode::Push => FeedPhase::Streaming,
            TransportMode::Poll => FeedPhase::Polling,
        };
        let mut epoch = 0;
        self.tx.send_modify(|snap| {
            snap.epoch += 1;
            epoch = snap.epoch;
            snap.token = Some(token.to_string());
            snap.text.clear();
            snap.phase = phase;
            snap.attempt = 0;
            snap.error = None;
        });
        debug!(token, ?phase, "starting suggestion feed");

        let publisher = FeedPublisher { tx: Arc::clone(&self.tx), epoch };
        let backend = Arc::clone(&self.backend);
        let device_id = self.device_id.clone();
        let token = token.to_string();
        let handle = match self.transport {
            TransportMode::Push => {
                tokio::spawn(run_push(backend, token, device_id, publisher))
            }
            TransportMode::Poll => {
                let interval = self.poll_interval;
                let budget = self.poll_budget;
                tokio::spawn(run_poll(backend, token, device_id, publisher, interval, budget))
            }
        };
        self.task = Some(handle);
    }

    /// Stop the live feed, if any, and reset to Idle. A cancelled feed emits
    /// no further state changes.
    pub fn cancel(&mut self) {
        self.teardown();
        self.tx.send_modify(|snap| {
            snap.epoch += 1;
            snap.token = None;
            snap.text.clear();
            snap.phase = FeedPhase::Idle;
            snap.attempt = 0;
            snap.error = None;
        });
    }

    fn teardown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SuggestionFeedController {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_push(
    backend: Arc<dyn SearchBackend>,
    token: String,
    device_id: Option<DeviceId>,
    publisher: FeedPublisher,
) {
    let mut stream = match backend.open_feed(&token, device_id.as_ref()).await {
        Ok(stream) => stream,
        Err(err) => {
            publisher.fail(&err);
            return;
        }
    };

    while let Some(event) = stream.next().await {
        match event {
            Ok(PushEvent::Fragment(fragment)) => {
                debug!(token = %token, bytes = fragment.len(), "suggestion fragment");
                if !publisher.publish(|snap| snap.text.push_str(&fragment)) {
                    return;
                }
            }
            Ok(PushEvent::Closed) => {
                publisher.publish(|snap| snap.phase = FeedPhase::Done);
                return;
            }
            Err(err) => {
                publisher.fail(&err);
                return;
            }
        }
    }
    // The channel ended without the server's completion signal.
    publisher.fail(&SearchError::FeedClosedAbnormally);
}

async fn run_poll(
    backend: Arc<dyn SearchBackend>,
    token: String,
    device_id: Option<DeviceId>,
    publisher: FeedPublisher,
    interval: Duration,
    budget: u32,
) {
    if budget == 0 {
        publisher.fail(&SearchError::FeedExhausted);
        return;
    }

    for attempt in 1..=budget {
        if !publisher.publish(|snap| snap.attempt = attempt) {
            return;
        }
        match backend.poll_feed(&token, device_id.as_ref()).await {
            Ok(poll) if !poll.is_terminal() => {
                if attempt == budget {
                    publisher.fail(&SearchError::FeedExhausted);
                    return;
                }
                tokio::time::sleep(interval).await;
            }
            Ok(poll) => {
                debug!(token = %token, attempt, "suggestion poll terminal");
                // Terminal payload replaces the text whole rather than
                // appending.
                let message = poll.message.unwrap_or_default();
                publisher.publish(|snap| {
                    snap.text = message;
                    snap.phase = FeedPhase::Done;
                });
                return;
            }
            Err(err) => {
                publisher.fail(&err);
                return;
            }
        }
    }
}
