/// Tests for the suggestion feed controller: fragment accumulation, clean
/// and abnormal channel closes, token supersession, cancellation, and the
/// bounded polling fallback.
mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{FakeBackend, wait_for};
use workshop_search_client::{
    ClientConfig, FeedPhase, PushEvent, SearchError, SuggestionFeedController, SuggestionPoll,
    SuggestionStatus, TransportMode,
};

fn push_controller(backend: Arc<FakeBackend>) -> SuggestionFeedController {
    SuggestionFeedController::new(backend, None, &ClientConfig::default())
}

fn poll_controller(backend: Arc<FakeBackend>) -> SuggestionFeedController {
    let config = ClientConfig { transport: TransportMode::Poll, ..ClientConfig::default() };
    SuggestionFeedController::new(backend, None, &config)
}

#[tokio::test]
async fn test_fragments_accumulate_in_arrival_order() {
    let backend = Arc::new(FakeBackend::new());
    backend.script_static_feed(
        "tok",
        vec![
            Ok(PushEvent::Fragment("Azure ".to_string())),
            Ok(PushEvent::Fragment("Functions is…".to_string())),
            Ok(PushEvent::Closed),
        ],
    );
    let mut feed = push_controller(backend);
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Done).await;
    assert_eq!(snap.text, "Azure Functions is…");
    assert_eq!(snap.error, None);
}

#[tokio::test]
async fn test_duplicate_fragments_are_kept() {
    let backend = Arc::new(FakeBackend::new());
    backend.script_static_feed(
        "tok",
        vec![
            Ok(PushEvent::Fragment("la ".to_string())),
            Ok(PushEvent::Fragment("la ".to_string())),
            Ok(PushEvent::Closed),
        ],
    );
    let mut feed = push_controller(backend);
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Done).await;
    assert_eq!(snap.text, "la la ");
}

#[tokio::test]
async fn test_channel_end_without_close_is_abnormal() {
    let backend = Arc::new(FakeBackend::new());
    backend.script_static_feed("tok", vec![Ok(PushEvent::Fragment("partial".to_string()))]);
    let mut feed = push_controller(backend);
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Failed).await;
    // accumulated text freezes at the failure point
    assert_eq!(snap.text, "partial");
    assert_eq!(snap.error.unwrap().code, "feed_closed");
}

#[tokio::test]
async fn test_transport_error_fails_the_feed() {
    let backend = Arc::new(FakeBackend::new());
    backend.script_static_feed("tok", vec![Err(SearchError::Network("reset".to_string()))]);
    let mut feed = push_controller(backend);
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Failed).await;
    assert_eq!(snap.error.unwrap().code, "network_failure");
}

#[tokio::test]
async fn test_new_token_supersedes_old_feed() {
    let backend = Arc::new(FakeBackend::new());
    let feed_a = backend.script_live_feed("tok-a");
    let feed_b = backend.script_live_feed("tok-b");
    let mut feed = push_controller(backend);
    let mut rx = feed.subscribe();

    feed.start("tok-a");
    feed_a.send(Ok(PushEvent::Fragment("alpha ".to_string()))).unwrap();
    wait_for(&mut rx, |s| s.text == "alpha ").await;

    feed.start("tok-b");
    // a late fragment from the superseded feed must never surface
    let _ = feed_a.send(Ok(PushEvent::Fragment("ghost".to_string())));
    feed_b.send(Ok(PushEvent::Fragment("beta".to_string()))).unwrap();
    feed_b.send(Ok(PushEvent::Closed)).unwrap();

    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Done).await;
    assert_eq!(snap.token.as_deref(), Some("tok-b"));
    assert_eq!(snap.text, "beta");
}

#[tokio::test]
async fn test_cancel_emits_no_further_changes() {
    let backend = Arc::new(FakeBackend::new());
    let live = backend.script_live_feed("tok");
    let mut feed = push_controller(backend);
    let mut rx = feed.subscribe();

    feed.start("tok");
    live.send(Ok(PushEvent::Fragment("before".to_string()))).unwrap();
    wait_for(&mut rx, |s| s.text == "before").await;

    feed.cancel();
    let _ = live.send(Ok(PushEvent::Fragment("after".to_string())));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snap = feed.snapshot();
    assert_eq!(snap.phase, FeedPhase::Idle);
    assert_eq!(snap.token, None);
    assert!(snap.text.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poll_terminal_payload_replaces_text() {
    let backend = Arc::new(FakeBackend::new());
    backend.script_poll(SuggestionPoll { status: SuggestionStatus::InProgress, message: None });
    backend.script_poll(SuggestionPoll {
        status: SuggestionStatus::Success,
        message: Some("final suggestion".to_string()),
    });
    let mut feed = poll_controller(backend.clone());
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Done).await;
    assert_eq!(snap.text, "final suggestion");
    assert_eq!(snap.attempt, 2);
    assert_eq!(backend.poll_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_poll_budget_exhausts_after_sixty_attempts() {
    // the fake reports in_progress forever; the loop must stop at 60
    let backend = Arc::new(FakeBackend::new());
    let mut feed = poll_controller(backend.clone());
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Failed).await;
    assert_eq!(snap.attempt, 60);
    assert_eq!(backend.poll_calls.load(Ordering::SeqCst), 60);
    assert_eq!(snap.error.unwrap().code, "feed_exhausted");
}

#[tokio::test(start_paused = true)]
async fn test_poll_failure_status_is_still_terminal() {
    let backend = Arc::new(FakeBackend::new());
    backend.script_poll(SuggestionPoll {
        status: SuggestionStatus::Fail,
        message: Some("generation failed".to_string()),
    });
    let mut feed = poll_controller(backend.clone());
    let mut rx = feed.subscribe();

    feed.start("tok");
    let snap = wait_for(&mut rx, |s| s.phase == FeedPhase::Done).await;
    assert_eq!(snap.text, "generation failed");
    assert_eq!(backend.poll_calls.load(Ordering::SeqCst), 1);
}
