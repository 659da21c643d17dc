//! Client configuration: service endpoint, timeouts and transport choice.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// How the suggestion feed talks to the service.
///
/// Decided once at startup; the feed controller never switches modes
/// between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Server-sent events push channel.
    #[default]
    Push,
    /// Bounded 1 Hz polling of the job status resource.
    Poll,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the search service.
    pub base_url: String,
    /// Hard timeout for search and poll requests.
    pub request_timeout: Duration,
    /// Result count requested per search.
    pub result_limit: u32,
    /// Delay between suggestion poll attempts.
    pub poll_interval: Duration,
    /// Maximum number of suggestion poll attempts per token.
    pub poll_budget: u32,
    pub transport: TransportMode,
    /// Directory for locally persisted state; platform data dir when `None`.
    pub data_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8081".to_string(),
            request_timeout: Duration::from_secs(30),
            result_limit: 10,
            poll_interval: Duration::from_secs(1),
            poll_budget: 60,
            transport: TransportMode::default(),
            data_dir: None,
        }
    }
}

impl ClientConfig {
    /// Build a config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `WORKSHOP_SEARCH_API_BASE`,
    /// `WORKSHOP_SEARCH_TRANSPORT` (`push` | `poll`),
    /// `WORKSHOP_SEARCH_DATA_DIR`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = env::var("WORKSHOP_SEARCH_API_BASE") {
            cfg.base_url = base;
        }
        if let Ok(mode) = env::var("WORKSHOP_SEARCH_TRANSPORT") {
            if mode.eq_ignore_ascii_case("poll") {
                cfg.transport = TransportMode::Poll;
            } else if mode.eq_ignore_ascii_case("push") {
                cfg.transport = TransportMode::Push;
            }
        }
        if let Ok(dir) = env::var("WORKSHOP_SEARCH_DATA_DIR") {
            cfg.data_dir = Some(PathBuf::from(dir));
        }
        cfg
    }
}
