//! Search service access.
//!
//! [`SearchBackend`] is the seam between the controllers and the wire:
//! production code uses the reqwest-backed [`HttpSearchClient`], tests
//! substitute in-process fakes. Search and poll requests carry the
//! configured hard timeout; the push channel intentionally carries none and
//! relies on the server's explicit close signaling.

pub mod sse;

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::SearchError;
use crate::identity::DeviceId;
use crate::models::{PushEvent, SearchResponse, SuggestionPoll};
use sse::SseDecoder;

/// Ordered events of one suggestion push channel.
pub type FeedStream = Pin<Box<dyn Stream<Item = Result<PushEvent, SearchError>> + Send>>;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run a search. `Ok(None)` is the moderated-query condition: a
    /// successful response that deliberately carries no payload.
    async fn search(
        &self,
        query: &str,
        limit: u32,
        user: Option<&DeviceId>,
    ) -> Result<Option<SearchResponse>, SearchError>;

    /// Open the push channel for a suggestion token.
    async fn open_feed(
        &self,
        token: &str,
        user: Option<&DeviceId>,
    ) -> Result<FeedStream, SearchError>;

    /// Fetch the suggestion job status once.
    async fn poll_feed(
        &self,
        token: &str,
        user: Option<&DeviceId>,
    ) -> Result<SuggestionPoll, SearchError>;
}

pub struct HttpSearchClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl HttpSearchClient {
    pub fn new(config: &ClientConfig) -> Result<Self, SearchError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| SearchError::Network(err.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: config.request_timeout,
        })
    }

    fn suggestion_url(&self, token: &str) -> String {
        format!("{}/suggestion/{token}", self.base_url)
    }
}

fn transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Network(format!("request timed out: {err}"))
    } else {
        SearchError::Network(err.to_string())
    }
}

async fn service_error(response: reqwest::Response) -> SearchError {
    let status = response.status();
    let message = response
        .text()
        .await
        .ok()
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
    SearchError::Service { code: status.as_u16().to_string(), message }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        user: Option<&DeviceId>,
    ) -> Result<Option<SearchResponse>, SearchError> {
        let mut request = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[("query", query)])
            .query(&[("limit", limit)])
            .timeout(self.request_timeout);
        if let Some(user) = user {
            request = request.query(&[("user", user.as_str())]);
        }

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let body = response.bytes().await.map_err(transport_error)?;
        if body.is_empty() {
            debug!(query, "search returned no payload (moderated)");
            return Ok(None);
        }
        let parsed = serde_json::from_slice(&body).map_err(|err| SearchError::Service {
            code: "bad_payload".to_string(),
            message: err.to_string(),
        })?;
        Ok(Some(parsed))
    }

    async fn open_feed(
        &self,
        token: &str,
        user: Option<&DeviceId>,
    ) -> Result<FeedStream, SearchError> {
        // No request timeout here: the channel stays open until the server
        // sends its close event.
        let mut request = self
            .http
            .get(self.suggestion_url(token))
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(user) = user {
            request = request.query(&[("user", user.as_str())]);
        }

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let events: Vec<Result<PushEvent, SearchError>> = match chunk {
                    Ok(bytes) => decoder.feed(&bytes).into_iter().map(Ok).collect(),
                    Err(err) => vec![Err(transport_error(err))],
                };
                futures::future::ready(Some(events))
            })
            .flat_map(|events| futures::stream::iter(events));
        Ok(Box::pin(stream))
    }

    async fn poll_feed(
        &self,
        token: &str,
        user: Option<&DeviceId>,
    ) -> Result<SuggestionPoll, SearchError> {
        let mut request = self.http.get(self.suggestion_url(token)).timeout(self.request_timeout);
        if let Some(user) = user {
            request = request.query(&[("user", user.as_str())]);
        }

        let response = request.send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }
        response.json().await.map_err(transport_error)
    }
}
