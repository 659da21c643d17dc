use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workshop metadata attached to a search answer.
///
/// The list fields are absent on older servers, so they default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub url: String,
    pub description: String,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub audience: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAnswer {
    #[serde(default)]
    pub id: String,
    pub metadata: Metadata,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub total: u64,
    pub time: f64,
}

/// Successful body of `GET /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub answers: Vec<SearchAnswer>,
    #[serde(default)]
    pub query: String,
    pub stats: SearchStats,
    #[serde(default)]
    pub suggestion_token: String,
}
