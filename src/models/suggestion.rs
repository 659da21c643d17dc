use serde::{Deserialize, Serialize};

/// Job status reported by the suggestion polling endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    InProgress,
    Success,
    Fail,
    #[serde(other)]
    Unknown,
}

/// Body of the suggestion polling endpoint.
///
/// Any status other than `in_progress` is terminal and carries the final
/// message (possibly empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionPoll {
    pub status: SuggestionStatus,
    #[serde(default)]
    pub message: Option<String>,
}

impl SuggestionPoll {
    pub fn is_terminal(&self) -> bool {
        self.status != SuggestionStatus::InProgress
    }
}

/// Event delivered by the suggestion push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Incremental text to append verbatim to the accumulated suggestion.
    Fragment(String),
    /// Remote-initiated clean completion.
    Closed,
}
