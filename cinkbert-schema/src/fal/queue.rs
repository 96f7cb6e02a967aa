use serde::{Deserialize, Serialize};

/// Returned by `POST {queue_url}/{endpoint}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalQueueSubmission {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FalQueueState {
    InQueue,
    InProgress,
    Completed,
}

/// Returned by `GET {status_url}`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalQueueStatus {
    pub status: FalQueueState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<FalLogEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    /// Set on `COMPLETED` when the job ended in an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FalQueueStatus {
    pub fn is_completed(&self) -> bool {
        self.status == FalQueueState::Completed
    }

    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn log_messages(&self) -> impl Iterator<Item = &str> {
        self.logs
            .iter()
            .flatten()
            .map(|entry| entry.message.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FalLogEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}
