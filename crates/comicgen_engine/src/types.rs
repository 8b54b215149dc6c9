use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-side session tag echoed back on every event.
pub type SessionId = u64;

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub story_text: String,
    pub comic_style: String,
    pub voice_name: String,
    pub use_transitions: bool,
    pub add_background_music: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CreateTaskResponse {
    pub(crate) task_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireTaskState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// Body of `GET /api/status/{task_id}`. Absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub state: WireTaskState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<WireResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct WireResult {
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct VoiceList {
    #[serde(default)]
    pub(crate) voices: Vec<Voice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Voice {
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub locale: String,
}

/// One element of `GET /api/history`, newest first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub task_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub status: String,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub start_time: f64,
    /// `0` until the task completes.
    #[serde(default)]
    pub completion_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    TaskCreated {
        session: SessionId,
        result: Result<String, ApiError>,
    },
    StatusFetched {
        session: SessionId,
        result: Result<StatusReport, ApiError>,
    },
    PollTick {
        session: SessionId,
    },
    VoicesListed(Result<Vec<Voice>, ApiError>),
    HistoryListed(Result<Vec<HistoryEntry>, ApiError>),
    DownloadFinished(Result<PathBuf, ApiError>),
    /// Display time of the notice with this id ran out.
    NoticeExpired(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    /// `error` field of the response body, when the backend sent one.
    pub server_message: Option<String>,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            server_message: None,
        }
    }

    pub fn with_server_message(mut self, server_message: Option<String>) -> Self {
        self.server_message = server_message.filter(|m| !m.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Persist,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Persist => write!(f, "could not save file"),
        }
    }
}
