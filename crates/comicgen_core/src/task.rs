use std::fmt;

/// Client-side tag for one submission attempt and the polling session it
/// turns into. Every asynchronous response carries the id it was issued with.
pub type SessionId = u64;

/// Opaque task identifier assigned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskResult {
    pub video_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub filename: Option<String>,
}

/// One status report for the tracked task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskStatus {
    pub state: TaskState,
    pub progress: f64,
    pub label: Option<String>,
    pub error: Option<String>,
    pub result: Option<TaskResult>,
}

/// Last known view of the live task.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub state: TaskState,
    pub progress: f64,
    pub status_label: String,
    pub error: Option<String>,
    pub result: Option<TaskResult>,
}

impl Task {
    pub(crate) fn created(id: TaskId) -> Self {
        Self {
            id,
            state: TaskState::Pending,
            progress: 0.0,
            status_label: String::new(),
            error: None,
            result: None,
        }
    }

    pub(crate) fn apply(&mut self, status: &TaskStatus) {
        self.state = status.state;
        self.progress = clamp_progress(status.progress);
        self.status_label = status.label.clone().unwrap_or_default();
        self.error = status.error.clone();
        self.result = status.result.clone();
    }
}

/// Creation request rejected or unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitFailure {
    /// Server-provided message, surfaced verbatim when present.
    pub message: Option<String>,
}

/// One entry of the voice catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceEntry {
    pub name: String,
    pub display_name: String,
    pub locale: String,
}

/// One row of the backend's recent-task list.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub text: String,
    pub style: String,
    /// Backend status word: `processing`, `completed` or `failed`.
    pub status: String,
    /// Seconds since the Unix epoch.
    pub started_at: f64,
    pub completed_at: Option<f64>,
}

impl TaskSummary {
    /// Wall-clock seconds between start and completion, when completed.
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.completed_at
            .map(|done| (done - self.started_at).max(0.0))
    }
}

pub(crate) fn clamp_progress(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}
