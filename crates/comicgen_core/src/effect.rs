use std::time::Duration;

use crate::{NoticeId, SessionId, Submission, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LoadVoices,
    CreateTask {
        session: SessionId,
        submission: Submission,
    },
    /// Start the tick source for `session`, replacing any previous one.
    /// The first tick arrives one `interval` after start.
    StartPolling {
        session: SessionId,
        interval: Duration,
    },
    FetchStatus {
        session: SessionId,
        task_id: TaskId,
    },
    StopPolling {
        session: SessionId,
    },
    DownloadVideo {
        url: String,
        filename: String,
    },
    /// Answer with `Msg::NoticeDismissed(id)` once `after` has elapsed.
    ExpireNotice {
        id: NoticeId,
        after: Duration,
    },
    LoadHistory,
}
