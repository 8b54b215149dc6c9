use crate::{NoticeId, SessionId, SubmitFailure, TaskId, TaskStatus, TaskSummary, VoiceEntry};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Front end is up; kicks off the voice catalog lookup.
    Started,
    /// User edited the story text.
    StoryTextChanged(String),
    /// User picked a comic style.
    StyleChanged(String),
    /// User picked a narration voice.
    VoiceChanged(String),
    TransitionsToggled(bool),
    BackgroundMusicToggled(bool),
    /// User pressed the submit control.
    SubmitClicked,
    /// Backend accepted the creation request.
    TaskCreated { session: SessionId, task_id: TaskId },
    /// Creation request rejected or unreachable.
    TaskCreationFailed {
        session: SessionId,
        failure: SubmitFailure,
    },
    /// Polling timer fired.
    PollTick { session: SessionId },
    /// Status fetch returned a report.
    StatusReceived {
        session: SessionId,
        status: TaskStatus,
    },
    /// Status fetch failed at the transport level.
    StatusUnavailable { session: SessionId, reason: String },
    /// User asked for a fresh form.
    ResetClicked,
    /// Voice catalog lookup finished.
    VoicesLoaded(Result<Vec<VoiceEntry>, String>),
    /// User asked to save the rendered video locally.
    DownloadClicked,
    /// Local save finished; `Ok` carries the written path.
    DownloadFinished(Result<String, String>),
    /// User closed a notice, or its display time ran out.
    NoticeDismissed(NoticeId),
    /// User asked for the recent-task list.
    HistoryRequested,
    HistoryLoaded(Result<Vec<TaskSummary>, String>),
    /// Fallback for placeholder wiring.
    NoOp,
}
