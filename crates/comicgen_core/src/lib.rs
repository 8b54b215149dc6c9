//! Comicgen core: pure task-lifecycle state machine and view-model helpers.
mod effect;
mod input;
mod msg;
mod outcome;
mod state;
mod task;
mod update;
mod view_model;

pub use effect::Effect;
pub use input::{
    char_counter, CharCounter, FormInput, Submission, ValidationError, DEFAULT_MAX_STORY_CHARS,
    DEFAULT_STYLE, DEFAULT_VOICE, MIN_STORY_CHARS,
};
pub use msg::Msg;
pub use outcome::{render_outcome, InvalidResult, ResultView, DEFAULT_DOWNLOAD_FILENAME};
pub use state::{
    AppState, ControllerSettings, Notice, NoticeId, NoticeKind, Outcome, Phase, Severity,
    DEFAULT_NOTICE_TTL, DEFAULT_POLL_INTERVAL, FALLBACK_VOICE_LABEL, MAX_VISIBLE_NOTICES,
};
pub use task::{
    SessionId, SubmitFailure, Task, TaskId, TaskResult, TaskState, TaskStatus, TaskSummary,
    VoiceEntry,
};
pub use update::update;
pub use view_model::{
    AppViewModel, Focus, ProgressView, SubmitControl, VoiceOption, BUSY_LABEL, SUBMIT_LABEL,
};
