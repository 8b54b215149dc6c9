use std::time::Duration;

use crate::input::{char_counter, FormInput, DEFAULT_MAX_STORY_CHARS, DEFAULT_VOICE};
use crate::outcome::ResultView;
use crate::task::clamp_progress;
use crate::view_model::{
    AppViewModel, Focus, ProgressView, SubmitControl, VoiceOption, BUSY_LABEL, SUBMIT_LABEL,
};
use crate::{SessionId, Task, TaskId, TaskSummary, VoiceEntry};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(3000);
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(5000);
/// Oldest notices are dropped once this many are shown.
pub const MAX_VISIBLE_NOTICES: usize = 5;
pub const FALLBACK_VOICE_LABEL: &str = "Xiaoxiao (zh-CN)";

pub type NoticeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    pub max_story_chars: usize,
    pub poll_interval: Duration,
    /// Consecutive status transport failures tolerated before polling stops.
    /// `1` stops on the first failure.
    pub max_consecutive_poll_failures: u32,
    /// How long a notice stays up before it closes itself. `None` keeps
    /// notices until dismissed.
    pub notice_ttl: Option<Duration>,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_story_chars: DEFAULT_MAX_STORY_CHARS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_consecutive_poll_failures: 1,
            notice_ttl: Some(DEFAULT_NOTICE_TTL),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    Pending,
}

/// How the last attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    SubmissionFailed,
    TaskFailed,
    StatusUnavailable,
    InvalidResult,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Validation,
    SubmissionFailure,
    TaskFailure,
    StatusUnavailable,
    InvalidResult,
    Download,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PollingSession {
    pub(crate) id: SessionId,
    pub(crate) task_id: TaskId,
    pub(crate) fetch_in_flight: bool,
    pub(crate) consecutive_failures: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) enum Activity {
    #[default]
    Idle,
    Submitting {
        session: SessionId,
    },
    Polling(PollingSession),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    settings: ControllerSettings,
    form: FormInput,
    activity: Activity,
    next_session: SessionId,
    task: Option<Task>,
    progress: Option<ProgressView>,
    result: Option<ResultView>,
    outcome: Option<Outcome>,
    notices: Vec<Notice>,
    next_notice: NoticeId,
    voices: Option<Vec<VoiceOption>>,
    history: Option<Vec<TaskSummary>>,
    download_in_flight: bool,
    focus: Focus,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: ControllerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        match self.activity {
            Activity::Idle => Phase::Idle,
            Activity::Submitting { .. } => Phase::Submitting,
            Activity::Polling(_) => Phase::Pending,
        }
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Session whose responses are currently accepted, if any.
    pub fn current_session(&self) -> Option<SessionId> {
        match &self.activity {
            Activity::Idle => None,
            Activity::Submitting { session } => Some(*session),
            Activity::Polling(polling) => Some(polling.id),
        }
    }

    pub fn view(&self) -> AppViewModel {
        let busy = !matches!(self.activity, Activity::Idle);
        AppViewModel {
            phase: self.phase(),
            form: self.form.clone(),
            counter: char_counter(&self.form.story_text, self.settings.max_story_chars),
            submit: SubmitControl {
                enabled: !busy,
                label: if busy { BUSY_LABEL } else { SUBMIT_LABEL },
            },
            progress: self.progress.clone(),
            task_id: self.task.as_ref().map(|task| task.id.clone()),
            result: self.result.clone(),
            outcome: self.outcome,
            notices: self.notices.clone(),
            voices: self.voices.clone(),
            selected_voice: self.effective_voice(),
            history: self.history.clone(),
            focus: self.focus,
        }
    }

    /// Voice a submission would use: the typed one, else the default voice
    /// when the catalog offers it (or has not loaded), else the first entry.
    pub(crate) fn effective_voice(&self) -> String {
        let typed = self.form.voice_id.trim();
        if !typed.is_empty() {
            return typed.to_string();
        }
        match &self.voices {
            Some(options) if !options.iter().any(|o| o.value == DEFAULT_VOICE) => options
                .first()
                .map(|o| o.value.clone())
                .unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            _ => DEFAULT_VOICE.to_string(),
        }
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn form_mut(&mut self) -> &mut FormInput {
        self.mark_dirty();
        &mut self.form
    }

    pub(crate) fn form(&self) -> &FormInput {
        &self.form
    }

    pub(crate) fn activity(&self) -> &Activity {
        &self.activity
    }

    pub(crate) fn polling_mut(&mut self, session: SessionId) -> Option<&mut PollingSession> {
        match &mut self.activity {
            Activity::Polling(polling) if polling.id == session => Some(polling),
            _ => None,
        }
    }

    pub(crate) fn is_submitting(&self, session: SessionId) -> bool {
        matches!(self.activity, Activity::Submitting { session: current } if current == session)
    }

    pub(crate) fn begin_submission(&mut self) -> SessionId {
        self.next_session += 1;
        let session = self.next_session;
        self.activity = Activity::Submitting { session };
        self.task = None;
        self.result = None;
        self.outcome = None;
        self.progress = Some(ProgressView::new(0.0, Some("Initializing...")));
        self.mark_dirty();
        session
    }

    pub(crate) fn begin_polling(&mut self, session: SessionId, task_id: TaskId) {
        self.task = Some(Task::created(task_id.clone()));
        self.activity = Activity::Polling(PollingSession {
            id: session,
            task_id,
            // The immediate first check is dispatched together with the ticker.
            fetch_in_flight: true,
            consecutive_failures: 0,
        });
        self.mark_dirty();
    }

    /// Drops the active submission or polling session, returning the polling
    /// session id that needs its ticker stopped.
    pub(crate) fn end_session(&mut self) -> Option<SessionId> {
        let stopped = match std::mem::take(&mut self.activity) {
            Activity::Polling(polling) => Some(polling.id),
            Activity::Idle | Activity::Submitting { .. } => None,
        };
        self.mark_dirty();
        stopped
    }

    pub(crate) fn apply_status(&mut self, status: &crate::TaskStatus) {
        if let Some(task) = self.task.as_mut() {
            task.apply(status);
        }
        self.progress = Some(ProgressView::new(
            clamp_progress(status.progress),
            status.label.as_deref(),
        ));
        self.mark_dirty();
    }

    pub(crate) fn hide_progress(&mut self) {
        self.progress = None;
        self.mark_dirty();
    }

    pub(crate) fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn show_result(&mut self, view: ResultView) {
        self.result = Some(view);
        self.focus = Focus::Result;
        self.mark_dirty();
    }

    pub(crate) fn result(&self) -> Option<&ResultView> {
        self.result.as_ref()
    }

    pub(crate) fn push_notice(
        &mut self,
        kind: NoticeKind,
        severity: Severity,
        message: impl Into<String>,
    ) {
        self.next_notice += 1;
        self.notices.push(Notice {
            id: self.next_notice,
            kind,
            severity,
            message: message.into(),
        });
        if self.notices.len() > MAX_VISIBLE_NOTICES {
            let excess = self.notices.len() - MAX_VISIBLE_NOTICES;
            self.notices.drain(..excess);
        }
        self.mark_dirty();
    }

    pub(crate) fn last_notice_id(&self) -> NoticeId {
        self.next_notice
    }

    /// Ids of notices pushed after `since` that are still shown.
    pub(crate) fn notices_after(&self, since: NoticeId) -> impl Iterator<Item = NoticeId> + '_ {
        self.notices
            .iter()
            .map(|notice| notice.id)
            .filter(move |id| *id > since)
    }

    pub(crate) fn dismiss_notice(&mut self, id: NoticeId) {
        let before = self.notices.len();
        self.notices.retain(|notice| notice.id != id);
        if self.notices.len() != before {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_voices(&mut self, entries: Vec<VoiceEntry>) {
        let options = if entries.is_empty() {
            vec![fallback_voice()]
        } else {
            entries
                .into_iter()
                .map(|entry| VoiceOption {
                    label: format!("{} ({})", entry.display_name, entry.locale),
                    value: entry.name,
                })
                .collect()
        };
        self.voices = Some(options);
        self.mark_dirty();
    }

    pub(crate) fn clear_history(&mut self) {
        self.history = None;
        self.mark_dirty();
    }

    pub(crate) fn set_history(&mut self, entries: Vec<TaskSummary>) {
        self.history = Some(entries);
        self.mark_dirty();
    }

    pub(crate) fn set_download_in_flight(&mut self, in_flight: bool) -> bool {
        std::mem::replace(&mut self.download_in_flight, in_flight)
    }

    /// Everything a fresh page shows except the notices, the voice catalog and
    /// the task history.
    pub(crate) fn reset_surfaces(&mut self) {
        self.form = FormInput::default();
        self.task = None;
        self.progress = None;
        self.result = None;
        self.outcome = None;
        self.focus = Focus::Input;
        self.mark_dirty();
    }
}

pub(crate) fn fallback_voice() -> VoiceOption {
    VoiceOption {
        value: DEFAULT_VOICE.to_string(),
        label: FALLBACK_VOICE_LABEL.to_string(),
    }
}
