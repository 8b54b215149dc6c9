use comicgen_logging::{cg_debug, cg_info, cg_warn};

use crate::outcome::render_outcome;
use crate::state::Activity;
use crate::{
    AppState, Effect, Msg, NoticeKind, Outcome, Severity, SessionId, Submission, SubmitFailure,
    TaskState, TaskStatus, ValidationError,
};

const SUBMIT_FALLBACK: &str = "Generation request failed";
const TASK_FAILED_FALLBACK: &str = "unknown error";
const STATUS_UNAVAILABLE: &str = "Unable to fetch task status";
const INVALID_RESULT: &str = "Generation result is invalid";
const HISTORY_UNAVAILABLE: &str = "Unable to load task history";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let last_notice = state.last_notice_id();
    let mut effects = apply(&mut state, msg);

    if let Some(after) = state.settings().notice_ttl {
        effects.extend(
            state
                .notices_after(last_notice)
                .map(|id| Effect::ExpireNotice { id, after }),
        );
    }
    (state, effects)
}

fn apply(state: &mut AppState, msg: Msg) -> Vec<Effect> {
    match msg {
        Msg::Started => vec![Effect::LoadVoices],
        Msg::StoryTextChanged(text) => {
            state.form_mut().story_text = text;
            Vec::new()
        }
        Msg::StyleChanged(style) => {
            state.form_mut().style = style;
            Vec::new()
        }
        Msg::VoiceChanged(voice) => {
            state.form_mut().voice_id = voice;
            Vec::new()
        }
        Msg::TransitionsToggled(on) => {
            state.form_mut().use_transitions = on;
            Vec::new()
        }
        Msg::BackgroundMusicToggled(on) => {
            state.form_mut().add_background_music = on;
            Vec::new()
        }
        Msg::SubmitClicked => submit(state),
        Msg::TaskCreated { session, task_id } => {
            if !state.is_submitting(session) {
                cg_debug!("Discarding creation response for superseded session {session}");
                return Vec::new();
            }
            cg_info!("Task {task_id} created for session {session}");
            let interval = state.settings().poll_interval;
            state.begin_polling(session, task_id.clone());
            vec![
                Effect::StartPolling { session, interval },
                Effect::FetchStatus { session, task_id },
            ]
        }
        Msg::TaskCreationFailed { session, failure } => {
            if !state.is_submitting(session) {
                cg_debug!("Discarding creation failure for superseded session {session}");
                return Vec::new();
            }
            creation_failed(state, failure);
            Vec::new()
        }
        Msg::PollTick { session } => match state.polling_mut(session) {
            Some(polling) if !polling.fetch_in_flight => {
                polling.fetch_in_flight = true;
                vec![Effect::FetchStatus {
                    session,
                    task_id: polling.task_id.clone(),
                }]
            }
            Some(_) => {
                cg_debug!("Status check for session {session} still in flight; skipping tick");
                Vec::new()
            }
            None => Vec::new(),
        },
        Msg::StatusReceived { session, status } => status_received(state, session, status),
        Msg::StatusUnavailable { session, reason } => {
            status_unavailable(state, session, &reason)
        }
        Msg::ResetClicked => {
            let stopped = state.end_session();
            state.reset_surfaces();
            stopped
                .map(|session| vec![Effect::StopPolling { session }])
                .unwrap_or_default()
        }
        Msg::VoicesLoaded(result) => {
            let entries = result.unwrap_or_else(|reason| {
                cg_warn!("Voice catalog unavailable: {reason}");
                Vec::new()
            });
            state.set_voices(entries);
            Vec::new()
        }
        Msg::DownloadClicked => {
            let Some(result) = state.result().cloned() else {
                return Vec::new();
            };
            if state.set_download_in_flight(true) {
                return Vec::new();
            }
            vec![Effect::DownloadVideo {
                url: result.download_url,
                filename: result.download_filename,
            }]
        }
        Msg::DownloadFinished(result) => {
            state.set_download_in_flight(false);
            match result {
                Ok(path) => state.push_notice(
                    NoticeKind::Download,
                    Severity::Info,
                    format!("Saved video to {path}"),
                ),
                Err(reason) => state.push_notice(
                    NoticeKind::Download,
                    Severity::Danger,
                    format!("Download failed: {reason}"),
                ),
            }
            Vec::new()
        }
        Msg::NoticeDismissed(id) => {
            state.dismiss_notice(id);
            Vec::new()
        }
        Msg::HistoryRequested => {
            state.clear_history();
            vec![Effect::LoadHistory]
        }
        Msg::HistoryLoaded(Ok(entries)) => {
            cg_debug!("Loaded {} history entries", entries.len());
            state.set_history(entries);
            Vec::new()
        }
        Msg::HistoryLoaded(Err(reason)) => {
            cg_warn!("Task history unavailable: {reason}");
            state.push_notice(NoticeKind::History, Severity::Warning, HISTORY_UNAVAILABLE);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    }
}

fn submit(state: &mut AppState) -> Vec<Effect> {
    if !matches!(state.activity(), Activity::Idle) {
        // The control is disabled while a session is live.
        return Vec::new();
    }

    let mut form = state.form().clone();
    form.voice_id = state.effective_voice();
    let submission = match Submission::from_form(&form) {
        Ok(submission) => submission,
        Err(ValidationError::StoryTooShort { min, .. }) => {
            state.push_notice(
                NoticeKind::Validation,
                Severity::Danger,
                format!("Please enter at least {min} characters of story text"),
            );
            return Vec::new();
        }
    };

    let session = state.begin_submission();
    cg_info!(
        "Submitting session {session}: style={} voice={} chars={}",
        submission.style,
        submission.voice_id,
        submission.story_text.chars().count()
    );
    vec![Effect::CreateTask {
        session,
        submission,
    }]
}

fn creation_failed(state: &mut AppState, failure: SubmitFailure) {
    let message = failure
        .message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| SUBMIT_FALLBACK.to_string());
    cg_warn!("Creation request failed: {message}");
    state.end_session();
    state.hide_progress();
    state.set_outcome(Outcome::SubmissionFailed);
    state.push_notice(NoticeKind::SubmissionFailure, Severity::Danger, message);
}

fn status_received(state: &mut AppState, session: SessionId, status: TaskStatus) -> Vec<Effect> {
    let Some(polling) = state.polling_mut(session) else {
        cg_debug!("Discarding status for superseded session {session}");
        return Vec::new();
    };
    polling.fetch_in_flight = false;
    polling.consecutive_failures = 0;

    state.apply_status(&status);
    if !status.state.is_terminal() {
        return Vec::new();
    }

    state.end_session();
    let stop = vec![Effect::StopPolling { session }];
    if status.state == TaskState::Failed {
        let reason = status
            .error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(TASK_FAILED_FALLBACK);
        cg_warn!("Task failed in session {session}: {reason}");
        state.set_outcome(Outcome::TaskFailed);
        state.push_notice(
            NoticeKind::TaskFailure,
            Severity::Danger,
            format!("Generation failed: {reason}"),
        );
        return stop;
    }

    match render_outcome(status.result.as_ref()) {
        Ok(view) => {
            cg_info!("Task completed in session {session}: {}", view.video_url);
            state.set_outcome(Outcome::Completed);
            state.show_result(view);
        }
        Err(_) => {
            cg_warn!("Task completed in session {session} without a video url");
            state.set_outcome(Outcome::InvalidResult);
            state.push_notice(NoticeKind::InvalidResult, Severity::Danger, INVALID_RESULT);
        }
    }
    stop
}

fn status_unavailable(state: &mut AppState, session: SessionId, reason: &str) -> Vec<Effect> {
    let max_failures = state.settings().max_consecutive_poll_failures.max(1);
    let Some(polling) = state.polling_mut(session) else {
        cg_debug!("Discarding status failure for superseded session {session}");
        return Vec::new();
    };
    polling.fetch_in_flight = false;
    polling.consecutive_failures += 1;
    let failures = polling.consecutive_failures;

    if failures < max_failures {
        cg_warn!("Status check failed ({failures}/{max_failures}) for session {session}: {reason}");
        return Vec::new();
    }

    cg_warn!("Giving up on session {session} after {failures} failed status checks: {reason}");
    state.end_session();
    state.set_outcome(Outcome::StatusUnavailable);
    state.push_notice(
        NoticeKind::StatusUnavailable,
        Severity::Warning,
        STATUS_UNAVAILABLE,
    );
    vec![Effect::StopPolling { session }]
}
