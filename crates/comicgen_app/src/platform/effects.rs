use std::sync::mpsc;
use std::thread;

use comicgen_core::{
    Effect, Msg, Submission, SubmitFailure, TaskId, TaskResult, TaskState, TaskStatus, TaskSummary,
    VoiceEntry,
};
use comicgen_engine::{
    CreateTaskRequest, EngineEvent, EngineEvents, EngineHandle, HistoryEntry, StatusReport, Voice,
    WireResult, WireTaskState,
};
use comicgen_logging::{cg_debug, cg_info};

use super::app::AppInput;

/// Executes effects produced by `update` against the engine.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    /// Starts forwarding engine events into `msg_tx` as messages.
    pub fn new(engine: EngineHandle, events: EngineEvents, msg_tx: mpsc::Sender<AppInput>) -> Self {
        spawn_event_loop(events, msg_tx);
        Self { engine }
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadVoices => self.engine.list_voices(),
                Effect::CreateTask {
                    session,
                    submission,
                } => {
                    cg_info!(
                        "CreateTask session={} chars={}",
                        session,
                        submission.story_text.chars().count()
                    );
                    self.engine.create_task(session, create_request(submission));
                }
                Effect::StartPolling { session, interval } => {
                    cg_debug!("StartPolling session={} interval={:?}", session, interval);
                    self.engine.start_polling(session, interval);
                }
                Effect::FetchStatus { session, task_id } => {
                    self.engine.fetch_status(session, task_id.as_str());
                }
                Effect::StopPolling { session } => {
                    cg_debug!("StopPolling session={}", session);
                    self.engine.stop_polling(session);
                }
                Effect::DownloadVideo { url, filename } => {
                    cg_info!("DownloadVideo url={} filename={}", url, filename);
                    self.engine.download(url, filename);
                }
                Effect::ExpireNotice { id, after } => self.engine.expire_notice(id, after),
                Effect::LoadHistory => self.engine.list_history(),
            }
        }
    }
}

fn spawn_event_loop(events: EngineEvents, msg_tx: mpsc::Sender<AppInput>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if msg_tx.send(AppInput::Msg(event_to_msg(event))).is_err() {
                break;
            }
        }
    });
}

fn create_request(submission: Submission) -> CreateTaskRequest {
    CreateTaskRequest {
        story_text: submission.story_text,
        comic_style: submission.style,
        voice_name: submission.voice_id,
        use_transitions: submission.use_transitions,
        add_background_music: submission.add_background_music,
    }
}

fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::TaskCreated { session, result } => match result {
            Ok(task_id) => Msg::TaskCreated {
                session,
                task_id: TaskId::new(task_id),
            },
            Err(err) => Msg::TaskCreationFailed {
                session,
                failure: SubmitFailure {
                    message: err.server_message,
                },
            },
        },
        EngineEvent::StatusFetched { session, result } => match result {
            Ok(report) => Msg::StatusReceived {
                session,
                status: task_status(report),
            },
            Err(err) => Msg::StatusUnavailable {
                session,
                reason: err.to_string(),
            },
        },
        EngineEvent::PollTick { session } => Msg::PollTick { session },
        EngineEvent::VoicesListed(result) => Msg::VoicesLoaded(
            result
                .map(|voices| voices.into_iter().map(voice_entry).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::HistoryListed(result) => Msg::HistoryLoaded(
            result
                .map(|entries| entries.into_iter().map(task_summary).collect())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::DownloadFinished(result) => Msg::DownloadFinished(
            result
                .map(|path| path.display().to_string())
                .map_err(|err| err.to_string()),
        ),
        EngineEvent::NoticeExpired(id) => Msg::NoticeDismissed(id),
    }
}

fn task_status(report: StatusReport) -> TaskStatus {
    TaskStatus {
        state: match report.state {
            WireTaskState::Pending => TaskState::Pending,
            WireTaskState::Running => TaskState::Running,
            WireTaskState::Completed => TaskState::Completed,
            WireTaskState::Failed => TaskState::Failed,
        },
        progress: report.progress.unwrap_or(0.0),
        label: report.status,
        error: report.error,
        result: report.result.map(task_result),
    }
}

fn task_result(result: WireResult) -> TaskResult {
    TaskResult {
        video_url: result.video_url,
        thumbnail_url: result.thumbnail_url,
        filename: result.filename,
    }
}

fn task_summary(entry: HistoryEntry) -> TaskSummary {
    TaskSummary {
        task_id: TaskId::new(entry.task_id),
        text: entry.text,
        style: entry.style,
        status: entry.status,
        started_at: entry.start_time,
        // The backend reports 0 for tasks that have not finished.
        completed_at: (entry.completion_time > 0.0).then_some(entry.completion_time),
    }
}

fn voice_entry(voice: Voice) -> VoiceEntry {
    VoiceEntry {
        name: voice.name,
        display_name: voice.display_name,
        locale: voice.locale,
    }
}
