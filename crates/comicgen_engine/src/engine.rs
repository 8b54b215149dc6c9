use std::io;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use comicgen_logging::{cg_debug, cg_info, cg_warn};
use thiserror::Error;

use crate::client::{ApiSettings, JobApi, ReqwestJobApi};
use crate::persist::AtomicFileWriter;
use crate::poller::TickerSlot;
use crate::{ApiError, CreateTaskRequest, EngineEvent, FailureKind, SessionId};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub api: ApiSettings,
    pub download_dir: PathBuf,
}

impl EngineConfig {
    pub fn default_with_download_dir(download_dir: PathBuf) -> Self {
        Self {
            api: ApiSettings::default(),
            download_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build engine runtime: {0}")]
    Runtime(#[from] io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] ApiError),
}

enum EngineCommand {
    Request(ApiRequest),
    StartPolling {
        session: SessionId,
        interval: Duration,
    },
    StopPolling {
        session: SessionId,
    },
    ExpireNotice {
        id: u64,
        after: Duration,
    },
}

/// Commands that run as tasks on the runtime and answer with one event.
enum ApiRequest {
    CreateTask {
        session: SessionId,
        request: CreateTaskRequest,
    },
    FetchStatus {
        session: SessionId,
        task_id: String,
    },
    ListVoices,
    ListHistory,
    Download {
        url: String,
        filename: String,
    },
}

/// Sends commands to the engine thread. Cheap to clone; the engine shuts
/// down once every handle is dropped.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Receiving side of the engine's event stream.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineEvents {
    /// Blocks until the next event; `None` once the engine is gone.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<(Self, EngineEvents), EngineError> {
        let api = Arc::new(ReqwestJobApi::new(config.api)?);
        Self::with_api(api, config.download_dir)
    }

    /// Runs the engine against any backend implementation.
    pub fn with_api(
        api: Arc<dyn JobApi>,
        download_dir: PathBuf,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            let mut ticker = TickerSlot::default();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling { session, interval } => {
                        ticker.start(runtime.handle(), session, interval, event_tx.clone());
                    }
                    EngineCommand::StopPolling { session } => {
                        if !ticker.stop(session) {
                            cg_debug!("No poll ticker running for session {session}");
                        }
                    }
                    EngineCommand::ExpireNotice { id, after } => {
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            tokio::time::sleep(after).await;
                            let _ = event_tx.send(EngineEvent::NoticeExpired(id));
                        });
                    }
                    EngineCommand::Request(request) => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        let download_dir = download_dir.clone();
                        runtime.spawn(async move {
                            let event = handle_request(api.as_ref(), request, &download_dir).await;
                            let _ = event_tx.send(event);
                        });
                    }
                }
            }
            cg_debug!("Engine command channel closed; shutting down");
        });

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    pub fn create_task(&self, session: SessionId, request: CreateTaskRequest) {
        self.send(EngineCommand::Request(ApiRequest::CreateTask { session, request }));
    }

    pub fn fetch_status(&self, session: SessionId, task_id: impl Into<String>) {
        self.send(EngineCommand::Request(ApiRequest::FetchStatus {
            session,
            task_id: task_id.into(),
        }));
    }

    pub fn start_polling(&self, session: SessionId, interval: Duration) {
        self.send(EngineCommand::StartPolling { session, interval });
    }

    pub fn stop_polling(&self, session: SessionId) {
        self.send(EngineCommand::StopPolling { session });
    }

    pub fn list_voices(&self) {
        self.send(EngineCommand::Request(ApiRequest::ListVoices));
    }

    pub fn list_history(&self) {
        self.send(EngineCommand::Request(ApiRequest::ListHistory));
    }

    /// Emits `EngineEvent::NoticeExpired(id)` once `after` has elapsed.
    pub fn expire_notice(&self, id: u64, after: Duration) {
        self.send(EngineCommand::ExpireNotice { id, after });
    }

    pub fn download(&self, url: impl Into<String>, filename: impl Into<String>) {
        self.send(EngineCommand::Request(ApiRequest::Download {
            url: url.into(),
            filename: filename.into(),
        }));
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            cg_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_request(api: &dyn JobApi, request: ApiRequest, download_dir: &Path) -> EngineEvent {
    match request {
        ApiRequest::CreateTask { session, request } => {
            let result = api.create_task(&request).await;
            if let Err(err) = &result {
                cg_warn!("Create task failed for session {session}: {err}");
            }
            EngineEvent::TaskCreated { session, result }
        }
        ApiRequest::FetchStatus { session, task_id } => {
            let result = api.task_status(&task_id).await;
            match &result {
                Ok(report) => cg_debug!(
                    "Status for task {task_id}: {:?} {:?}%",
                    report.state,
                    report.progress
                ),
                Err(err) => cg_warn!("Status check for task {task_id} failed: {err}"),
            }
            EngineEvent::StatusFetched { session, result }
        }
        ApiRequest::ListVoices => EngineEvent::VoicesListed(api.list_voices().await),
        ApiRequest::ListHistory => {
            let result = api.list_history().await;
            if let Err(err) = &result {
                cg_warn!("Task history lookup failed: {err}");
            }
            EngineEvent::HistoryListed(result)
        }
        ApiRequest::Download { url, filename } => {
            EngineEvent::DownloadFinished(download(api, &url, &filename, download_dir).await)
        }
    }
}

async fn download(
    api: &dyn JobApi,
    url: &str,
    filename: &str,
    download_dir: &Path,
) -> Result<PathBuf, ApiError> {
    let bytes = api.download(url).await?;
    let writer = AtomicFileWriter::new(download_dir.to_path_buf());
    let filename = filename.to_string();
    let path = tokio::task::spawn_blocking(move || writer.write(&filename, &bytes))
        .await
        .map_err(|err| ApiError::new(FailureKind::Persist, err.to_string()))?
        .map_err(|err| ApiError::new(FailureKind::Persist, err.to_string()))?;
    cg_info!("Saved video from {url} to {}", path.display());
    Ok(path)
}
