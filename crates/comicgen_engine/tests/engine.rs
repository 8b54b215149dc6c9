use std::sync::{Arc, Mutex};
use std::time::Duration;

use comicgen_engine::{
    ApiError, CreateTaskRequest, EngineEvent, EngineHandle, HistoryEntry, JobApi, StatusReport,
    Voice, WireTaskState,
};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct FakeApi {
    created: Mutex<Vec<CreateTaskRequest>>,
    status_calls: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl JobApi for FakeApi {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError> {
        self.created.lock().unwrap().push(request.clone());
        Ok("t1".to_string())
    }

    async fn task_status(&self, task_id: &str) -> Result<StatusReport, ApiError> {
        self.status_calls.lock().unwrap().push(task_id.to_string());
        Ok(StatusReport {
            state: WireTaskState::Running,
            progress: Some(40.0),
            ..StatusReport::default()
        })
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, ApiError> {
        Ok(Vec::new())
    }

    async fn list_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        Ok(vec![HistoryEntry {
            task_id: "t1".to_string(),
            text: "Once upon a time".to_string(),
            style: "manga".to_string(),
            status: "completed".to_string(),
            start_time: 100.0,
            completion_time: 160.0,
        }])
    }

    async fn download(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
        Ok(b"video".to_vec())
    }
}

fn request() -> CreateTaskRequest {
    CreateTaskRequest {
        story_text: "A".repeat(50),
        comic_style: "default".to_string(),
        voice_name: "zh-CN-XiaoxiaoNeural".to_string(),
        use_transitions: false,
        add_background_music: false,
    }
}

#[test]
fn requests_answer_with_session_tagged_events() {
    let api = Arc::new(FakeApi::default());
    let temp = TempDir::new().unwrap();
    let (engine, events) = EngineHandle::with_api(api.clone(), temp.path().to_path_buf()).unwrap();

    engine.create_task(4, request());
    match events.recv_timeout(WAIT) {
        Some(EngineEvent::TaskCreated { session, result }) => {
            assert_eq!(session, 4);
            assert_eq!(result.unwrap(), "t1");
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.fetch_status(4, "t1");
    match events.recv_timeout(WAIT) {
        Some(EngineEvent::StatusFetched { session, result }) => {
            assert_eq!(session, 4);
            assert_eq!(result.unwrap().progress, Some(40.0));
        }
        other => panic!("unexpected event {other:?}"),
    }

    assert_eq!(api.created.lock().unwrap().len(), 1);
    assert_eq!(*api.status_calls.lock().unwrap(), vec!["t1".to_string()]);
}

#[test]
fn polling_ticks_until_stopped() {
    let temp = TempDir::new().unwrap();
    let (engine, events) =
        EngineHandle::with_api(Arc::new(FakeApi::default()), temp.path().to_path_buf()).unwrap();

    engine.start_polling(9, Duration::from_millis(10));
    match events.recv_timeout(WAIT) {
        Some(EngineEvent::PollTick { session }) => assert_eq!(session, 9),
        other => panic!("unexpected event {other:?}"),
    }

    engine.stop_polling(9);
    std::thread::sleep(Duration::from_millis(50));
    while events.try_recv().is_some() {}
    assert!(events.recv_timeout(Duration::from_millis(80)).is_none());
}

#[test]
fn download_writes_into_download_dir() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("downloads");
    let (engine, events) =
        EngineHandle::with_api(Arc::new(FakeApi::default()), dir.clone()).unwrap();

    engine.download("http://host/outputs/t1/output.mp4", "story.mp4");
    match events.recv_timeout(WAIT) {
        Some(EngineEvent::DownloadFinished(Ok(path))) => {
            assert_eq!(path, dir.join("story.mp4"));
            assert_eq!(std::fs::read(path).unwrap(), b"video");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn history_lookup_answers_with_entries() {
    let temp = TempDir::new().unwrap();
    let (engine, events) =
        EngineHandle::with_api(Arc::new(FakeApi::default()), temp.path().to_path_buf()).unwrap();

    engine.list_history();
    match events.recv_timeout(WAIT) {
        Some(EngineEvent::HistoryListed(Ok(entries))) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].task_id, "t1");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn notice_expiry_fires_after_delay() {
    let temp = TempDir::new().unwrap();
    let (engine, events) =
        EngineHandle::with_api(Arc::new(FakeApi::default()), temp.path().to_path_buf()).unwrap();

    engine.expire_notice(7, Duration::from_millis(150));
    assert!(events.recv_timeout(Duration::from_millis(20)).is_none());
    match events.recv_timeout(WAIT) {
        Some(EngineEvent::NoticeExpired(id)) => assert_eq!(id, 7),
        other => panic!("unexpected event {other:?}"),
    }
}
