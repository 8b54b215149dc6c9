//! Comicgen engine: backend HTTP client, polling ticker and effect execution.
mod client;
mod engine;
mod persist;
mod poller;
mod types;

pub use client::{ApiSettings, JobApi, ReqwestJobApi};
pub use engine::{EngineConfig, EngineError, EngineEvents, EngineHandle};
pub use persist::{ensure_output_dir, safe_file_name, AtomicFileWriter, PersistError};
pub use types::{
    ApiError, CreateTaskRequest, EngineEvent, FailureKind, HistoryEntry, SessionId, StatusReport,
    Voice, WireResult, WireTaskState,
};
