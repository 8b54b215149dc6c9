use std::time::Duration;

use comicgen_logging::cg_debug;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{CreateTaskResponse, ErrorBody, VoiceList};
use crate::{ApiError, CreateTaskRequest, FailureKind, HistoryEntry, StatusReport, Voice};

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Upper bound for a downloaded video.
    pub max_download_bytes: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_download_bytes: 512 * 1024 * 1024,
        }
    }
}

/// HTTP contract of the generation backend.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    /// Creates a task and returns its backend-assigned id.
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError>;

    async fn task_status(&self, task_id: &str) -> Result<StatusReport, ApiError>;

    async fn list_voices(&self) -> Result<Vec<Voice>, ApiError>;

    /// Most recent tasks known to the backend.
    async fn list_history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestJobApi {
    settings: ApiSettings,
    base: Url,
    client: reqwest::Client,
}

impl ReqwestJobApi {
    pub fn new(settings: ApiSettings) -> Result<Self, ApiError> {
        let mut base = Url::parse(settings.base_url.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a base url", settings.base_url),
            ));
        }
        // Joining relative endpoint paths keeps any path prefix only when it
        // ends with a slash.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base,
            client,
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Resolves a backend-relative reference such as `/outputs/{id}/output.mp4`
    /// against the base url. Absolute urls pass through unchanged.
    pub fn resolve(&self, reference: &str) -> Result<Url, ApiError> {
        self.base
            .join(reference.trim())
            .map_err(|err| ApiError::new(FailureKind::InvalidUrl, err.to_string()))
    }

    fn status_url(&self, task_id: &str) -> Result<Url, ApiError> {
        let mut url = self.resolve("api/status/")?;
        url.path_segments_mut()
            .map_err(|_| ApiError::new(FailureKind::InvalidUrl, "base url has no path"))?
            .pop_if_empty()
            .push(task_id);
        Ok(url)
    }

    fn resolve_result_urls(&self, report: &mut StatusReport) {
        let Some(result) = report.result.as_mut() else {
            return;
        };
        for field in [&mut result.video_url, &mut result.thumbnail_url] {
            let Some(raw) = field.as_deref().filter(|raw| !raw.trim().is_empty()) else {
                continue;
            };
            if let Ok(resolved) = self.resolve(raw) {
                *field = Some(resolved.to_string());
            }
        }
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn create_task(&self, request: &CreateTaskRequest) -> Result<String, ApiError> {
        let url = self.resolve("api/generate")?;
        let body = serde_json::to_vec(request)
            .map_err(|err| ApiError::new(FailureKind::Decode, err.to_string()))?;
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let created: CreateTaskResponse = read_json(response).await?;
        if created.task_id.trim().is_empty() {
            return Err(ApiError::new(FailureKind::Decode, "empty task id"));
        }
        Ok(created.task_id)
    }

    async fn task_status(&self, task_id: &str) -> Result<StatusReport, ApiError> {
        let url = self.status_url(task_id)?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let mut report: StatusReport = read_json(response).await?;
        self.resolve_result_urls(&mut report);
        Ok(report)
    }

    async fn list_voices(&self) -> Result<Vec<Voice>, ApiError> {
        let url = self.resolve("api/voices")?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let list: VoiceList = read_json(response).await?;
        Ok(list.voices)
    }

    async fn list_history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        let url = self.resolve("api/history")?;
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        read_json(response).await
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.resolve(url)?;
        let max_bytes = self.settings.max_download_bytes;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, Some(content_len)));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, Some(next_len)));
            }
            bytes.extend_from_slice(&chunk);
        }
        cg_debug!("Downloaded {} bytes from {}", bytes.len(), url);

        Ok(bytes)
    }
}

/// Reads a JSON body. Non-2xx responses and undecodable bodies become errors
/// that carry the backend's `error` message when the body has one.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;

    if !status.is_success() {
        return Err(
            ApiError::new(FailureKind::HttpStatus(status.as_u16()), status.to_string())
                .with_server_message(server_message(&body)),
        );
    }

    serde_json::from_slice(&body).map_err(|err| {
        ApiError::new(FailureKind::Decode, err.to_string()).with_server_message(server_message(&body))
    })
}

fn server_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> ApiError {
    ApiError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> ReqwestJobApi {
        ReqwestJobApi::new(ApiSettings {
            base_url: base.to_string(),
            ..ApiSettings::default()
        })
        .expect("valid base url")
    }

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let api = api("http://host:5000/comic");
        assert_eq!(
            api.resolve("api/generate").unwrap().as_str(),
            "http://host:5000/comic/api/generate"
        );
        assert_eq!(
            api.status_url("a b/c").unwrap().as_str(),
            "http://host:5000/comic/api/status/a%20b%2Fc"
        );
    }

    #[test]
    fn relative_result_urls_resolve_against_host() {
        let api = api("http://host:5000");
        let mut report = StatusReport {
            result: Some(crate::WireResult {
                video_url: Some("/outputs/t1/output.mp4".to_string()),
                thumbnail_url: Some("https://cdn.example/t.png".to_string()),
                filename: None,
            }),
            ..StatusReport::default()
        };
        api.resolve_result_urls(&mut report);
        let result = report.result.unwrap();
        assert_eq!(
            result.video_url.as_deref(),
            Some("http://host:5000/outputs/t1/output.mp4")
        );
        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://cdn.example/t.png")
        );
    }

    #[test]
    fn empty_video_url_is_left_for_validation() {
        let api = api("http://host:5000");
        let mut report = StatusReport {
            result: Some(crate::WireResult {
                video_url: Some(String::new()),
                ..crate::WireResult::default()
            }),
            ..StatusReport::default()
        };
        api.resolve_result_urls(&mut report);
        assert_eq!(report.result.unwrap().video_url.as_deref(), Some(""));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = ReqwestJobApi::new(ApiSettings {
            base_url: "not a url".to_string(),
            ..ApiSettings::default()
        })
        .unwrap_err();
        assert_eq!(err.kind, FailureKind::InvalidUrl);
    }
}
