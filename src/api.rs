//! Remote study-store collaborator interface.
//!
//! Defines the [`StudyApi`] trait consumed by the controllers, the
//! [`ApiError`] taxonomy, and [`HttpStudyApi`], the reqwest-backed
//! implementation against the backend's REST surface. Transport policy
//! (retries, token acquisition, the file-processing service behind the
//! upload endpoint) stays on the other side of this seam.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ApiConfig;
use crate::models::{RawBackendRecord, UploadReceipt};

/// Result type for remote store operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure modes of the remote store.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// No response was received at all (backend unreachable, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// A response was received with a failure status. `detail` is the
    /// backend's own message when it sent one, shown to the user verbatim.
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },
}

/// An in-memory file staged for upload.
#[derive(Clone)]
pub struct FileAttachment {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for FileAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAttachment")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Outbound submission assembled from a validated draft.
///
/// Exactly one of `content` / `file` is populated, depending on the
/// draft's kind; `tags` is the backend's comma-joined form.
#[derive(Debug, Clone)]
pub struct SubmissionPayload {
    pub title: String,
    pub kind: String,
    pub subject: String,
    pub is_public: bool,
    pub tags: String,
    pub content: Option<String>,
    pub file: Option<FileAttachment>,
}

/// The remote store as seen by the controllers.
///
/// Implementations perform the actual HTTP round-trips; controllers only
/// see raw records and receipts. Everything is async and `Send + Sync`
/// so controllers can be shared across tasks.
#[async_trait]
pub trait StudyApi: Send + Sync {
    /// Fetch the full, unfiltered resource list.
    async fn fetch_resource_list(&self) -> ApiResult<Vec<RawBackendRecord>>;

    /// Fetch resources matching a search query (title, summary, content).
    async fn search_resources(&self, query: &str) -> ApiResult<Vec<RawBackendRecord>>;

    /// Submit a new resource and return the backend's receipt.
    async fn submit_resource(&self, payload: SubmissionPayload) -> ApiResult<UploadReceipt>;

    /// Request an AI summary. `content` may be empty when the backend can
    /// fall back to its stored extraction for `resource_id`.
    async fn request_summary(&self, content: &str, resource_id: Option<&str>) -> ApiResult<String>;

    /// Delete a resource by id.
    async fn delete_resource(&self, id: &str) -> ApiResult<()>;
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(rename = "resourceId", skip_serializing_if = "Option::is_none")]
    resource_id: Option<i64>,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// HTTP implementation of [`StudyApi`].
///
/// Uses two clients: one with the standard timeout, and one with a longer
/// ceiling for uploads and summary generation, which routinely take tens
/// of seconds. A timeout surfaces as an ordinary [`ApiError::Network`].
pub struct HttpStudyApi {
    client: reqwest::Client,
    slow_client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpStudyApi {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let slow_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            slow_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_records(&self, response: reqwest::Response) -> ApiResult<Vec<RawBackendRecord>> {
        let response = check_status(response).await?;
        response
            .json::<Vec<RawBackendRecord>>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    async fn fetch_resource_list(&self) -> ApiResult<Vec<RawBackendRecord>> {
        let url = self.endpoint("/notes/");
        debug!(%url, "fetching resource list");
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(network_error)?;
        self.read_records(response).await
    }

    async fn search_resources(&self, query: &str) -> ApiResult<Vec<RawBackendRecord>> {
        let url = self.endpoint("/search");
        debug!(%url, query, "searching resources");
        let response = self
            .authorize(self.client.get(&url).query(&[("q", query)]))
            .send()
            .await
            .map_err(network_error)?;
        self.read_records(response).await
    }

    async fn submit_resource(&self, payload: SubmissionPayload) -> ApiResult<UploadReceipt> {
        let url = self.endpoint("/upload");
        debug!(%url, kind = %payload.kind, "submitting resource");

        let mut form = reqwest::multipart::Form::new()
            .text("title", payload.title)
            .text("type", payload.kind)
            .text("subject", payload.subject)
            .text("tags", payload.tags)
            .text("is_public", if payload.is_public { "true" } else { "false" });
        if let Some(content) = payload.content {
            form = form.text("content", content);
        }
        if let Some(file) = payload.file {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.name)
                .mime_str(&file.mime)
                .map_err(|e| ApiError::Network(format!("invalid attachment content-type: {}", e)))?;
            form = form.part("file", part);
        }

        let response = self
            .authorize(self.slow_client.post(&url).multipart(form))
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response).await?;
        response
            .json::<UploadReceipt>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid response body: {}", e)))
    }

    async fn request_summary(&self, content: &str, resource_id: Option<&str>) -> ApiResult<String> {
        let url = self.endpoint("/summarize");
        debug!(%url, resource_id, "requesting summary");

        // The backend keys stored resources by integer id; client-local
        // fallback ids are simply not forwarded.
        let numeric_id = resource_id.and_then(|id| id.parse::<i64>().ok());
        let body = SummarizeRequest {
            text: (!content.is_empty()).then_some(content),
            resource_id: numeric_id,
        };

        let response = self
            .authorize(self.slow_client.post(&url).json(&body))
            .send()
            .await
            .map_err(network_error)?;
        let response = check_status(response).await?;
        let parsed: SummarizeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Network(format!("invalid response body: {}", e)))?;
        Ok(parsed.summary)
    }

    async fn delete_resource(&self, id: &str) -> ApiResult<()> {
        let url = self.endpoint(&format!("/notes/{}", id));
        debug!(%url, "deleting resource");
        let response = self
            .authorize(self.client.delete(&url))
            .send()
            .await
            .map_err(network_error)?;
        check_status(response).await?;
        Ok(())
    }
}

fn network_error(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

/// Pass a successful response through; turn a failure status into a
/// [`ApiError::Server`] carrying the backend's detail message.
async fn check_status(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Server {
        status: status.as_u16(),
        detail: error_detail(status, &body),
    })
}

/// Extract the human-readable detail from an error body.
///
/// The backend wraps its messages as `{"detail": "..."}`; fall back to
/// the raw body, then to the status line, so the user always sees
/// something actionable.
fn error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
            return detail.to_string();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_detail_prefers_backend_detail_field() {
        let detail = error_detail(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Search query must be at least 2 characters"}"#,
        );
        assert_eq!(detail, "Search query must be at least 2 characters");
    }

    #[test]
    fn error_detail_falls_back_to_raw_body_then_status() {
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded"
        );
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "  "),
            "Bad Gateway"
        );
    }

    #[test]
    fn summarize_request_omits_absent_fields() {
        let body = SummarizeRequest {
            text: None,
            resource_id: Some(7),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"resourceId":7}"#
        );

        let body = SummarizeRequest {
            text: Some("notes"),
            resource_id: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"text":"notes"}"#);
    }
}
