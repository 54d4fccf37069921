//! Per-resource AI summary sessions with stale-response protection.
//!
//! One session is active at a time, keyed by resource id. Opening a
//! summary for a different resource supersedes any in-flight session;
//! the superseded request is not aborted — its response is checked
//! against the active session's identity on arrival and discarded if it
//! no longer matches. The UI can therefore never show a summary against
//! the wrong resource.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::api::{ApiError, StudyApi};
use crate::models::Resource;

/// Shown when a summary request fails without a server-provided message.
pub const GENERIC_SUMMARY_ERROR: &str = "Could not generate a summary. Please try again.";

/// Lifecycle of the active summary session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    Loading,
    Success,
    Failed,
}

/// Transient request/response bundle for one resource's summary.
#[derive(Debug, Clone)]
pub struct SummarySession {
    pub resource_id: String,
    pub status: SummaryStatus,
    pub text: Option<String>,
    pub error: Option<String>,
}

/// Whether a finished request's result reached the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryOutcome {
    /// The session still belonged to this resource; its state was updated.
    Committed,
    /// The session was superseded or closed while the request was in
    /// flight; the response was discarded.
    Stale,
}

/// Drives the asynchronous summary workflow for the currently viewed
/// resource.
pub struct SummaryOrchestrator {
    api: Arc<dyn StudyApi>,
    active: Mutex<Option<SummarySession>>,
}

impl SummaryOrchestrator {
    pub fn new(api: Arc<dyn StudyApi>) -> Self {
        Self {
            api,
            active: Mutex::new(None),
        }
    }

    /// Snapshot of the active session, if any.
    pub fn session(&self) -> Option<SummarySession> {
        self.active.lock().unwrap().clone()
    }

    /// Discard the session entirely. Summaries are not cached across
    /// views; re-opening re-requests.
    pub fn close(&self) {
        *self.active.lock().unwrap() = None;
    }

    /// Open a summary view for `resource` and drive the request to
    /// completion. Any session for another resource is superseded the
    /// moment this is called.
    pub async fn request(&self, resource: &Resource) -> SummaryOutcome {
        {
            let mut active = self.active.lock().unwrap();
            if let Some(previous) = active.as_ref() {
                if previous.resource_id != resource.id {
                    debug!(superseded = %previous.resource_id, "abandoning in-flight summary session");
                }
            }
            *active = Some(SummarySession {
                resource_id: resource.id.clone(),
                status: SummaryStatus::Loading,
                text: None,
                error: None,
            });
        }

        // The backend can fall back to its stored extraction, so the
        // request goes out even when there is no inline content.
        let content = resource.display_content.clone().unwrap_or_default();
        let result = self.api.request_summary(&content, Some(&resource.id)).await;

        let mut active = self.active.lock().unwrap();
        let Some(session) = active.as_mut() else {
            debug!(resource = %resource.id, "summary view closed before response arrived");
            return SummaryOutcome::Stale;
        };
        if session.resource_id != resource.id {
            debug!(
                resource = %resource.id,
                active = %session.resource_id,
                "discarding summary response for superseded resource"
            );
            return SummaryOutcome::Stale;
        }

        match result {
            Ok(text) => {
                session.status = SummaryStatus::Success;
                session.text = Some(text);
            }
            Err(err) => {
                warn!(resource = %resource.id, error = %err, "summary request failed");
                session.status = SummaryStatus::Failed;
                session.error = Some(failure_message(&err));
            }
        }
        SummaryOutcome::Committed
    }
}

/// User-facing message for a failed summary: the server's detail when it
/// sent one, a generic fallback otherwise.
fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Server { detail, .. } if !detail.trim().is_empty() => detail.clone(),
        ApiError::Server { .. } => GENERIC_SUMMARY_ERROR.to_string(),
        ApiError::Network(_) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, SubmissionPayload};
    use crate::models::{RawBackendRecord, RecordId, UploadReceipt};
    use crate::normalize::normalize_record;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn resource(id: &str, content: &str) -> Resource {
        let record = RawBackendRecord {
            id: Some(RecordId::Text(id.to_string())),
            title: Some(format!("resource {}", id)),
            summary: Some(content.to_string()),
            ..Default::default()
        };
        normalize_record(&record, "tester")
    }

    /// Summarizes by echoing the resource id; holds the response for
    /// `hold_id` until the gate is released.
    struct FakeApi {
        hold_id: Option<String>,
        gate: Notify,
        fail: Option<ApiError>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                hold_id: None,
                gate: Notify::new(),
                fail: None,
            }
        }
    }

    #[async_trait]
    impl StudyApi for FakeApi {
        async fn fetch_resource_list(&self) -> ApiResult<Vec<RawBackendRecord>> {
            unimplemented!("not used by summary tests")
        }

        async fn search_resources(&self, _query: &str) -> ApiResult<Vec<RawBackendRecord>> {
            unimplemented!("not used by summary tests")
        }

        async fn submit_resource(&self, _payload: SubmissionPayload) -> ApiResult<UploadReceipt> {
            unimplemented!("not used by summary tests")
        }

        async fn request_summary(&self, _content: &str, id: Option<&str>) -> ApiResult<String> {
            let id = id.unwrap_or_default().to_string();
            if self.hold_id.as_deref() == Some(id.as_str()) {
                self.gate.notified().await;
            }
            if let Some(err) = &self.fail {
                return Err(err.clone());
            }
            Ok(format!("summary of {}", id))
        }

        async fn delete_resource(&self, _id: &str) -> ApiResult<()> {
            unimplemented!("not used by summary tests")
        }
    }

    #[tokio::test]
    async fn successful_request_populates_session() {
        let orchestrator = SummaryOrchestrator::new(Arc::new(FakeApi::new()));

        let outcome = orchestrator.request(&resource("7", "recursion notes")).await;
        assert_eq!(outcome, SummaryOutcome::Committed);

        let session = orchestrator.session().unwrap();
        assert_eq!(session.resource_id, "7");
        assert_eq!(session.status, SummaryStatus::Success);
        assert_eq!(session.text.as_deref(), Some("summary of 7"));
        assert!(session.error.is_none());
    }

    #[tokio::test]
    async fn stale_response_cannot_touch_a_newer_session() {
        let mut api = FakeApi::new();
        api.hold_id = Some("a".to_string());
        let api = Arc::new(api);
        let orchestrator = Arc::new(SummaryOrchestrator::new(
            Arc::clone(&api) as Arc<dyn StudyApi>
        ));

        // Open A; its response is held in flight.
        let slow = {
            let orchestrator = Arc::clone(&orchestrator);
            let a = resource("a", "alpha");
            tokio::spawn(async move { orchestrator.request(&a).await })
        };
        tokio::task::yield_now().await;
        assert_eq!(orchestrator.session().unwrap().resource_id, "a");

        // Open B; it supersedes A and completes.
        let outcome = orchestrator.request(&resource("b", "beta")).await;
        assert_eq!(outcome, SummaryOutcome::Committed);

        // A's late response must be discarded.
        api.gate.notify_one();
        assert_eq!(slow.await.unwrap(), SummaryOutcome::Stale);

        let session = orchestrator.session().unwrap();
        assert_eq!(session.resource_id, "b");
        assert_eq!(session.status, SummaryStatus::Success);
        assert_eq!(session.text.as_deref(), Some("summary of b"));
    }

    #[tokio::test]
    async fn closing_the_view_discards_the_session() {
        let mut api = FakeApi::new();
        api.hold_id = Some("a".to_string());
        let api = Arc::new(api);
        let orchestrator = Arc::new(SummaryOrchestrator::new(
            Arc::clone(&api) as Arc<dyn StudyApi>
        ));

        let slow = {
            let orchestrator = Arc::clone(&orchestrator);
            let a = resource("a", "alpha");
            tokio::spawn(async move { orchestrator.request(&a).await })
        };
        tokio::task::yield_now().await;

        orchestrator.close();
        api.gate.notify_one();

        assert_eq!(slow.await.unwrap(), SummaryOutcome::Stale);
        assert!(orchestrator.session().is_none());
    }

    #[tokio::test]
    async fn server_detail_is_shown_verbatim_on_failure() {
        let mut api = FakeApi::new();
        api.fail = Some(ApiError::Server {
            status: 500,
            detail: "Gemini API error: quota exceeded".to_string(),
        });
        let orchestrator = SummaryOrchestrator::new(Arc::new(api));

        orchestrator.request(&resource("7", "notes")).await;
        let session = orchestrator.session().unwrap();
        assert_eq!(session.status, SummaryStatus::Failed);
        assert_eq!(
            session.error.as_deref(),
            Some("Gemini API error: quota exceeded")
        );
    }

    #[tokio::test]
    async fn missing_detail_falls_back_to_generic_message() {
        let mut api = FakeApi::new();
        api.fail = Some(ApiError::Server {
            status: 502,
            detail: "  ".to_string(),
        });
        let orchestrator = SummaryOrchestrator::new(Arc::new(api));

        orchestrator.request(&resource("7", "notes")).await;
        let session = orchestrator.session().unwrap();
        assert_eq!(session.error.as_deref(), Some(GENERIC_SUMMARY_ERROR));
    }
}
