//! Query-driven retrieval with last-issued-wins response application.
//!
//! The controller owns the query string and decides, by a length
//! threshold, whether to ask the backend for a filtered search or fall
//! back to the unfiltered list. Responses from overlapping requests are
//! serialized by issue order: each request gets a monotonically
//! increasing sequence number, and a response is applied only if no
//! later-issued response has been applied already. Cancellation is
//! logical — a superseded response is discarded on arrival, never
//! aborted in flight.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::api::{ApiError, StudyApi};
use crate::list::ResourceList;
use crate::normalize::normalize_records;

/// Queries shorter than this (after trimming) list everything instead of
/// searching; the backend rejects one-character searches anyway.
pub const MIN_QUERY_LEN: usize = 2;

/// Whether the visible list is the full listing or a filtered search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Listing,
    Searching,
}

/// What happened to one query-change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The response was applied to the list.
    Applied,
    /// A later-issued request was applied first; this response was
    /// discarded.
    Superseded,
}

struct SearchState {
    query: String,
    mode: SearchMode,
    last_issued: u64,
    last_applied: u64,
}

/// Drives list-all vs filtered search and keeps the client-held list
/// consistent under overlapping requests.
pub struct SearchController {
    api: Arc<dyn StudyApi>,
    list: Arc<ResourceList>,
    uploader: String,
    state: Mutex<SearchState>,
}

impl SearchController {
    pub fn new(api: Arc<dyn StudyApi>, list: Arc<ResourceList>, uploader: impl Into<String>) -> Self {
        Self {
            api,
            list,
            uploader: uploader.into(),
            state: Mutex::new(SearchState {
                query: String::new(),
                mode: SearchMode::Listing,
                last_issued: 0,
                last_applied: 0,
            }),
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.state.lock().unwrap().mode
    }

    pub fn query(&self) -> String {
        self.state.lock().unwrap().query.clone()
    }

    /// React to a query edit: issue the appropriate request and apply the
    /// response unless a later-issued request got there first.
    ///
    /// On failure the list is left untouched (keep showing the last good
    /// result set), the mode reverts to its pre-request value, and the
    /// error is returned for a non-fatal notification.
    pub async fn on_query_change(&self, new_query: &str) -> Result<SearchOutcome, ApiError> {
        let trimmed = new_query.trim().to_string();
        let target_mode = if trimmed.chars().count() < MIN_QUERY_LEN {
            SearchMode::Listing
        } else {
            SearchMode::Searching
        };

        let (seq, previous_mode) = {
            let mut state = self.state.lock().unwrap();
            let previous_mode = state.mode;
            state.last_issued += 1;
            state.query = new_query.to_string();
            state.mode = target_mode;
            (state.last_issued, previous_mode)
        };
        debug!(seq, query = %trimmed, ?target_mode, "issuing search request");

        let result = match target_mode {
            SearchMode::Listing => self.api.fetch_resource_list().await,
            SearchMode::Searching => self.api.search_resources(&trimmed).await,
        };

        match result {
            Ok(records) => {
                let mut state = self.state.lock().unwrap();
                if seq <= state.last_applied {
                    debug!(seq, last_applied = state.last_applied, "discarding stale response");
                    return Ok(SearchOutcome::Superseded);
                }
                state.last_applied = seq;
                drop(state);
                self.list.replace(normalize_records(&records, &self.uploader));
                Ok(SearchOutcome::Applied)
            }
            Err(err) => {
                warn!(seq, error = %err, "search request failed; keeping last good list");
                let mut state = self.state.lock().unwrap();
                // Only this request's mode change is undone; a newer
                // request owns the mode now.
                if state.last_issued == seq {
                    state.mode = previous_mode;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, SubmissionPayload};
    use crate::models::{RawBackendRecord, RecordId, UploadReceipt};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    fn record(title: &str) -> RawBackendRecord {
        RawBackendRecord {
            id: Some(RecordId::Text(title.to_string())),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Counts calls per endpoint; `hold_query` responses wait on the gate.
    struct FakeApi {
        list_calls: AtomicUsize,
        search_calls: AtomicUsize,
        hold_query: Option<String>,
        gate: Notify,
        fail_search: bool,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                list_calls: AtomicUsize::new(0),
                search_calls: AtomicUsize::new(0),
                hold_query: None,
                gate: Notify::new(),
                fail_search: false,
            }
        }
    }

    #[async_trait]
    impl StudyApi for FakeApi {
        async fn fetch_resource_list(&self) -> ApiResult<Vec<RawBackendRecord>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![record("listed")])
        }

        async fn search_resources(&self, query: &str) -> ApiResult<Vec<RawBackendRecord>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_search {
                return Err(ApiError::Network("connection refused".to_string()));
            }
            if self.hold_query.as_deref() == Some(query) {
                self.gate.notified().await;
            }
            Ok(vec![record(query)])
        }

        async fn submit_resource(&self, _payload: SubmissionPayload) -> ApiResult<UploadReceipt> {
            unimplemented!("not used by search tests")
        }

        async fn request_summary(&self, _c: &str, _id: Option<&str>) -> ApiResult<String> {
            unimplemented!("not used by search tests")
        }

        async fn delete_resource(&self, _id: &str) -> ApiResult<()> {
            unimplemented!("not used by search tests")
        }
    }

    fn controller(api: Arc<FakeApi>) -> (SearchController, Arc<ResourceList>) {
        let list = Arc::new(ResourceList::new());
        (SearchController::new(api, Arc::clone(&list), "tester"), list)
    }

    #[tokio::test]
    async fn short_queries_list_instead_of_searching() {
        let api = Arc::new(FakeApi::new());
        let (ctrl, _list) = controller(Arc::clone(&api));

        for query in ["", "a", " a "] {
            ctrl.on_query_change(query).await.unwrap();
        }

        assert_eq!(api.list_calls.load(Ordering::SeqCst), 3);
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctrl.mode(), SearchMode::Listing);
    }

    #[tokio::test]
    async fn two_char_query_searches() {
        let api = Arc::new(FakeApi::new());
        let (ctrl, list) = controller(Arc::clone(&api));

        let outcome = ctrl.on_query_change("ab").await.unwrap();
        assert_eq!(outcome, SearchOutcome::Applied);
        assert_eq!(api.search_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ctrl.mode(), SearchMode::Searching);
        assert_eq!(list.snapshot()[0].title, "ab");
    }

    #[tokio::test]
    async fn later_issued_request_wins_over_earlier_slow_response() {
        let mut api = FakeApi::new();
        api.hold_query = Some("alpha".to_string());
        let api = Arc::new(api);
        let (ctrl, list) = controller(Arc::clone(&api));
        let ctrl = Arc::new(ctrl);

        // A is issued first but its response is held back.
        let slow = {
            let ctrl = Arc::clone(&ctrl);
            tokio::spawn(async move { ctrl.on_query_change("alpha").await })
        };
        tokio::task::yield_now().await;

        // B is issued second and resolves immediately.
        let fast = ctrl.on_query_change("beta").await.unwrap();
        assert_eq!(fast, SearchOutcome::Applied);

        // Release A: its response arrives after B's and must be discarded.
        api.gate.notify_one();
        let outcome = slow.await.unwrap().unwrap();
        assert_eq!(outcome, SearchOutcome::Superseded);

        let titles: Vec<String> = list.snapshot().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["beta"]);
    }

    #[tokio::test]
    async fn failure_keeps_list_and_reverts_mode() {
        let mut api = FakeApi::new();
        api.fail_search = true;
        let api = Arc::new(api);
        let (ctrl, list) = controller(Arc::clone(&api));

        // Seed the list via a successful listing request.
        ctrl.on_query_change("").await.unwrap();
        assert_eq!(list.len(), 1);

        let err = ctrl.on_query_change("rust").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));

        let titles: Vec<String> = list.snapshot().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["listed"]);
        assert_eq!(ctrl.mode(), SearchMode::Listing);
    }
}
