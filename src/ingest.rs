//! Draft validation, submission, and optimistic list reconciliation.
//!
//! Submission is a two-phase update. Phase one is synchronous and local:
//! a provisional resource built from the upload receipt is prepended to
//! the list so the UI reflects the new item immediately. Phase two
//! re-fetches the authoritative list and replaces the provisional entry.
//! Phase two is best-effort: if the re-fetch fails, the provisional entry
//! stays — showing possibly-stale data beats silently removing what the
//! user just created.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiError, StudyApi, SubmissionPayload};
use crate::draft::{DraftKind, ResourceDraft};
use crate::list::ResourceList;
use crate::models::{RawBackendRecord, RecordId, Resource, UploadReceipt};
use crate::normalize::{normalize_record, normalize_records};

/// Files above this size are rejected locally, before any upload begins.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Local, pre-network rejection of a draft. Never sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a title is required")]
    MissingTitle,
    #[error("link resources need a URL starting with http")]
    InvalidUrl,
    #[error("text resources need some content")]
    MissingContent,
    #[error("file resources need an attached file")]
    MissingFile,
    #[error("file is {size} bytes; the limit is {limit}")]
    FileTooLarge { size: usize, limit: usize },
}

/// Why a submission did not produce a resource.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Upload(#[from] ApiError),
}

/// Builds, validates, and submits resource drafts, and keeps the
/// client-held list consistent with what the backend accepted.
pub struct IngestionController {
    api: Arc<dyn StudyApi>,
    list: Arc<ResourceList>,
    uploader: String,
}

impl IngestionController {
    pub fn new(api: Arc<dyn StudyApi>, list: Arc<ResourceList>, uploader: impl Into<String>) -> Self {
        Self {
            api,
            list,
            uploader: uploader.into(),
        }
    }

    /// Check a draft without touching the network. Fails on the first
    /// problem found.
    pub fn validate(draft: &ResourceDraft) -> Result<(), ValidationError> {
        if draft.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        match draft.kind {
            DraftKind::Link => {
                let content = draft.content.trim();
                if content.is_empty() || !content.starts_with("http") {
                    return Err(ValidationError::InvalidUrl);
                }
            }
            DraftKind::Text => {
                if draft.content.trim().is_empty() {
                    return Err(ValidationError::MissingContent);
                }
            }
            DraftKind::File => {
                let Some(file) = &draft.file else {
                    return Err(ValidationError::MissingFile);
                };
                if file.bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(ValidationError::FileTooLarge {
                        size: file.bytes.len(),
                        limit: MAX_UPLOAD_BYTES,
                    });
                }
            }
        }
        Ok(())
    }

    /// Phase one: validate, submit, and optimistically prepend the
    /// accepted resource. Returns the provisional resource.
    ///
    /// On failure the caller's draft is untouched, so the form can offer
    /// a retry without re-entering anything.
    pub async fn submit(&self, draft: &ResourceDraft) -> Result<Resource, SubmitError> {
        Self::validate(draft)?;

        let payload = build_payload(draft);
        let receipt = self.api.submit_resource(payload).await?;
        if let Some(message) = &receipt.message {
            debug!(%message, id = %receipt.id, "resource accepted");
        }

        let resource = provisional_resource(&receipt, &self.uploader);
        self.list.prepend(resource.clone());
        Ok(resource)
    }

    /// Phase two: replace the list with the authoritative state.
    ///
    /// On failure the list — including any provisional entry — is left
    /// as-is.
    pub async fn reconcile(&self) -> Result<(), ApiError> {
        let records = self.api.fetch_resource_list().await?;
        self.list.replace(normalize_records(&records, &self.uploader));
        Ok(())
    }

    /// Both phases in sequence. A reconcile failure is non-fatal: the
    /// provisional entry is retained and the submit still counts as a
    /// success.
    pub async fn submit_and_reconcile(&self, draft: &ResourceDraft) -> Result<Resource, SubmitError> {
        let resource = self.submit(draft).await?;
        if let Err(err) = self.reconcile().await {
            warn!(error = %err, "authoritative re-fetch failed; keeping provisional entry");
        }
        Ok(resource)
    }

    /// Delete a resource remotely, then drop it from the list. A failed
    /// delete leaves the list unchanged.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete_resource(id).await?;
        self.list.remove(id);
        Ok(())
    }
}

/// Assemble the multipart submission for a validated draft: title, kind,
/// subject, public flag, comma-joined tags, and exactly one of file or
/// content.
fn build_payload(draft: &ResourceDraft) -> SubmissionPayload {
    let tags = draft
        .tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",");

    let content = match draft.kind {
        DraftKind::Text | DraftKind::Link => Some(draft.content.trim().to_string()),
        DraftKind::File => None,
    };

    SubmissionPayload {
        title: draft.title.trim().to_string(),
        kind: draft.kind.wire_name().to_string(),
        subject: draft.subject.clone(),
        is_public: draft.is_public,
        tags,
        content,
        file: draft.file.clone(),
    }
}

/// Build the provisional resource shown before the authoritative
/// re-fetch, by running the receipt through the same normalization as a
/// fetched record.
fn provisional_resource(receipt: &UploadReceipt, uploader: &str) -> Resource {
    let record = RawBackendRecord {
        id: Some(RecordId::Text(receipt.id.clone())),
        title: Some(receipt.title.clone()),
        file_url: receipt.url.clone(),
        summary: receipt.content.clone(),
        extracted_content: None,
        created_at: receipt.uploaded_at.clone(),
    };
    let mut resource = normalize_record(&record, uploader);
    resource.tags = receipt
        .tags
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    resource
}
