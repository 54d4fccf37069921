//! Conversion of raw backend records into canonical resources.
//!
//! This is the single point where backend schema drift is absorbed. Every
//! fetch and search response passes through [`normalize_records`] before
//! reaching the client-held list; nothing else in the crate touches a raw
//! record. Normalization never fails and never drops a record — a
//! malformed record still yields a best-effort text resource rather than
//! silently hiding data from the user.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::classify::classify;
use crate::models::{RawBackendRecord, Resource};

/// Normalize a batch of raw records, preserving order.
pub fn normalize_records(records: &[RawBackendRecord], uploader: &str) -> Vec<Resource> {
    records
        .iter()
        .map(|record| normalize_record(record, uploader))
        .collect()
}

/// Normalize a single raw record into a canonical [`Resource`].
///
/// The backend does not yet return uploader identity or ratings, so the
/// uploader defaults to the current session's display name and the rating
/// to zero. A record with no id gets a fresh client-local UUID so it stays
/// addressable; the next authoritative re-fetch replaces it.
pub fn normalize_record(record: &RawBackendRecord, uploader: &str) -> Resource {
    let classification = classify(record);

    let id = match &record.id {
        Some(id) => id.to_string(),
        None => Uuid::new_v4().to_string(),
    };

    let title = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    Resource {
        id,
        title,
        category: classification.category,
        primary_url: classification.primary_url,
        display_content: classification.display_content,
        tags: BTreeSet::new(),
        uploader: uploader.to_string(),
        uploaded_at: parse_timestamp(record.created_at.as_deref()),
        rating: 0,
    }
}

/// Parse the backend's timestamp, tolerating both RFC 3339 and the naive
/// ISO form it actually emits. An unparseable value falls back to the
/// fetch time so the record sorts near where the user last saw it.
fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = value else {
        return Utc::now();
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }

    Utc::now()
}
