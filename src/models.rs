//! Core data models used throughout StudyStack.
//!
//! These types represent the raw backend records, canonical resources, and
//! upload receipts that flow through the classification and reconciliation
//! pipeline.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw resource record as returned by the backend, before classification.
///
/// The wire format is loose: every field can be missing, `id` arrives as
/// either a number or a string, and `file_url` uses `null`, `"None"`, and
/// the empty string interchangeably to mean "absent". Normalization
/// absorbs all of that; nothing downstream of [`crate::normalize`] sees a
/// raw record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBackendRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub extracted_content: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Record identifier as it appears on the wire (integer or string).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Display category of a resource, inferred at normalization time.
///
/// Exactly one category per resource; it never changes except through a
/// full re-normalization of the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pdf,
    Docx,
    Image,
    Url,
    Text,
}

impl Category {
    /// Whether resources of this category carry a dereferenceable URL.
    pub fn has_primary_url(self) -> bool {
        !matches!(self, Category::Text)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Pdf => "pdf",
            Category::Docx => "docx",
            Category::Image => "image",
            Category::Url => "url",
            Category::Text => "text",
        };
        write!(f, "{}", name)
    }
}

/// Canonical resource held by the client, independent of backend wire format.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub category: Category,
    /// Dereferenceable location; present only for pdf/docx/image/url.
    pub primary_url: Option<String>,
    /// Inline textual content (text resources) or link annotation.
    pub display_content: Option<String>,
    /// Always empty from today's backend; reserved for future population.
    pub tags: BTreeSet<String>,
    pub uploader: String,
    pub uploaded_at: DateTime<Utc>,
    pub rating: u32,
}

/// Response payload from a successful resource submission.
///
/// Field names follow the backend's upload response. `size` arrives as a
/// human-formatted string (e.g. `"2.10 MB"`) and is carried opaquely.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, rename = "uploadDate")]
    pub uploaded_at: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}
