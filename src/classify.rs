//! Display-category inference for loosely-typed backend records.
//!
//! The backend stores every resource in one table with a nullable
//! `file_url`, an optional `summary`, and an optional `extracted_content`
//! — there is no category column. [`classify`] maps that shape onto the
//! fixed set of display categories, tolerating the backend's inconsistent
//! absent-value encodings (`null`, `"None"`, `""`) permanently. The
//! function is total: every input resolves to exactly one category.

use crate::models::{Category, RawBackendRecord};

const PDF_EXTENSIONS: &[&str] = &["pdf"];
const DOC_EXTENSIONS: &[&str] = &["doc", "docx"];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// URL fragments that identify a hosted file rather than an external link:
/// the backend's local uploads path and its cloud storage host.
const STORAGE_MARKERS: &[&str] = &["/uploads/", "cloudinary.com"];

/// Placeholder link target for url resources with no usable location.
/// Deliberately not dereferenceable.
pub const UNSET_LINK: &str = "#";

/// Result of classifying one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub primary_url: Option<String>,
    pub display_content: Option<String>,
}

/// Classify a raw backend record into a display category.
///
/// Priority order:
/// 1. No usable `file_url` → text (inline content from `extracted_content`
///    or `summary`; an empty record is still a well-formed text resource).
/// 2. Absolute `http(s)` URL → extension match (pdf, doc/docx, image);
///    a URL with no matching extension and no storage marker is an
///    external link; a hosted file with an unknown extension degrades to
///    text.
/// 3. Anything else (relative paths, other schemes) → extension match,
///    degrading to text.
pub fn classify(record: &RawBackendRecord) -> Classification {
    let summary = present(record.summary.as_deref());
    let extracted = present(record.extracted_content.as_deref());
    let display_content = extracted.or(summary).map(str::to_string);

    let Some(url) = present(record.file_url.as_deref()) else {
        return Classification {
            category: Category::Text,
            primary_url: None,
            display_content,
        };
    };

    let category = if is_absolute(url) {
        match extension_category(url) {
            Some(category) => category,
            None if !has_storage_marker(url) => Category::Url,
            None => Category::Text,
        }
    } else {
        extension_category(url).unwrap_or(Category::Text)
    };

    let primary_url = match category {
        Category::Text => None,
        Category::Url => Some(link_target(record.file_url.as_deref(), summary)),
        _ => Some(url.to_string()),
    };

    Classification {
        category,
        primary_url,
        display_content,
    }
}

/// Resolve the href for a link resource: the file URL when usable, the
/// summary when the URL was only stored there, else the unset marker.
pub fn link_target(file_url: Option<&str>, summary: Option<&str>) -> String {
    present(file_url)
        .or(summary)
        .unwrap_or(UNSET_LINK)
        .to_string()
}

/// Filter the backend's absent-value sentinels down to a real value.
///
/// `null` arrives as `None`; the literal strings `"None"`, `"null"`, and
/// `""` all mean "absent" on this wire and are normalized here, not
/// rejected upstream.
fn present(value: Option<&str>) -> Option<&str> {
    match value {
        Some("") | Some("None") | Some("null") | None => None,
        Some(v) => Some(v),
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn has_storage_marker(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    STORAGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Infer a category from the URL's file extension, ignoring case and any
/// query string or fragment.
fn extension_category(url: &str) -> Option<Category> {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or(url)
        .to_ascii_lowercase();
    let extension = path.rsplit_once('.').map(|(_, ext)| ext)?;

    if PDF_EXTENSIONS.contains(&extension) {
        Some(Category::Pdf)
    } else if DOC_EXTENSIONS.contains(&extension) {
        Some(Category::Docx)
    } else if IMAGE_EXTENSIONS.contains(&extension) {
        Some(Category::Image)
    } else {
        None
    }
}
