//! Resource draft state for the create flow.
//!
//! A [`ResourceDraft`] exists only between opening the creation form and a
//! successful submit (or cancel). Its invariant: exactly one of `content`
//! (for text and link drafts) or `file` (for file drafts) is populated,
//! maintained by [`ResourceDraft::set_kind`] clearing the other side.

use crate::api::FileAttachment;

/// What the user is creating: an inline note, an external link, or an
/// uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftKind {
    #[default]
    Text,
    Link,
    File,
}

impl DraftKind {
    /// Wire name the backend expects in the `type` form field.
    pub fn wire_name(self) -> &'static str {
        match self {
            DraftKind::Text => "TEXT",
            DraftKind::Link => "LINK",
            DraftKind::File => "FILE",
        }
    }
}

/// Transient draft of a resource being created.
#[derive(Debug, Clone, Default)]
pub struct ResourceDraft {
    pub title: String,
    pub kind: DraftKind,
    pub content: String,
    pub subject: String,
    pub tags: Vec<String>,
    pub file: Option<FileAttachment>,
    pub is_public: bool,
}

impl ResourceDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch the draft's kind, clearing the payload that no longer
    /// applies so stale content can never ride along on a submit.
    pub fn set_kind(&mut self, kind: DraftKind) {
        if self.kind == kind {
            return;
        }
        self.kind = kind;
        match kind {
            DraftKind::File => self.content.clear(),
            DraftKind::Text | DraftKind::Link => self.file = None,
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    pub fn attach_file(&mut self, file: FileAttachment) {
        self.file = Some(file);
    }

    /// Infer the kind a backend would assign this draft: a staged file
    /// wins, `http…` content is a link, any other content is text.
    pub fn inferred_kind(&self) -> DraftKind {
        if self.file.is_some() {
            DraftKind::File
        } else if self.content.starts_with("http://") || self.content.starts_with("https://") {
            DraftKind::Link
        } else {
            DraftKind::Text
        }
    }
}
