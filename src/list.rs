//! The client-held resource list.
//!
//! A shared, interior-mutable view of the remote store. Fetch and search
//! responses replace the list wholesale (no incremental patching); the one
//! exception is the optimistic prepend performed during ingestion, which
//! the next authoritative replace supersedes.

use std::sync::RwLock;

use crate::models::Resource;

/// Shared in-memory resource list.
///
/// Controllers hold this behind an `Arc` and mutate it as responses are
/// applied; the presentation layer reads snapshots.
pub struct ResourceList {
    inner: RwLock<Vec<Resource>>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Replace the whole list with an authoritative result set.
    pub fn replace(&self, resources: Vec<Resource>) {
        *self.inner.write().unwrap() = resources;
    }

    /// Prepend a provisional entry so the UI reflects it immediately.
    pub fn prepend(&self, resource: Resource) {
        self.inner.write().unwrap().insert(0, resource);
    }

    /// Remove the entry with the given id. Returns whether one was removed.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        let before = inner.len();
        inner.retain(|r| r.id != id);
        inner.len() != before
    }

    /// Find a resource by id.
    pub fn get(&self, id: &str) -> Option<Resource> {
        self.inner.read().unwrap().iter().find(|r| r.id == id).cloned()
    }

    /// Clone the current contents for display.
    pub fn snapshot(&self) -> Vec<Resource> {
        self.inner.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}

impl Default for ResourceList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawBackendRecord;
    use crate::normalize::normalize_record;

    fn resource(id: &str) -> Resource {
        let record = RawBackendRecord {
            id: Some(crate::models::RecordId::Text(id.to_string())),
            title: Some(format!("resource {}", id)),
            ..Default::default()
        };
        normalize_record(&record, "tester")
    }

    #[test]
    fn prepend_puts_newest_first() {
        let list = ResourceList::new();
        list.replace(vec![resource("1"), resource("2")]);
        list.prepend(resource("3"));

        let ids: Vec<String> = list.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn replace_is_wholesale() {
        let list = ResourceList::new();
        list.prepend(resource("stale"));
        list.replace(vec![resource("fresh")]);

        let snapshot = list.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "fresh");
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let list = ResourceList::new();
        list.replace(vec![resource("1")]);
        assert!(list.remove("1"));
        assert!(!list.remove("1"));
        assert!(list.is_empty());
    }

    #[test]
    fn get_finds_by_id() {
        let list = ResourceList::new();
        list.replace(vec![resource("7"), resource("9")]);
        assert_eq!(list.get("9").unwrap().id, "9");
        assert!(list.get("404").is_none());
    }
}
