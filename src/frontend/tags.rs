//! Process-local tag index.
//!
//! Maps a tag to the ordered set of keys bound to it. The index is never
//! persisted and never replicated to the backend: it is rebuilt implicitly
//! as `set` calls occur and is lost on process restart. A tag's key list
//! may keep referencing keys that have since expired or been removed;
//! resolution tolerates that and tag cleanup reports only the keys a
//! backend actually removed.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct TagIndex {
    inner: RwLock<HashMap<String, Vec<String>>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `key` to each tag, creating key lists as needed. A key
    /// appears under a tag at most once; rebinding is a no-op.
    pub fn bind(&self, key: &str, tags: &[String]) {
        if tags.is_empty() {
            return;
        }
        let mut inner = self.inner.write();
        for tag in tags {
            let keys = inner.entry(tag.clone()).or_default();
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }

    /// Resolves the union of keys bound to the given tags, de-duplicated
    /// in first-seen order. Missing tags contribute nothing; resolution
    /// never fails.
    pub fn resolve(&self, tags: &[String]) -> Vec<String> {
        let inner = self.inner.read();
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for tag in tags {
            if let Some(bound) = inner.get(tag) {
                for key in bound {
                    if seen.insert(key.clone()) {
                        keys.push(key.clone());
                    }
                }
            }
        }
        keys
    }

    pub fn exists(&self, tag: &str) -> bool {
        self.inner.read().contains_key(tag)
    }

    /// Snapshot of all known tags.
    pub fn tags(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }

    /// Drops every tag binding.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
