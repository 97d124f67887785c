//! Content-addressed caches for parsed blobs and resolved commits.
//!
//! Blob ids are content hashes, so a blob cache entry can never go
//! stale; invalidation happens only when the synthesiser replaces a blob
//! and re-keys its view. The commit cache records which blob ids a
//! commit exposes; presence does not imply the commit has been hydrated.
//! Both caches are unbounded; at most one writer mutates a cache at a
//! time, readers may observe pre- or post-insert state.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;

use crate::hash::ObjectId;
use crate::sync::blob_view::BlobView;

/// Blob id → parsed view.
#[derive(Default, Debug)]
pub struct BlobCache {
    map: DashMap<ObjectId, Arc<BlobView>>,
}

impl BlobCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ObjectId) -> Option<Arc<BlobView>> {
        self.map.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn insert(&self, id: ObjectId, view: Arc<BlobView>) {
        self.map.insert(id, view);
    }

    pub fn remove(&self, id: &ObjectId) -> Option<Arc<BlobView>> {
        self.map.remove(id).map(|(_, view)| view)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.map.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Commit id → blob ids the commit exposes.
#[derive(Default, Debug)]
pub struct CommitCache {
    map: DashMap<ObjectId, BTreeSet<ObjectId>>,
}

impl CommitCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ObjectId) -> Option<BTreeSet<ObjectId>> {
        self.map.get(id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, id: ObjectId, blobs: BTreeSet<ObjectId>) {
        self.map.insert(id, blobs);
    }

    /// Take an entry out; the synthesiser removes the base commit's
    /// entry before replacing its blobs.
    pub fn remove(&self, id: &ObjectId) -> Option<BTreeSet<ObjectId>> {
        self.map.remove(id).map(|(_, blobs)| blobs)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.map.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    fn view() -> Arc<BlobView> {
        let mut map = std::collections::BTreeMap::new();
        map.insert("http://example.org/g".to_string(), "graph.nq".to_string());
        let config = StoreConfig::new(map, []);
        Arc::new(BlobView::parse("graph.nq", b"", &config).unwrap())
    }

    #[test]
    fn test_blob_cache_hit_and_invalidation() {
        let cache = BlobCache::new();
        let id = ObjectId::hash_content(b"content");
        assert!(cache.get(&id).is_none());
        cache.insert(id, view());
        assert!(cache.contains(&id));
        assert_eq!(cache.get(&id).unwrap().path(), "graph.nq");
        assert!(cache.remove(&id).is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_commit_cache_remove_takes_entry() {
        let cache = CommitCache::new();
        let commit = ObjectId::hash_content(b"commit");
        let blob = ObjectId::hash_content(b"blob");
        cache.insert(commit, BTreeSet::from([blob]));
        let taken = cache.remove(&commit).unwrap();
        assert_eq!(taken, BTreeSet::from([blob]));
        assert!(!cache.contains(&commit));
    }
}
