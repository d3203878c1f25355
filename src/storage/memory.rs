//! In-memory content store

use super::traits::{ContentId, ContentStore, StorageError, StorageResult};
use dashmap::DashMap;

/// Content store backed by process memory. Nothing survives the
/// process; intended for tests and short-lived pipelines.
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: DashMap<ContentId, Vec<u8>>,
    roots: DashMap<String, ContentId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl ContentStore for MemoryStore {
    fn put(&self, bytes: &[u8]) -> StorageResult<ContentId> {
        let id = ContentId::from_bytes(bytes);
        self.blobs.entry(id.clone()).or_insert_with(|| bytes.to_vec());
        Ok(id)
    }

    fn get(&self, id: &ContentId) -> StorageResult<Vec<u8>> {
        self.blobs
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StorageError::ContentNotFound(id.to_string()))
    }

    fn has(&self, id: &ContentId) -> StorageResult<bool> {
        Ok(self.blobs.contains_key(id))
    }

    fn list_ids(&self) -> StorageResult<Vec<ContentId>> {
        let mut ids: Vec<ContentId> = self.blobs.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }

    fn set_root(&self, name: &str, id: &ContentId) -> StorageResult<()> {
        self.roots.insert(name.to_string(), id.clone());
        Ok(())
    }

    fn get_root(&self, name: &str) -> StorageResult<Option<ContentId>> {
        Ok(self.roots.get(name).map(|entry| entry.value().clone()))
    }

    fn list_roots(&self) -> StorageResult<Vec<(String, ContentId)>> {
        let mut roots: Vec<(String, ContentId)> = self
            .roots
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        roots.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(roots)
    }
}
