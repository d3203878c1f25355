//! Storage trait definitions

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Content not found: {0}")]
    ContentNotFound(String),

    #[error("Root not found: {0}")]
    RootNotFound(String),

    #[error("Corrupt content: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Content-derived identity of a stored blob: the lowercase hex SHA-256
/// of its bytes. Equal bytes always map to the same id, so `put` is
/// idempotent and dedup is free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Hash bytes into their content id.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(bytes)))
    }

    /// Wrap an already-computed lowercase hex digest.
    pub fn from_hex(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait for content-addressed blob stores
///
/// Blobs are immutable and keyed by their own hash; named roots are the
/// only mutable state, pointing sessions at graph heads. Implementations
/// must be thread-safe (Send + Sync) to support concurrent access from
/// multiple threads.
pub trait ContentStore: Send + Sync {
    // === Blob Operations ===

    /// Store bytes, returning their content id. Re-putting existing
    /// bytes is a no-op.
    fn put(&self, bytes: &[u8]) -> StorageResult<ContentId>;

    /// Load the bytes stored under a content id.
    fn get(&self, id: &ContentId) -> StorageResult<Vec<u8>>;

    /// Whether a content id is present.
    fn has(&self, id: &ContentId) -> StorageResult<bool>;

    /// Every stored content id, sorted. Used by integrity sweeps and
    /// archive tooling.
    fn list_ids(&self) -> StorageResult<Vec<ContentId>>;

    // === Schema-Tagged Operations ===

    /// Store a JSON object with a `schema` discriminator stamped into
    /// it, so readers can dispatch on content kind before full decode.
    fn put_with_schema(
        &self,
        value: &serde_json::Value,
        schema: &str,
    ) -> StorageResult<ContentId> {
        let mut body = match value {
            serde_json::Value::Object(map) => map.clone(),
            _ => {
                return Err(StorageError::Corrupt(
                    "schema-tagged content must be a JSON object".to_string(),
                ))
            }
        };
        body.insert(
            "schema".to_string(),
            serde_json::Value::String(schema.to_string()),
        );
        let bytes = serde_json::to_vec(&serde_json::Value::Object(body))?;
        self.put(&bytes)
    }

    /// Batch form of `put_with_schema`. Failures are reported per item;
    /// one bad item never aborts the rest of the batch.
    fn put_many_with_schema(
        &self,
        items: &[(String, serde_json::Value)],
        schema: &str,
    ) -> Vec<(String, StorageResult<ContentId>)> {
        items
            .iter()
            .map(|(key, value)| (key.clone(), self.put_with_schema(value, schema)))
            .collect()
    }

    // === Root Operations ===

    /// Point a named root at a content id, replacing any previous target.
    fn set_root(&self, name: &str, id: &ContentId) -> StorageResult<()>;

    /// Resolve a named root. `None` when the root was never set.
    fn get_root(&self, name: &str) -> StorageResult<Option<ContentId>>;

    /// All named roots, sorted by name.
    fn list_roots(&self) -> StorageResult<Vec<(String, ContentId)>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: ContentStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
