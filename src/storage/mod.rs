//! Content-addressed storage for lineage records and graphs
//!
//! Blobs are immutable and keyed by the hash of their bytes; named
//! roots are the only mutable pointers. `RecordArchiver` is the layer
//! that turns records and graphs into stored envelopes and back.

mod archive;
mod archiver;
mod codec;
mod memory;
mod sqlite;
mod traits;

pub use archive::{export_archive, import_archive, Archive, ArchiveBlob, ARCHIVE_VERSION};
pub use archiver::{IntegrityReport, IntegrityViolation, RecordArchiver};
pub use codec::{
    StoredGraph, StoredGraphIndex, StoredPartition, StoredRecord, TypedLink, GRAPH_INDEX_SCHEMA,
    GRAPH_SCHEMA, PARTITION_SCHEMA, RECORD_SCHEMA,
};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{ContentId, ContentStore, OpenStore, StorageError, StorageResult};
