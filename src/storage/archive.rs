//! Single-file archives
//!
//! An archive carries exactly the closure of content reachable from the
//! requested roots. Reachability follows the schema of each blob:
//! graph objects reference their stored records, index objects their
//! partitions, records their typed link targets. Blobs without a known
//! schema are leaves. Import re-hashes every blob and refuses anything
//! whose bytes no longer match their id.

use super::codec::{
    self, StoredGraph, StoredGraphIndex, StoredRecord, GRAPH_INDEX_SCHEMA, GRAPH_SCHEMA,
    RECORD_SCHEMA,
};
use super::traits::{ContentId, ContentStore};
use crate::error::{LineageError, LineageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet, VecDeque};

/// Format version written into every archive
pub const ARCHIVE_VERSION: u32 = 1;

/// A self-contained bundle of blobs plus the named roots to restore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    pub version: u32,
    pub roots: BTreeMap<String, ContentId>,
    pub blobs: Vec<ArchiveBlob>,
}

/// One blob in an archive, bytes hex encoded for JSON transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveBlob {
    pub id: ContentId,
    pub data: String,
}

/// Content ids a blob references, per its schema. Unknown or non-JSON
/// content references nothing.
fn references(bytes: &[u8]) -> Vec<ContentId> {
    let Ok(schema) = codec::schema_of(bytes) else {
        return Vec::new();
    };
    match schema.as_str() {
        RECORD_SCHEMA => codec::decode::<StoredRecord>(bytes, RECORD_SCHEMA)
            .map(|stored| stored.links.into_iter().map(|l| l.target).collect())
            .unwrap_or_default(),
        GRAPH_SCHEMA => codec::decode::<StoredGraph>(bytes, GRAPH_SCHEMA)
            .map(|stored| stored.record_cids.into_values().collect())
            .unwrap_or_default(),
        GRAPH_INDEX_SCHEMA => codec::decode::<StoredGraphIndex>(bytes, GRAPH_INDEX_SCHEMA)
            .map(|stored| {
                stored
                    .partitions
                    .into_iter()
                    .chain(stored.record_cids.into_values())
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Bundle the closure of the given roots into an archive. The result
/// contains every blob reachable from a root and nothing else.
pub fn export_archive(
    store: &dyn ContentStore,
    roots: &[(String, ContentId)],
) -> LineageResult<Archive> {
    let mut seen: HashSet<ContentId> = HashSet::new();
    let mut queue: VecDeque<ContentId> = VecDeque::new();
    for (_, id) in roots {
        if seen.insert(id.clone()) {
            queue.push_back(id.clone());
        }
    }

    let mut blobs = Vec::new();
    while let Some(id) = queue.pop_front() {
        let bytes = match store.get(&id) {
            Ok(bytes) => bytes,
            Err(super::traits::StorageError::ContentNotFound(missing)) => {
                return Err(LineageError::not_found(format!("content id {missing}")))
            }
            Err(e) => return Err(e.into()),
        };
        for referenced in references(&bytes) {
            if seen.insert(referenced.clone()) {
                queue.push_back(referenced);
            }
        }
        blobs.push(ArchiveBlob {
            id,
            data: hex::encode(&bytes),
        });
    }
    blobs.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Archive {
        version: ARCHIVE_VERSION,
        roots: roots.iter().cloned().collect(),
        blobs,
    })
}

/// Restore an archive into a store: verify and put every blob, then
/// point the named roots. Returns the number of blobs written.
pub fn import_archive(store: &dyn ContentStore, archive: &Archive) -> LineageResult<usize> {
    if archive.version != ARCHIVE_VERSION {
        return Err(LineageError::MalformedRecord(format!(
            "unsupported archive version {}",
            archive.version
        )));
    }

    for blob in &archive.blobs {
        let bytes = hex::decode(&blob.data).map_err(|e| {
            LineageError::MalformedRecord(format!("archive blob {} is not hex: {e}", blob.id))
        })?;
        if ContentId::from_bytes(&bytes) != blob.id {
            return Err(LineageError::MalformedRecord(format!(
                "archive blob {} does not hash to its id",
                blob.id
            )));
        }
        store.put(&bytes)?;
    }

    for (name, id) in &archive.roots {
        if !store.has(id)? {
            return Err(LineageError::MalformedRecord(format!(
                "archive root {name} points outside the archive"
            )));
        }
        store.set_root(name, id)?;
    }
    Ok(archive.blobs.len())
}
