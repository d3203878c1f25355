//! On-disk envelope shapes for stored records and graphs
//!
//! Every stored blob is a JSON object carrying a `schema` discriminator
//! so readers can dispatch on content kind before committing to a full
//! decode. Unknown or missing schemas decode to `MalformedRecord`, never
//! to a panic or a generic serde error.

use super::traits::ContentId;
use crate::error::{LineageError, LineageResult};
use crate::graph::{GraphSnapshot, LineageBoundary, LineageDomain, LineageLink, NodeId};
use crate::record::{Metadata, Record};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema tag for a single stored record
pub const RECORD_SCHEMA: &str = "lineage_record";
/// Schema tag for a whole graph stored as one object
pub const GRAPH_SCHEMA: &str = "lineage_graph";
/// Schema tag for one partition of a partitioned graph
pub const PARTITION_SCHEMA: &str = "lineage_partition";
/// Schema tag for the index object of a partitioned graph
pub const GRAPH_INDEX_SCHEMA: &str = "lineage_graph_index";

/// A named reference from one stored blob to another. Names follow the
/// `input/<entity>` and `output/<entity>` convention so traversal can
/// pick a direction from the prefix alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedLink {
    pub name: String,
    pub target: ContentId,
}

impl TypedLink {
    pub fn new(name: impl Into<String>, target: ContentId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// The part of the name before the first `/`.
    pub fn prefix(&self) -> &str {
        self.name.split('/').next().unwrap_or("")
    }
}

/// Stored form of one record: the record itself plus typed links to the
/// records that produced its inputs and to the entity's previous
/// producer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    pub schema: String,
    pub record: Record,
    #[serde(default)]
    pub links: Vec<TypedLink>,
}

impl StoredRecord {
    pub fn new(record: Record, links: Vec<TypedLink>) -> Self {
        Self {
            schema: RECORD_SCHEMA.to_string(),
            record,
            links,
        }
    }
}

/// Stored form of an unpartitioned graph: the full snapshot, the map
/// from record id to stored-record content id, and the zero in-degree
/// roots for quick top-of-lineage lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredGraph {
    pub schema: String,
    pub snapshot: GraphSnapshot,
    #[serde(default)]
    pub record_cids: BTreeMap<String, ContentId>,
    #[serde(default)]
    pub roots: Vec<NodeId>,
}

/// One slice of a partitioned graph: its nodes, the links internal to
/// the slice, and the nodes with links reaching into other slices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPartition {
    pub schema: String,
    pub index: usize,
    pub snapshot: GraphSnapshot,
    #[serde(default)]
    pub boundary_nodes: Vec<NodeId>,
}

/// Root object of a partitioned graph: partition content ids plus
/// everything that spans partitions (cross links, domains, boundaries,
/// graph metadata) and the same record/root bookkeeping a whole-graph
/// object carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredGraphIndex {
    pub schema: String,
    pub partitions: Vec<ContentId>,
    #[serde(default)]
    pub cross_links: Vec<LineageLink>,
    #[serde(default)]
    pub domains: Vec<LineageDomain>,
    #[serde(default)]
    pub boundaries: Vec<LineageBoundary>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub record_cids: BTreeMap<String, ContentId>,
    #[serde(default)]
    pub roots: Vec<NodeId>,
}

/// Read the schema discriminator off stored bytes without decoding the
/// rest.
pub fn schema_of(bytes: &[u8]) -> LineageResult<String> {
    let value: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| LineageError::MalformedRecord(format!("stored content is not JSON: {e}")))?;
    value
        .get("schema")
        .and_then(|s| s.as_str())
        .map(str::to_string)
        .ok_or_else(|| LineageError::MalformedRecord("stored content has no schema tag".to_string()))
}

/// Decode stored bytes after checking their schema tag matches the
/// expected one.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], expected_schema: &str) -> LineageResult<T> {
    let schema = schema_of(bytes)?;
    if schema != expected_schema {
        return Err(LineageError::MalformedRecord(format!(
            "expected schema {expected_schema}, found {schema}"
        )));
    }
    serde_json::from_slice(bytes).map_err(|e| {
        LineageError::MalformedRecord(format!("stored {expected_schema} failed to decode: {e}"))
    })
}
