//! Node representation in the lineage graph

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Metadata, RecordId, RecordType};

use super::version::{DetailId, VersionId};

/// Unique identifier for a lineage node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<RecordId> for NodeId {
    fn from(id: RecordId) -> Self {
        Self(id.as_str().to_string())
    }
}

impl From<&RecordId> for NodeId {
    fn from(id: &RecordId) -> Self {
        Self(id.as_str().to_string())
    }
}

/// Node classification within the lineage graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum NodeKind {
    /// Node backed by a lineage record
    Record,
    /// Node representing a whole domain
    Domain,
    /// Synthetic node produced by clustering
    Cluster,
    /// Caller-defined node kind
    Custom(String),
}

impl NodeKind {
    pub fn as_label(&self) -> &str {
        match self {
            NodeKind::Record => "record",
            NodeKind::Domain => "domain",
            NodeKind::Cluster => "cluster",
            NodeKind::Custom(label) => label.as_str(),
        }
    }
}

/// A node in the lineage graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    /// Unique identifier
    pub id: NodeId,
    /// Node classification
    pub node_type: NodeKind,
    /// Entity this node tracks, when the node represents one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Record type when the node is backed by a record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    /// Free-form attributes
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// When the underlying event happened
    pub timestamp: DateTime<Utc>,
    /// Versions recorded against this node, in creation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub version_ids: Vec<VersionId>,
    /// Transformation details recorded against this node, in creation order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detail_ids: Vec<DetailId>,
}

impl LineageNode {
    /// Create a new node of the given kind
    pub fn new(node_type: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            node_type,
            entity_id: None,
            record_type: None,
            metadata: Metadata::new(),
            timestamp: Utc::now(),
            version_ids: Vec::new(),
            detail_ids: Vec::new(),
        }
    }

    /// Create a node with a fixed id
    pub fn with_id(id: impl Into<NodeId>, node_type: NodeKind) -> Self {
        Self {
            id: id.into(),
            ..Self::new(node_type)
        }
    }

    /// Set the tracked entity
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the backing record type
    pub fn with_record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    /// Add a metadata attribute
    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::record::MetaValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override the event timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Document this node belongs to, when one is recorded
    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get("document_id").and_then(|v| v.as_str())
    }

    /// Domain this node belongs to, when one is recorded
    pub fn domain_id(&self) -> Option<&str> {
        self.metadata.get("domain_id").and_then(|v| v.as_str())
    }
}
