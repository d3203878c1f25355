//! Node versions and field-level transformation details

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Metadata;

use super::node::NodeId;

/// Unique identifier for a node version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a transformation detail
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailId(String);

impl DetailId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DetailId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DetailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Granularity at which a transformation changed its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    /// Individual field values changed
    Field,
    /// Whole records changed
    #[default]
    Record,
    /// The dataset as a whole changed (schema, partitioning)
    Dataset,
}

impl ImpactLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Field => "field",
            ImpactLevel::Record => "record",
            ImpactLevel::Dataset => "dataset",
        }
    }
}

impl std::fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded version of a node's underlying entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageVersion {
    pub id: VersionId,
    /// Node this version belongs to
    pub node_id: NodeId,
    /// Caller-assigned version label, unique per node
    pub version_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_version_id: Option<VersionId>,
    pub change_description: String,
    pub creator_id: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl LineageVersion {
    pub fn new(
        node_id: NodeId,
        version_number: impl Into<String>,
        change_description: impl Into<String>,
        creator_id: impl Into<String>,
    ) -> Self {
        Self {
            id: VersionId::new(),
            node_id,
            version_number: version_number.into(),
            parent_version_id: None,
            change_description: change_description.into(),
            creator_id: creator_id.into(),
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }
}

/// Field-level description of what a transformation did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationDetail {
    pub id: DetailId,
    /// Transformation node this detail belongs to
    pub transformation_id: NodeId,
    /// Operation performed (e.g. "normalize", "join")
    pub operation_type: String,
    /// Input field mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    /// Output field mappings
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub parameters: Metadata,
    pub impact_level: ImpactLevel,
    /// Confidence in the recorded mapping, in [0.0, 1.0]
    pub confidence: f64,
}

impl TransformationDetail {
    pub fn new(transformation_id: NodeId, operation_type: impl Into<String>) -> Self {
        Self {
            id: DetailId::new(),
            transformation_id,
            operation_type: operation_type.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Metadata::new(),
            impact_level: ImpactLevel::default(),
            confidence: 1.0,
        }
    }
}
