//! Record variants and identity

use super::value::{MetaValue, Metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a record
///
/// Serializes as a plain string (UUID or semantic id like "rec:ingest-7").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create a new random RecordId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a RecordId from a string (semantic id)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The kind tag of a record, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Source,
    Transformation,
    Merge,
    Query,
    Verification,
    Annotation,
    ModelTraining,
    ModelInference,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Source => "source",
            RecordType::Transformation => "transformation",
            RecordType::Merge => "merge",
            RecordType::Query => "query",
            RecordType::Verification => "verification",
            RecordType::Annotation => "annotation",
            RecordType::ModelTraining => "model_training",
            RecordType::ModelInference => "model_inference",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(RecordType::Source),
            "transformation" => Ok(RecordType::Transformation),
            "merge" => Ok(RecordType::Merge),
            "query" => Ok(RecordType::Query),
            "verification" => Ok(RecordType::Verification),
            "annotation" => Ok(RecordType::Annotation),
            "model_training" => Ok(RecordType::ModelTraining),
            "model_inference" => Ok(RecordType::ModelInference),
            other => Err(format!("unknown record type: {}", other)),
        }
    }
}

/// Variant-specific payload, discriminated by `record_type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum RecordDetail {
    /// Raw data entering the pipeline.
    Source {
        source_type: String,
        format: String,
        location: String,
    },
    /// A derivation step applied by a tool.
    Transformation {
        transformation_type: String,
        tool: String,
        #[serde(default)]
        parameters: Metadata,
    },
    /// Several inputs combined into one output.
    Merge { strategy: String },
    /// A read against an entity, tracked for audit.
    Query { query_text: String },
    /// A validation run over an entity.
    Verification {
        pass_count: u32,
        fail_count: u32,
        is_valid: bool,
    },
    /// Free-form human or tool commentary attached to an entity.
    Annotation {
        annotation_type: String,
        content: String,
    },
    /// A model trained from input entities.
    ModelTraining {
        model_type: String,
        #[serde(default)]
        hyperparameters: Metadata,
    },
    /// A model applied to input entities.
    ModelInference { model_id: String },
}

impl RecordDetail {
    /// The kind tag for this variant.
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordDetail::Source { .. } => RecordType::Source,
            RecordDetail::Transformation { .. } => RecordType::Transformation,
            RecordDetail::Merge { .. } => RecordType::Merge,
            RecordDetail::Query { .. } => RecordType::Query,
            RecordDetail::Verification { .. } => RecordType::Verification,
            RecordDetail::Annotation { .. } => RecordType::Annotation,
            RecordDetail::ModelTraining { .. } => RecordType::ModelTraining,
            RecordDetail::ModelInference { .. } => RecordType::ModelInference,
        }
    }
}

/// A provenance record: one event in a pipeline's history.
///
/// `input_ids`/`output_ids` reference *entities* (datasets, models,
/// files), not other records; order is insertion order and matters only
/// for display. A record's outputs make it the latest producing record
/// for those entities in the graph store's entity index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub agent_id: String,
    #[serde(default)]
    pub input_ids: Vec<String>,
    #[serde(default)]
    pub output_ids: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(flatten)]
    pub detail: RecordDetail,
    /// Signature over `canonical_bytes()`; absent until explicitly signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl Record {
    /// Create a new record for the given agent and payload.
    pub fn new(agent_id: impl Into<String>, detail: RecordDetail) -> Self {
        Self {
            id: RecordId::new(),
            timestamp: Utc::now(),
            agent_id: agent_id.into(),
            input_ids: Vec::new(),
            output_ids: Vec::new(),
            description: String::new(),
            metadata: Metadata::new(),
            detail,
            signature: None,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a consumed entity id.
    pub fn with_input(mut self, entity_id: impl Into<String>) -> Self {
        self.input_ids.push(entity_id.into());
        self
    }

    /// Append a produced entity id.
    pub fn with_output(mut self, entity_id: impl Into<String>) -> Self {
        self.output_ids.push(entity_id.into());
        self
    }

    /// Add a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Override the creation timestamp (merges and tests need a fixed clock).
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The kind tag of this record.
    pub fn record_type(&self) -> RecordType {
        self.detail.record_type()
    }

    /// The document id used for boundary detection, when present.
    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get("document_id").and_then(|v| v.as_str())
    }

    /// Canonical serialization of every field except the signature.
    ///
    /// BTreeMap-backed metadata and fixed field order make this
    /// byte-stable, so the same record always signs and hashes the same.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let unsigned = Record {
            signature: None,
            ..self.clone()
        };
        serde_json::to_vec(&unsigned).unwrap_or_default()
    }
}
