//! Links between lineage nodes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::Metadata;

use super::node::NodeId;

/// Suffix appended to the relationship of the reverse edge of a
/// bidirectional link.
pub const INVERSE_SUFFIX: &str = "_inverse";

/// Direction requested when creating a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkDirection {
    /// Store the link as given
    #[default]
    Forward,
    /// Store the link with source and target swapped
    Backward,
    /// Store the link as given plus a reverse link with an
    /// `_inverse`-suffixed relationship
    Bidirectional,
}

/// Identity of a link: one edge per (source, target, relationship) triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: String,
}

impl LinkKey {
    pub fn new(source: NodeId, target: NodeId, relationship: impl Into<String>) -> Self {
        Self {
            source,
            target,
            relationship: relationship.into(),
        }
    }

    /// Key of the reverse edge for a bidirectional link
    pub fn inverse(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            relationship: format!("{}{}", self.relationship, INVERSE_SUFFIX),
        }
    }
}

impl std::fmt::Display for LinkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-[{}]->{}", self.source, self.relationship, self.target)
    }
}

/// A directed, typed link between two lineage nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageLink {
    /// Origin node
    pub source: NodeId,
    /// Destination node
    pub target: NodeId,
    /// Relationship type (e.g. "derived_from", "contains")
    pub relationship: String,
    /// Strength of the relationship in [0.0, 1.0]
    pub confidence: f64,
    /// Free-form attributes
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
    /// When the link was recorded
    pub timestamp: DateTime<Utc>,
}

impl LineageLink {
    /// Create a link with full confidence
    pub fn new(source: NodeId, target: NodeId, relationship: impl Into<String>) -> Self {
        Self {
            source,
            target,
            relationship: relationship.into(),
            confidence: 1.0,
            metadata: Metadata::new(),
            timestamp: Utc::now(),
        }
    }

    /// Set the confidence, clamped to [0.0, 1.0]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
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

    /// Override the recorded timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Identity of this link
    pub fn key(&self) -> LinkKey {
        LinkKey::new(
            self.source.clone(),
            self.target.clone(),
            self.relationship.clone(),
        )
    }

    /// Reversed copy of this link, used for bidirectional storage
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
            relationship: format!("{}{}", self.relationship, INVERSE_SUFFIX),
            confidence: self.confidence,
            metadata: self.metadata.clone(),
            timestamp: self.timestamp,
        }
    }
}
