//! Domains and the boundaries between them

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::Metadata;

/// Unique identifier for a domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainId(String);

impl DomainId {
    /// Create a new random DomainId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a DomainId from an existing string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DomainId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DomainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DomainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a domain boundary
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryId(String);

impl BoundaryId {
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

impl Default for BoundaryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of transition a boundary represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryType {
    Organization,
    System,
    Dataset,
    Domain,
    Temporal,
    Format,
    Security,
    PiiBoundary,
    PhiBoundary,
    InternationalTransfer,
    Unknown,
}

impl BoundaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryType::Organization => "organization",
            BoundaryType::System => "system",
            BoundaryType::Dataset => "dataset",
            BoundaryType::Domain => "domain",
            BoundaryType::Temporal => "temporal",
            BoundaryType::Format => "format",
            BoundaryType::Security => "security",
            BoundaryType::PiiBoundary => "pii_boundary",
            BoundaryType::PhiBoundary => "phi_boundary",
            BoundaryType::InternationalTransfer => "international_transfer",
            BoundaryType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BoundaryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "organization" => Ok(BoundaryType::Organization),
            "system" => Ok(BoundaryType::System),
            "dataset" => Ok(BoundaryType::Dataset),
            "domain" => Ok(BoundaryType::Domain),
            "temporal" => Ok(BoundaryType::Temporal),
            "format" => Ok(BoundaryType::Format),
            "security" => Ok(BoundaryType::Security),
            "pii_boundary" => Ok(BoundaryType::PiiBoundary),
            "phi_boundary" => Ok(BoundaryType::PhiBoundary),
            "international_transfer" => Ok(BoundaryType::InternationalTransfer),
            "unknown" => Ok(BoundaryType::Unknown),
            other => Err(format!("unknown boundary type: {other}")),
        }
    }
}

/// A rule enforced when data crosses a boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryConstraint {
    /// Rule name (e.g. "require_anonymization")
    pub name: String,
    /// Rule parameters
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub parameters: Metadata,
}

impl BoundaryConstraint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Metadata::new(),
        }
    }

    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<crate::record::MetaValue>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// A named grouping of lineage nodes
///
/// Domains form a tree via `parent_domain_id`; a domain can only be
/// parented on a domain that already exists, so cycles cannot form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageDomain {
    pub id: DomainId,
    pub name: String,
    /// Caller-defined classification (e.g. "organization", "pipeline")
    pub domain_type: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub attributes: Metadata,
    /// Expected shape of member-node metadata, as a free-form description
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata_schema: Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_domain_id: Option<DomainId>,
}

impl LineageDomain {
    pub fn new(name: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self {
            id: DomainId::new(),
            name: name.into(),
            domain_type: domain_type.into(),
            attributes: Metadata::new(),
            metadata_schema: Metadata::new(),
            parent_domain_id: None,
        }
    }
}

/// A declared transition between two domains
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageBoundary {
    pub id: BoundaryId,
    pub source_domain_id: DomainId,
    pub target_domain_id: DomainId,
    pub boundary_type: BoundaryType,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub attributes: Metadata,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<BoundaryConstraint>,
}

impl LineageBoundary {
    pub fn new(
        source_domain_id: DomainId,
        target_domain_id: DomainId,
        boundary_type: BoundaryType,
    ) -> Self {
        Self {
            id: BoundaryId::new(),
            source_domain_id,
            target_domain_id,
            boundary_type,
            attributes: Metadata::new(),
            constraints: Vec::new(),
        }
    }

    /// True when this boundary joins the two given domains, in either
    /// orientation.
    pub fn joins(&self, a: &DomainId, b: &DomainId) -> bool {
        (&self.source_domain_id == a && &self.target_domain_id == b)
            || (&self.source_domain_id == b && &self.target_domain_id == a)
    }
}
