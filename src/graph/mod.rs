//! Core lineage graph data structures

mod domain;
mod link;
mod node;
mod store;
mod version;

#[cfg(test)]
mod tests;

pub use domain::{
    BoundaryConstraint, BoundaryId, BoundaryType, DomainId, LineageBoundary, LineageDomain,
};
pub use link::{LineageLink, LinkDirection, LinkKey, INVERSE_SUFFIX};
pub use node::{LineageNode, NodeId, NodeKind};
pub use store::{GraphSnapshot, LineageGraph};
pub use version::{DetailId, ImpactLevel, LineageVersion, TransformationDetail, VersionId};
