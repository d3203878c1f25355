//! Visualization style hints
//!
//! Analysis results become a renderer-agnostic `VizGraph`: nodes and
//! edges with resolved colors and line styles. Edge color follows the
//! semantic category, cross-document edges render dashed. Actual
//! drawing is a `Renderer` capability; the default renderer draws
//! nothing, so a missing graphics backend degrades to "no picture"
//! instead of an error.

use crate::analysis::{BoundaryReport, SemanticCategory, SemanticReport};
use crate::graph::{LineageGraph, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Edge color per semantic category
pub fn category_color(category: SemanticCategory) -> &'static str {
    match category {
        SemanticCategory::Causal => "#e15759",
        SemanticCategory::Structural => "#4e79a7",
        SemanticCategory::Temporal => "#f28e2b",
        SemanticCategory::Semantic => "#76b7b2",
        SemanticCategory::Unknown => "#bab0ac",
    }
}

/// Node fill per node kind
fn kind_color(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Record => "#59a14f",
        NodeKind::Domain => "#edc948",
        NodeKind::Cluster => "#b07aa1",
        NodeKind::Custom(_) => "#9c755f",
    }
}

/// Style-resolved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizNode {
    pub id: String,
    pub label: String,
    pub color: String,
}

/// Style-resolved edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VizEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub color: String,
    /// "solid" or "dashed"; dashed marks cross-document edges
    pub style: String,
}

/// A graph with all styling decisions already made
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizGraph {
    pub nodes: Vec<VizNode>,
    pub edges: Vec<VizEdge>,
}

/// Resolve styles for a graph from its boundary and semantic reports.
/// Output order matches snapshot order, so repeated builds are
/// identical.
pub fn build_viz(
    graph: &LineageGraph,
    boundaries: &BoundaryReport,
    semantics: &SemanticReport,
) -> VizGraph {
    let crossing: HashSet<(&str, &str, &str)> = boundaries
        .edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str(), e.relationship.as_str()))
        .collect();

    let snapshot = graph.snapshot();
    let nodes = snapshot
        .nodes
        .iter()
        .map(|node| VizNode {
            id: node.id.to_string(),
            label: node
                .entity_id
                .clone()
                .unwrap_or_else(|| node.id.to_string()),
            color: kind_color(&node.node_type).to_string(),
        })
        .collect();

    let edges = snapshot
        .links
        .iter()
        .map(|link| {
            let category = semantics
                .category_of(&link.source, &link.target, &link.relationship)
                .unwrap_or_default();
            let dashed = crossing.contains(&(
                link.source.as_str(),
                link.target.as_str(),
                link.relationship.as_str(),
            ));
            VizEdge {
                source: link.source.to_string(),
                target: link.target.to_string(),
                label: link.relationship.clone(),
                color: category_color(category).to_string(),
                style: if dashed { "dashed" } else { "solid" }.to_string(),
            }
        })
        .collect();

    VizGraph { nodes, edges }
}

/// Capability for turning a [`VizGraph`] into image bytes
pub trait Renderer: Send + Sync {
    /// Output format name, e.g. "svg" or "png"
    fn format(&self) -> &'static str;

    /// Render the graph. `None` means this renderer cannot draw.
    fn render(&self, viz: &VizGraph) -> Option<Vec<u8>>;
}

/// Renderer used when no graphics backend is wired in
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRenderer;

impl Renderer for NoRenderer {
    fn format(&self) -> &'static str {
        "none"
    }

    fn render(&self, _viz: &VizGraph) -> Option<Vec<u8>> {
        None
    }
}
