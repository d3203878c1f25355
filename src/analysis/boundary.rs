//! Document boundary detection
//!
//! Walks every link and compares the `document_id` of its two endpoint
//! nodes. A link whose endpoints belong to different documents is a
//! boundary edge. Each boundary edge is classified by an explicit
//! `boundary_type` attribute on the link when present, otherwise by
//! naming-convention markers inside the document ids themselves.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::{BoundaryType, LineageGraph, LineageLink, NodeId};
use crate::record::{MetaValue, Metadata};

/// One cross-document link found by [`analyze_boundaries`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: String,
    pub source_document: String,
    pub target_document: String,
    pub boundary_type: BoundaryType,
}

/// Aggregate result of a boundary pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryReport {
    /// Number of cross-document links
    pub total: usize,
    /// Count per boundary type label
    pub by_type: BTreeMap<String, usize>,
    /// Every boundary edge, sorted by (source, target, relationship)
    pub edges: Vec<BoundaryEdge>,
}

impl BoundaryReport {
    /// Write the aggregate counts into a metadata map. Re-applying the
    /// same report overwrites the same keys, so repeated application
    /// converges.
    pub fn apply_to(&self, metadata: &mut Metadata) {
        metadata.insert(
            "boundary_count".to_string(),
            MetaValue::Int(self.total as i64),
        );
        let histogram: BTreeMap<String, MetaValue> = self
            .by_type
            .iter()
            .map(|(label, count)| (label.clone(), MetaValue::Int(*count as i64)))
            .collect();
        metadata.insert("boundary_types".to_string(), MetaValue::Object(histogram));
    }
}

/// Find every link whose endpoints belong to different documents.
///
/// Nodes without a `document_id` never contribute boundary edges. The
/// pass only reads the graph, so running it twice on the same graph
/// produces identical reports.
pub fn analyze_boundaries(graph: &LineageGraph) -> BoundaryReport {
    let mut edges = Vec::new();
    for link in graph.links() {
        let Some(source_doc) = graph.node(&link.source).and_then(|n| n.document_id()) else {
            continue;
        };
        let Some(target_doc) = graph.node(&link.target).and_then(|n| n.document_id()) else {
            continue;
        };
        if source_doc == target_doc {
            continue;
        }
        let boundary_type =
            explicit_type(link).unwrap_or_else(|| infer_type(source_doc, target_doc));
        edges.push(BoundaryEdge {
            source: link.source.clone(),
            target: link.target.clone(),
            relationship: link.relationship.clone(),
            source_document: source_doc.to_string(),
            target_document: target_doc.to_string(),
            boundary_type,
        });
    }
    edges.sort_by(|a, b| {
        (&a.source, &a.target, &a.relationship).cmp(&(&b.source, &b.target, &b.relationship))
    });

    let mut by_type = BTreeMap::new();
    for edge in &edges {
        *by_type
            .entry(edge.boundary_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    BoundaryReport {
        total: edges.len(),
        by_type,
        edges,
    }
}

fn explicit_type(link: &LineageLink) -> Option<BoundaryType> {
    link.metadata
        .get("boundary_type")
        .and_then(|v| v.as_str())
        .and_then(|s| BoundaryType::from_str(s).ok())
}

/// Classify a boundary from naming-convention markers in the document
/// ids. This only understands ids shaped like `org:acme/dataset:sales`;
/// anything else comes back [`BoundaryType::Unknown`]. Prefer an
/// explicit `boundary_type` link attribute over relying on id shapes.
fn infer_type(source_doc: &str, target_doc: &str) -> BoundaryType {
    if differs_after_marker(source_doc, target_doc, "org:") {
        return BoundaryType::Organization;
    }
    if differs_after_marker(source_doc, target_doc, "system:") {
        return BoundaryType::System;
    }
    if source_doc.contains("dataset:") && target_doc.contains("dataset:") {
        return BoundaryType::Dataset;
    }
    BoundaryType::Unknown
}

/// True when both ids carry the marker and the value following it
/// differs. The value runs to the next `/` or the end of the id.
fn differs_after_marker(a: &str, b: &str, marker: &str) -> bool {
    match (marker_value(a, marker), marker_value(b, marker)) {
        (Some(va), Some(vb)) => va != vb,
        _ => false,
    }
}

fn marker_value<'a>(doc: &'a str, marker: &str) -> Option<&'a str> {
    let start = doc.find(marker)? + marker.len();
    doc[start..].split('/').next()
}
