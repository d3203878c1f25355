//! Whole-graph summary report
//!
//! Composes the individual analysis passes into one [`LineageReport`],
//! the shape the tracker and CLI hand to callers.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::graph::LineageGraph;

use super::boundary::{analyze_boundaries, BoundaryReport};
use super::cluster::{detect_clusters, ClusterReport};
use super::metrics::{betweenness_centrality, critical_paths_with, CriticalPath};
use super::semantic::{analyze_semantics, SemanticReport};

/// Node and link counts plus document coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub node_count: usize,
    pub link_count: usize,
    pub document_count: usize,
    pub cross_document_links: usize,
    /// Share of links that cross documents, zero on an edgeless graph
    pub cross_document_ratio: f64,
}

/// Earliest and latest event timestamps and the span between them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAnalysis {
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
    /// Zero when the graph is empty
    pub span_seconds: f64,
}

/// Full analysis output for one graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageReport {
    pub basic: BasicMetrics,
    pub boundaries: BoundaryReport,
    pub semantics: SemanticReport,
    pub clusters: ClusterReport,
    pub critical_paths: Vec<CriticalPath>,
    pub time: TimeAnalysis,
}

/// Counts derived from the graph and an existing boundary report.
pub fn basic_metrics(graph: &LineageGraph, boundaries: &BoundaryReport) -> BasicMetrics {
    let documents: HashSet<&str> = graph.nodes().filter_map(|n| n.document_id()).collect();
    let link_count = graph.link_count();
    BasicMetrics {
        node_count: graph.node_count(),
        link_count,
        document_count: documents.len(),
        cross_document_links: boundaries.total,
        cross_document_ratio: if link_count == 0 {
            0.0
        } else {
            boundaries.total as f64 / link_count as f64
        },
    }
}

/// Span of node timestamps. Both endpoints are `None` on an empty graph.
pub fn time_analysis(graph: &LineageGraph) -> TimeAnalysis {
    let mut earliest: Option<DateTime<Utc>> = None;
    let mut latest: Option<DateTime<Utc>> = None;
    for node in graph.nodes() {
        earliest = Some(match earliest {
            Some(current) if current <= node.timestamp => current,
            _ => node.timestamp,
        });
        latest = Some(match latest {
            Some(current) if current >= node.timestamp => current,
            _ => node.timestamp,
        });
    }
    let span_seconds = match (earliest, latest) {
        (Some(first), Some(last)) => (last - first).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };
    TimeAnalysis {
        earliest,
        latest,
        span_seconds,
    }
}

/// Run every analysis pass and collect the results.
pub fn analyze_graph(graph: &LineageGraph, config: &TrackerConfig) -> LineageReport {
    let boundaries = analyze_boundaries(graph);
    let semantics = analyze_semantics(graph);
    let clusters = detect_clusters(graph, config.cluster_algorithm);
    let centrality = betweenness_centrality(graph);
    let critical_paths = critical_paths_with(graph, &centrality);
    LineageReport {
        basic: basic_metrics(graph, &boundaries),
        boundaries,
        semantics,
        clusters,
        critical_paths,
        time: time_analysis(graph),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LineageLink, LineageNode, NodeId, NodeKind};
    use chrono::TimeZone;

    #[test]
    fn empty_graph_report_is_all_zero() {
        let report = analyze_graph(&LineageGraph::new(), &TrackerConfig::default());
        assert_eq!(report.basic.node_count, 0);
        assert_eq!(report.boundaries.total, 0);
        assert_eq!(report.time.earliest, None);
        assert_eq!(report.time.span_seconds, 0.0);
        assert!(report.critical_paths.is_empty());
    }

    #[test]
    fn report_counts_documents_and_boundaries() {
        let mut graph = LineageGraph::new();
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        graph.insert_node_raw(
            LineageNode::with_id("a", NodeKind::Record)
                .with_attribute("document_id", "doc-1")
                .with_timestamp(t0),
        );
        graph.insert_node_raw(
            LineageNode::with_id("b", NodeKind::Record)
                .with_attribute("document_id", "doc-2")
                .with_timestamp(t0 + chrono::Duration::seconds(90)),
        );
        graph.insert_link_raw(LineageLink::new(
            NodeId::from("a"),
            NodeId::from("b"),
            "derived_from",
        ));

        let report = analyze_graph(&graph, &TrackerConfig::default());
        assert_eq!(report.basic.node_count, 2);
        assert_eq!(report.basic.document_count, 2);
        assert_eq!(report.basic.cross_document_links, 1);
        assert!((report.basic.cross_document_ratio - 1.0).abs() < 1e-9);
        assert_eq!(report.semantics.by_category.get("causal"), Some(&1));
        assert_eq!(report.time.span_seconds, 90.0);
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut graph = LineageGraph::new();
        graph.insert_node_raw(
            LineageNode::with_id("a", NodeKind::Record).with_attribute("document_id", "doc-1"),
        );
        let report = analyze_graph(&graph, &TrackerConfig::default());
        let json = serde_json::to_string(&report).unwrap();
        let back: LineageReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
