//! Document clustering
//!
//! Documents become nodes of an undirected co-occurrence graph whose
//! edge weights count the lineage links crossing between each document
//! pair. The co-occurrence graph is partitioned with a greedy
//! modularity pass (Louvain-style) or, when configured, plain
//! connected components. Cluster ids are assigned by each cluster's
//! smallest member document, so the same graph always clusters the
//! same way.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::config::ClusterAlgorithm;
use crate::graph::LineageGraph;
use crate::record::MetaValue;

const MAX_ITERATIONS: usize = 100;

/// Result of a clustering pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterReport {
    pub algorithm: ClusterAlgorithm,
    /// Cluster id to member documents, members sorted
    pub clusters: BTreeMap<String, Vec<String>>,
    /// Document id to its cluster id
    pub document_clusters: BTreeMap<String, String>,
}

impl ClusterReport {
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Cluster containing the given document, when it was clustered.
    pub fn cluster_of(&self, document_id: &str) -> Option<&str> {
        self.document_clusters.get(document_id).map(String::as_str)
    }

    /// Write each node's cluster id into its metadata. Overwrites the
    /// same key on re-application; nodes without a document are left
    /// alone.
    pub fn apply(&self, graph: &mut LineageGraph) {
        let assignments: Vec<(crate::graph::NodeId, String)> = graph
            .nodes()
            .filter_map(|node| {
                let doc = node.document_id()?;
                let cluster = self.document_clusters.get(doc)?;
                Some((node.id.clone(), cluster.clone()))
            })
            .collect();
        for (node_id, cluster) in assignments {
            graph.set_node_attribute(&node_id, "cluster_id", MetaValue::String(cluster));
        }
    }
}

/// Partition the documents of a graph into clusters.
///
/// Documents never touched by a cross-document link end up as
/// singleton clusters under both algorithms.
pub fn detect_clusters(graph: &LineageGraph, algorithm: ClusterAlgorithm) -> ClusterReport {
    let (co_graph, _index) = co_occurrence(graph);
    let assignment = match algorithm {
        ClusterAlgorithm::Louvain => louvain(&co_graph),
        ClusterAlgorithm::ConnectedComponents => connected_components(&co_graph),
    };

    // Group by community, then relabel by smallest member
    let mut groups: HashMap<usize, BTreeSet<String>> = HashMap::new();
    for (node, community) in assignment {
        if let Some(doc) = co_graph.node_weight(node) {
            groups.entry(community).or_default().insert(doc.clone());
        }
    }
    let mut ordered: Vec<BTreeSet<String>> = groups.into_values().collect();
    ordered.sort_by(|a, b| a.iter().next().cmp(&b.iter().next()));

    let mut clusters = BTreeMap::new();
    let mut document_clusters = BTreeMap::new();
    for (index, members) in ordered.into_iter().enumerate() {
        let cluster_id = format!("cluster_{index}");
        for doc in &members {
            document_clusters.insert(doc.clone(), cluster_id.clone());
        }
        clusters.insert(cluster_id, members.into_iter().collect());
    }
    ClusterReport {
        algorithm,
        clusters,
        document_clusters,
    }
}

/// Build the undirected document co-occurrence graph. Nodes are added
/// in sorted document order so indices are stable across runs.
fn co_occurrence(graph: &LineageGraph) -> (UnGraph<String, f64>, HashMap<String, NodeIndex>) {
    let mut co_graph: UnGraph<String, f64> = UnGraph::new_undirected();
    let mut index: HashMap<String, NodeIndex> = HashMap::new();

    let mut documents: Vec<&str> = graph.nodes().filter_map(|n| n.document_id()).collect();
    documents.sort_unstable();
    documents.dedup();
    for doc in documents {
        let idx = co_graph.add_node(doc.to_string());
        index.insert(doc.to_string(), idx);
    }

    let mut weights: BTreeMap<(String, String), f64> = BTreeMap::new();
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
        let key = if source_doc < target_doc {
            (source_doc.to_string(), target_doc.to_string())
        } else {
            (target_doc.to_string(), source_doc.to_string())
        };
        *weights.entry(key).or_insert(0.0) += 1.0;
    }
    for ((a, b), weight) in weights {
        co_graph.add_edge(index[&a], index[&b], weight);
    }
    (co_graph, index)
}

/// Single-level greedy modularity maximization over the weighted
/// co-occurrence graph. Nodes are visited in index order and moved to
/// the neighboring community with the best positive gain until a full
/// sweep changes nothing.
fn louvain(graph: &UnGraph<String, f64>) -> HashMap<NodeIndex, usize> {
    let mut community: HashMap<NodeIndex, usize> = graph
        .node_indices()
        .enumerate()
        .map(|(i, idx)| (idx, i))
        .collect();

    let m: f64 = graph.edge_references().map(|e| *e.weight()).sum();
    if m == 0.0 {
        return community;
    }

    let strength: HashMap<NodeIndex, f64> = graph
        .node_indices()
        .map(|idx| (idx, graph.edges(idx).map(|e| *e.weight()).sum()))
        .collect();

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;

        for node in graph.node_indices() {
            let current = community[&node];
            let node_strength = strength[&node];

            let mut weight_to: BTreeMap<usize, f64> = BTreeMap::new();
            for edge in graph.edges(node) {
                let neighbor = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                *weight_to.entry(community[&neighbor]).or_insert(0.0) += *edge.weight();
            }

            let mut best = current;
            let mut best_gain = 0.0;
            for (&candidate, &weight) in &weight_to {
                if candidate == current {
                    continue;
                }
                let candidate_strength: f64 = graph
                    .node_indices()
                    .filter(|idx| community[idx] == candidate)
                    .map(|idx| strength[&idx])
                    .sum();
                let gain = weight / m - node_strength * candidate_strength / (2.0 * m * m);
                if gain > best_gain {
                    best_gain = gain;
                    best = candidate;
                }
            }

            if best != current {
                community.insert(node, best);
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }
    community
}

fn connected_components(graph: &UnGraph<String, f64>) -> HashMap<NodeIndex, usize> {
    let components = petgraph::algo::kosaraju_scc(graph);
    let mut assignment = HashMap::new();
    for (community, component) in components.into_iter().enumerate() {
        for node in component {
            assignment.insert(node, community);
        }
    }
    assignment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LineageLink, LineageNode, NodeId, NodeKind};

    fn doc_node(graph: &mut LineageGraph, id: &str, doc: &str) -> NodeId {
        let node =
            LineageNode::with_id(id, NodeKind::Record).with_attribute("document_id", doc);
        let node_id = node.id.clone();
        graph.insert_node_raw(node);
        node_id
    }

    fn link(graph: &mut LineageGraph, source: &NodeId, target: &NodeId) {
        graph.insert_link_raw(LineageLink::new(
            source.clone(),
            target.clone(),
            "derived_from",
        ));
    }

    /// Two triangles of documents joined internally, never to each other.
    fn two_document_groups() -> LineageGraph {
        let mut graph = LineageGraph::new();
        let a = doc_node(&mut graph, "a", "doc-a");
        let b = doc_node(&mut graph, "b", "doc-b");
        let c = doc_node(&mut graph, "c", "doc-c");
        let x = doc_node(&mut graph, "x", "doc-x");
        let y = doc_node(&mut graph, "y", "doc-y");
        let z = doc_node(&mut graph, "z", "doc-z");
        link(&mut graph, &a, &b);
        link(&mut graph, &b, &c);
        link(&mut graph, &a, &c);
        link(&mut graph, &x, &y);
        link(&mut graph, &y, &z);
        link(&mut graph, &x, &z);
        graph
    }

    #[test]
    fn connected_components_split_disjoint_groups() {
        let graph = two_document_groups();
        let report = detect_clusters(&graph, ClusterAlgorithm::ConnectedComponents);
        assert_eq!(report.cluster_count(), 2);
        assert_eq!(report.cluster_of("doc-a"), report.cluster_of("doc-b"));
        assert_ne!(report.cluster_of("doc-a"), report.cluster_of("doc-x"));
    }

    #[test]
    fn louvain_splits_disjoint_groups() {
        let graph = two_document_groups();
        let report = detect_clusters(&graph, ClusterAlgorithm::Louvain);
        assert!(report.cluster_count() >= 2);
        assert_ne!(report.cluster_of("doc-a"), report.cluster_of("doc-x"));
    }

    #[test]
    fn untouched_documents_become_singletons() {
        let mut graph = LineageGraph::new();
        doc_node(&mut graph, "a", "doc-a");
        doc_node(&mut graph, "b", "doc-b");
        let report = detect_clusters(&graph, ClusterAlgorithm::Louvain);
        assert_eq!(report.cluster_count(), 2);
    }

    #[test]
    fn cluster_ids_are_stable_across_runs() {
        let graph = two_document_groups();
        let first = detect_clusters(&graph, ClusterAlgorithm::ConnectedComponents);
        let second = detect_clusters(&graph, ClusterAlgorithm::ConnectedComponents);
        assert_eq!(first, second);
        // Relabeled by smallest member, so doc-a's group is cluster_0
        assert_eq!(first.cluster_of("doc-a"), Some("cluster_0"));
        assert_eq!(first.cluster_of("doc-x"), Some("cluster_1"));
    }

    #[test]
    fn apply_writes_cluster_ids_onto_nodes() {
        let mut graph = two_document_groups();
        let report = detect_clusters(&graph, ClusterAlgorithm::ConnectedComponents);
        report.apply(&mut graph);
        let node = graph.node(&NodeId::from("a")).unwrap();
        assert_eq!(
            node.metadata.get("cluster_id"),
            Some(&MetaValue::String("cluster_0".to_string()))
        );
    }

    #[test]
    fn empty_graph_clusters_to_nothing() {
        let graph = LineageGraph::new();
        let report = detect_clusters(&graph, ClusterAlgorithm::Louvain);
        assert_eq!(report.cluster_count(), 0);
    }
}
