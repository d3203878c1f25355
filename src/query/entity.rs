//! Entity-centric lineage extraction

use std::collections::HashSet;

use crate::analysis::SemanticAnalyzer;
use crate::graph::{LineageGraph, NodeId};

use super::subgraph::induced_subgraph;

/// Everything connected to one entity: the nodes tracking it, their
/// ancestors and descendants, plus any node the analyzer relates to
/// that set. An unknown entity yields an empty graph.
pub fn entity_lineage(
    graph: &LineageGraph,
    entity_id: &str,
    analyzer: &dyn SemanticAnalyzer,
    max_candidates: usize,
) -> LineageGraph {
    let mut included: HashSet<NodeId> = HashSet::new();
    for id in graph.entity_nodes(entity_id) {
        included.insert(id.clone());
        included.extend(graph.ancestors(id));
        included.extend(graph.descendants(id));
    }
    if !included.is_empty() {
        for pair in analyzer.related_pairs(graph, max_candidates) {
            if included.contains(&pair.left) {
                included.insert(pair.right.clone());
            } else if included.contains(&pair.right) {
                included.insert(pair.left.clone());
            }
        }
    }
    induced_subgraph(graph, &included, None)
}
