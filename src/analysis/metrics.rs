//! Graph metrics
//!
//! Impact and dependency scores, betweenness centrality, upstream
//! complexity, and critical path extraction. All of these are pure
//! reads of the graph with deterministic results.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::graph::{LineageGraph, NodeId};
use crate::record::RecordType;

/// Minimum mean centrality for a source-to-sink path to count as critical
pub const CRITICAL_PATH_THRESHOLD: f64 = 0.1;

/// Fraction of the other nodes reachable downstream of `id`.
///
/// Lies in `[0, 1]` and is zero exactly when the node has no
/// descendants (or the graph has at most one node). Unknown ids score
/// zero.
pub fn impact_score(graph: &LineageGraph, id: &NodeId) -> f64 {
    ratio(graph, graph.descendants(id).len())
}

/// Fraction of the other nodes upstream of `id`. The mirror of
/// [`impact_score`]: the dependency score of a node equals its impact
/// score in the edge-reversed graph.
pub fn dependency_score(graph: &LineageGraph, id: &NodeId) -> f64 {
    ratio(graph, graph.ancestors(id).len())
}

fn ratio(graph: &LineageGraph, count: usize) -> f64 {
    let n = graph.node_count();
    if n <= 1 {
        0.0
    } else {
        count as f64 / (n - 1) as f64
    }
}

/// Betweenness centrality of every node.
///
/// Brandes' algorithm over unweighted shortest paths in the directed
/// graph, normalized by the `(n-1)(n-2)` ordered pairs that exclude
/// the node itself. Parallel links between the same pair of nodes
/// count as one edge here.
pub fn betweenness_centrality(graph: &LineageGraph) -> HashMap<NodeId, f64> {
    let mut ids: Vec<&NodeId> = graph.node_ids().collect();
    ids.sort_unstable();
    let n = ids.len();
    let mut centrality: HashMap<NodeId, f64> =
        ids.iter().map(|id| ((*id).clone(), 0.0)).collect();

    for &source in &ids {
        let mut stack: Vec<&NodeId> = Vec::new();
        let mut preds: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
        let mut sigma: HashMap<&NodeId, f64> = HashMap::new();
        let mut dist: HashMap<&NodeId, usize> = HashMap::new();
        sigma.insert(source, 1.0);
        dist.insert(source, 0);

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            let next_dist = dist[v] + 1;
            let sigma_v = sigma[v];
            for w in unique_successors(graph, v) {
                if !dist.contains_key(w) {
                    dist.insert(w, next_dist);
                    queue.push_back(w);
                }
                if dist[w] == next_dist {
                    *sigma.entry(w).or_insert(0.0) += sigma_v;
                    preds.entry(w).or_default().push(v);
                }
            }
        }

        let mut delta: HashMap<&NodeId, f64> = HashMap::new();
        while let Some(w) = stack.pop() {
            let coefficient = (1.0 + delta.get(w).copied().unwrap_or(0.0)) / sigma[w];
            if let Some(parents) = preds.get(w) {
                for &v in parents {
                    *delta.entry(v).or_insert(0.0) += sigma[&v] * coefficient;
                }
            }
            if w != source {
                if let Some(value) = centrality.get_mut(w) {
                    *value += delta.get(w).copied().unwrap_or(0.0);
                }
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for value in centrality.values_mut() {
            *value *= scale;
        }
    }
    centrality
}

/// Betweenness centrality restricted to nodes of one record type.
pub fn betweenness_for_type(
    graph: &LineageGraph,
    record_type: &RecordType,
) -> HashMap<NodeId, f64> {
    let mut centrality = betweenness_centrality(graph);
    centrality.retain(|id, _| {
        graph.node(id).and_then(|n| n.record_type.as_ref()) == Some(record_type)
    });
    centrality
}

fn unique_successors<'a>(graph: &'a LineageGraph, id: &NodeId) -> Vec<&'a NodeId> {
    let mut seen = HashSet::new();
    graph
        .successors(id)
        .filter(|target| seen.insert(*target))
        .collect()
}

fn unique_predecessors<'a>(graph: &'a LineageGraph, id: &NodeId) -> Vec<&'a NodeId> {
    let mut seen = HashSet::new();
    graph
        .predecessors(id)
        .filter(|source| seen.insert(*source))
        .collect()
}

/// Upstream complexity of one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub node_id: NodeId,
    /// Nodes in the upstream closure, the node itself included
    pub node_count: usize,
    /// Links with both endpoints in the closure
    pub edge_count: usize,
    /// Longest acyclic upstream chain, in edges
    pub max_depth: usize,
    /// Count per record type (or node kind) label
    pub node_types: BTreeMap<String, usize>,
    /// Set when the node does not exist; all counts are zero then
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Measure the upstream closure of `id`: its ancestors plus itself.
///
/// A missing node yields a report with `error` set instead of
/// failing, so batch callers can collect mixed results. An isolated
/// node reports `node_count == 1` and `max_depth == 0`.
pub fn complexity(graph: &LineageGraph, id: &NodeId) -> ComplexityReport {
    if !graph.has_node(id) {
        return ComplexityReport {
            node_id: id.clone(),
            node_count: 0,
            edge_count: 0,
            max_depth: 0,
            node_types: BTreeMap::new(),
            error: Some(format!("node does not exist: {id}")),
        };
    }

    let mut members = graph.ancestors(id);
    members.insert(id.clone());

    let edge_count = graph
        .links()
        .filter(|link| members.contains(&link.source) && members.contains(&link.target))
        .count();

    let mut node_types = BTreeMap::new();
    for member in &members {
        if let Some(node) = graph.node(member) {
            let label = node
                .record_type
                .as_ref()
                .map(|t| t.as_str().to_string())
                .unwrap_or_else(|| node.node_type.as_label().to_string());
            *node_types.entry(label).or_insert(0) += 1;
        }
    }

    let mut memo = HashMap::new();
    let mut on_stack = HashSet::new();
    let max_depth = longest_chain(graph, id, &members, &mut memo, &mut on_stack);

    ComplexityReport {
        node_id: id.clone(),
        node_count: members.len(),
        edge_count,
        max_depth,
        node_types,
        error: None,
    }
}

/// Longest upstream chain ending at `id`, counted in edges. Cycle
/// closing edges are skipped, so the walk terminates on cyclic input
/// and reports the longest acyclic chain instead.
fn longest_chain(
    graph: &LineageGraph,
    id: &NodeId,
    members: &HashSet<NodeId>,
    memo: &mut HashMap<NodeId, usize>,
    on_stack: &mut HashSet<NodeId>,
) -> usize {
    if let Some(&depth) = memo.get(id) {
        return depth;
    }
    on_stack.insert(id.clone());
    let mut best = 0;
    for pred in unique_predecessors(graph, id) {
        if !members.contains(pred) || on_stack.contains(pred) {
            continue;
        }
        best = best.max(1 + longest_chain(graph, pred, members, memo, on_stack));
    }
    on_stack.remove(id);
    memo.insert(id.clone(), best);
    best
}

/// A source-to-sink path scored by the mean centrality of its nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPath {
    pub path: Vec<NodeId>,
    pub score: f64,
}

/// Critical paths of the graph: for every (root, sink) pair, the
/// highest-scoring simple path whose mean betweenness centrality
/// exceeds [`CRITICAL_PATH_THRESHOLD`], best scores first.
///
/// Path enumeration is exponential in the worst case; bound the graph
/// before running this on untrusted input.
pub fn critical_paths(graph: &LineageGraph) -> Vec<CriticalPath> {
    let centrality = betweenness_centrality(graph);
    critical_paths_with(graph, &centrality)
}

/// [`critical_paths`] against an already-computed centrality map.
pub fn critical_paths_with(
    graph: &LineageGraph,
    centrality: &HashMap<NodeId, f64>,
) -> Vec<CriticalPath> {
    let mut roots: Vec<&NodeId> = graph.roots();
    roots.sort_unstable();
    let mut sinks: Vec<&NodeId> = graph.sinks();
    sinks.sort_unstable();
    let max_edges = graph.node_count();

    let mut result = Vec::new();
    for &root in &roots {
        for &sink in &sinks {
            if root == sink {
                continue;
            }
            let mut best: Option<CriticalPath> = None;
            for path in crate::query::simple_paths(graph, root, sink, max_edges, None) {
                let score = path
                    .iter()
                    .map(|id| centrality.get(id).copied().unwrap_or(0.0))
                    .sum::<f64>()
                    / path.len() as f64;
                if best.as_ref().map(|b| score > b.score).unwrap_or(true) {
                    best = Some(CriticalPath { path, score });
                }
            }
            if let Some(found) = best {
                if found.score > CRITICAL_PATH_THRESHOLD {
                    result.push(found);
                }
            }
        }
    }
    result.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.path.cmp(&b.path))
    });
    result
}
