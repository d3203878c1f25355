//! Path finding between two nodes

use std::collections::HashSet;

use crate::graph::{LineageGraph, NodeId};

/// All simple paths from `start` to `end`, shortest first.
///
/// `max_depth` bounds the path length in edges. A missing endpoint or
/// an unreachable pair yields an empty list, never an error. Paths of
/// equal length are ordered lexicographically so results are
/// reproducible. Enumeration is exponential in the worst case; keep
/// `max_depth` tight on dense graphs.
pub fn find_paths(
    graph: &LineageGraph,
    start: &NodeId,
    end: &NodeId,
    max_depth: usize,
    relationship_types: Option<&[String]>,
) -> Vec<Vec<NodeId>> {
    let mut paths = simple_paths(graph, start, end, max_depth, relationship_types);
    paths.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    paths
}

/// Depth-first enumeration of simple paths, in no particular order.
pub(crate) fn simple_paths(
    graph: &LineageGraph,
    start: &NodeId,
    end: &NodeId,
    max_edges: usize,
    relationship_types: Option<&[String]>,
) -> Vec<Vec<NodeId>> {
    if !graph.has_node(start) || !graph.has_node(end) {
        return Vec::new();
    }
    let mut found = Vec::new();
    let mut path = vec![start.clone()];
    let mut on_path = HashSet::new();
    on_path.insert(start.clone());
    walk(
        graph,
        start,
        end,
        max_edges,
        relationship_types,
        &mut path,
        &mut on_path,
        &mut found,
    );
    found
}

#[allow(clippy::too_many_arguments)]
fn walk(
    graph: &LineageGraph,
    current: &NodeId,
    end: &NodeId,
    remaining: usize,
    relationship_types: Option<&[String]>,
    path: &mut Vec<NodeId>,
    on_path: &mut HashSet<NodeId>,
    found: &mut Vec<Vec<NodeId>>,
) {
    if current == end {
        found.push(path.clone());
        return;
    }
    if remaining == 0 {
        return;
    }

    let mut nexts: Vec<&NodeId> = Vec::new();
    let mut seen = HashSet::new();
    for link in graph.outgoing(current) {
        if let Some(types) = relationship_types {
            if !types.iter().any(|t| t == &link.relationship) {
                continue;
            }
        }
        if seen.insert(&link.target) {
            nexts.push(&link.target);
        }
    }
    nexts.sort_unstable();

    for next in nexts {
        if on_path.contains(next) {
            continue;
        }
        path.push(next.clone());
        on_path.insert(next.clone());
        walk(
            graph,
            next,
            end,
            remaining - 1,
            relationship_types,
            path,
            on_path,
            found,
        );
        on_path.remove(next);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LineageLink, LineageNode, NodeKind};

    fn node(graph: &mut LineageGraph, id: &str) -> NodeId {
        let node = LineageNode::with_id(id, NodeKind::Record);
        let node_id = node.id.clone();
        graph.insert_node_raw(node);
        node_id
    }

    fn link(graph: &mut LineageGraph, source: &NodeId, target: &NodeId, rel: &str) {
        graph.insert_link_raw(LineageLink::new(source.clone(), target.clone(), rel));
    }

    /// A -> B -> D and A -> C -> D.
    fn diamond() -> (LineageGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = LineageGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");
        let d = node(&mut graph, "d");
        link(&mut graph, &a, &b, "derived_from");
        link(&mut graph, &a, &c, "derived_from");
        link(&mut graph, &b, &d, "derived_from");
        link(&mut graph, &c, &d, "derived_from");
        (graph, a, b, c, d)
    }

    #[test]
    fn diamond_has_two_paths_of_three_nodes() {
        let (graph, a, b, c, d) = diamond();
        let paths = find_paths(&graph, &a, &d, 10, None);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0], vec![a.clone(), b, d.clone()]);
        assert_eq!(paths[1], vec![a, c, d]);
    }

    #[test]
    fn unreachable_pair_yields_empty_not_error() {
        let (graph, a, _b, _c, d) = diamond();
        assert!(find_paths(&graph, &d, &a, 10, None).is_empty());
    }

    #[test]
    fn missing_endpoint_yields_empty() {
        let (graph, a, ..) = diamond();
        assert!(find_paths(&graph, &a, &NodeId::from("ghost"), 10, None).is_empty());
    }

    #[test]
    fn depth_limit_excludes_longer_paths() {
        let mut graph = LineageGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");
        link(&mut graph, &a, &b, "derived_from");
        link(&mut graph, &b, &c, "derived_from");
        link(&mut graph, &a, &c, "derived_from");

        let all = find_paths(&graph, &a, &c, 5, None);
        assert_eq!(all.len(), 2);
        // shortest first
        assert_eq!(all[0].len(), 2);

        let short = find_paths(&graph, &a, &c, 1, None);
        assert_eq!(short.len(), 1);
        assert_eq!(short[0], vec![a, c]);
    }

    #[test]
    fn relationship_filter_excludes_other_links() {
        let mut graph = LineageGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");
        link(&mut graph, &a, &b, "derived_from");
        link(&mut graph, &b, &c, "references");

        let types = vec!["derived_from".to_string()];
        assert!(find_paths(&graph, &a, &c, 10, Some(&types)).is_empty());
        assert_eq!(find_paths(&graph, &a, &b, 10, Some(&types)).len(), 1);
    }

    #[test]
    fn cycles_do_not_hang_the_walk() {
        let mut graph = LineageGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");
        link(&mut graph, &a, &b, "derived_from");
        link(&mut graph, &b, &a, "derived_from");
        link(&mut graph, &b, &c, "derived_from");

        let paths = find_paths(&graph, &a, &c, 10, None);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
    }
}
