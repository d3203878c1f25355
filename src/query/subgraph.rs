//! Subgraph extraction around a root node

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::error::{LineageError, LineageResult};
use crate::graph::{DomainId, LineageGraph, NodeId};

/// Orientation of a traversal relative to stored link direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalDirection {
    /// Follow links source to target
    #[default]
    Forward,
    /// Follow links target to source
    Backward,
    /// Ignore link orientation
    Both,
}

/// Extract the nodes within `max_depth` steps of `root`, walking in
/// the given direction, together with the links among them.
///
/// Distance is shortest-path length over the chosen orientation; when
/// `relationship_types` is given only links of those types are walked
/// or materialized. `domain_filter` drops reached nodes outside the
/// domain, except the root itself. A missing root is an error; every
/// other combination just yields a smaller graph.
pub fn extract_subgraph(
    graph: &LineageGraph,
    root: &NodeId,
    max_depth: usize,
    direction: TraversalDirection,
    domain_filter: Option<&DomainId>,
    relationship_types: Option<&[String]>,
) -> LineageResult<LineageGraph> {
    if !graph.has_node(root) {
        return Err(LineageError::not_found(format!(
            "node does not exist: {root}"
        )));
    }

    let mut distance: HashMap<&NodeId, usize> = HashMap::new();
    distance.insert(root, 0);
    let mut queue = VecDeque::new();
    queue.push_back(root);
    while let Some(current) = queue.pop_front() {
        let depth = distance[current];
        if depth == max_depth {
            continue;
        }
        for next in neighbors(graph, current, direction, relationship_types) {
            if !distance.contains_key(next) {
                distance.insert(next, depth + 1);
                queue.push_back(next);
            }
        }
    }

    let mut included: HashSet<NodeId> = distance.keys().map(|id| (*id).clone()).collect();
    if let Some(domain) = domain_filter {
        included.retain(|id| {
            id == root
                || graph.node(id).and_then(|n| n.domain_id()) == Some(domain.as_str())
        });
    }
    Ok(induced_subgraph(graph, &included, relationship_types))
}

fn neighbors<'a>(
    graph: &'a LineageGraph,
    id: &NodeId,
    direction: TraversalDirection,
    relationship_types: Option<&[String]>,
) -> Vec<&'a NodeId> {
    let rel_ok = |relationship: &str| {
        relationship_types
            .map(|types| types.iter().any(|t| t == relationship))
            .unwrap_or(true)
    };
    let mut out = Vec::new();
    if matches!(
        direction,
        TraversalDirection::Forward | TraversalDirection::Both
    ) {
        for link in graph.outgoing(id) {
            if rel_ok(&link.relationship) {
                out.push(&link.target);
            }
        }
    }
    if matches!(
        direction,
        TraversalDirection::Backward | TraversalDirection::Both
    ) {
        for link in graph.incoming(id) {
            if rel_ok(&link.relationship) {
                out.push(&link.source);
            }
        }
    }
    out
}

/// Materialize a subgraph: the given nodes, the links among them
/// (optionally restricted by relationship type), their versions and
/// details, the domains they reference with their parent chains, and
/// the boundaries joining those domains.
pub(crate) fn induced_subgraph(
    graph: &LineageGraph,
    included: &HashSet<NodeId>,
    relationship_types: Option<&[String]>,
) -> LineageGraph {
    let mut result = LineageGraph::new();
    for id in included {
        if let Some(node) = graph.node(id) {
            result.insert_node_raw(node.clone());
        }
    }
    for link in graph.links() {
        if !included.contains(&link.source) || !included.contains(&link.target) {
            continue;
        }
        if let Some(types) = relationship_types {
            if !types.iter().any(|t| t == &link.relationship) {
                continue;
            }
        }
        result.insert_link_raw(link.clone());
    }
    for id in included {
        for version in graph.versions_of(id) {
            result.insert_version_raw(version.clone());
        }
        for detail in graph.details_of(id) {
            result.insert_detail_raw(detail.clone());
        }
    }

    let mut wanted_domains: HashSet<DomainId> = HashSet::new();
    for id in included {
        let Some(label) = graph.node(id).and_then(|n| n.domain_id()) else {
            continue;
        };
        let mut current = Some(DomainId::from_string(label));
        while let Some(domain_id) = current {
            if !wanted_domains.insert(domain_id.clone()) {
                break;
            }
            current = graph
                .domain(&domain_id)
                .and_then(|d| d.parent_domain_id.clone());
        }
    }
    for domain_id in &wanted_domains {
        if let Some(domain) = graph.domain(domain_id) {
            result.insert_domain_raw(domain.clone());
        }
    }
    for boundary in graph.boundaries() {
        if wanted_domains.contains(&boundary.source_domain_id)
            && wanted_domains.contains(&boundary.target_domain_id)
        {
            result.insert_boundary_raw(boundary.clone());
        }
    }
    result
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
    fn forward_depth_one_stops_before_the_join() {
        let (graph, a, b, c, d) = diamond();
        let sub =
            extract_subgraph(&graph, &a, 1, TraversalDirection::Forward, None, None).unwrap();
        assert_eq!(sub.node_count(), 3);
        assert!(sub.has_node(&a) && sub.has_node(&b) && sub.has_node(&c));
        assert!(!sub.has_node(&d));
        assert_eq!(sub.link_count(), 2);
    }

    #[test]
    fn forward_depth_two_reaches_the_join() {
        let (graph, a, _b, _c, d) = diamond();
        let sub =
            extract_subgraph(&graph, &a, 2, TraversalDirection::Forward, None, None).unwrap();
        assert_eq!(sub.node_count(), 4);
        assert!(sub.has_node(&d));
        assert_eq!(sub.link_count(), 4);
    }

    #[test]
    fn backward_walks_against_the_links() {
        let (graph, _a, b, c, d) = diamond();
        let sub =
            extract_subgraph(&graph, &d, 1, TraversalDirection::Backward, None, None).unwrap();
        assert_eq!(sub.node_count(), 3);
        assert!(sub.has_node(&b) && sub.has_node(&c));
    }

    #[test]
    fn both_directions_cover_the_diamond_from_an_arm() {
        let (graph, _a, b, _c, _d) = diamond();
        let sub = extract_subgraph(&graph, &b, 1, TraversalDirection::Both, None, None).unwrap();
        // b reaches a upstream and d downstream, but not c
        assert_eq!(sub.node_count(), 3);
    }

    #[test]
    fn missing_root_is_not_found() {
        let (graph, ..) = diamond();
        let err = extract_subgraph(
            &graph,
            &NodeId::from("ghost"),
            1,
            TraversalDirection::Forward,
            None,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, LineageError::NotFound(_)));
    }

    #[test]
    fn depth_zero_is_just_the_root() {
        let (graph, a, ..) = diamond();
        let sub =
            extract_subgraph(&graph, &a, 0, TraversalDirection::Forward, None, None).unwrap();
        assert_eq!(sub.node_count(), 1);
        assert_eq!(sub.link_count(), 0);
    }

    #[test]
    fn relationship_filter_restricts_the_walk() {
        let mut graph = LineageGraph::new();
        let a = node(&mut graph, "a");
        let b = node(&mut graph, "b");
        let c = node(&mut graph, "c");
        link(&mut graph, &a, &b, "derived_from");
        link(&mut graph, &a, &c, "references");

        let types = vec!["derived_from".to_string()];
        let sub = extract_subgraph(
            &graph,
            &a,
            3,
            TraversalDirection::Forward,
            None,
            Some(&types),
        )
        .unwrap();
        assert!(sub.has_node(&b));
        assert!(!sub.has_node(&c));
        assert_eq!(sub.link_count(), 1);
    }

    #[test]
    fn domain_filter_keeps_root_and_matching_nodes() {
        let mut graph = LineageGraph::new();
        let sales = graph
            .create_domain("sales", "department", Default::default(), Default::default(), None)
            .unwrap();
        let ops = graph
            .create_domain("ops", "department", Default::default(), Default::default(), None)
            .unwrap();
        let a = graph
            .create_node(NodeKind::Record, Default::default(), Some(&sales), None)
            .unwrap();
        let b = graph
            .create_node(NodeKind::Record, Default::default(), Some(&sales), None)
            .unwrap();
        let c = graph
            .create_node(NodeKind::Record, Default::default(), Some(&ops), None)
            .unwrap();
        graph
            .create_domain_boundary(
                &sales,
                &ops,
                crate::graph::BoundaryType::Organization,
                Default::default(),
                Vec::new(),
            )
            .unwrap();
        link(&mut graph, &a, &b, "derived_from");
        link(&mut graph, &a, &c, "derived_from");

        let sub = extract_subgraph(
            &graph,
            &a,
            2,
            TraversalDirection::Forward,
            Some(&sales),
            None,
        )
        .unwrap();
        assert!(sub.has_node(&a) && sub.has_node(&b));
        assert!(!sub.has_node(&c));
        // the sales domain rides along with its nodes
        assert_eq!(sub.domain_count(), 1);
    }

    #[test]
    fn versions_follow_their_nodes() {
        let (mut graph, a, ..) = diamond();
        graph
            .create_version(&a, "v1", None, "initial", "tester", Default::default())
            .unwrap();
        let sub =
            extract_subgraph(&graph, &a, 0, TraversalDirection::Forward, None, None).unwrap();
        assert_eq!(sub.versions_of(&a).len(), 1);
    }
}
