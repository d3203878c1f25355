//! Merging one lineage graph into another
//!
//! Merging unions every collection by id. Rows present on both sides
//! go through the conflict policy; links are only inserted once both
//! endpoints exist in the merged graph, so a malformed edge from the
//! other side is dropped rather than imported.

use serde::{Deserialize, Serialize};

use crate::graph::{LineageGraph, LineageLink, LineageNode};

/// Policy for rows present on both sides of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Take the other side's row when its timestamp is strictly newer;
    /// ties keep this side
    #[default]
    Newer,
    /// Always keep this side's row
    Keep,
    /// Always take the other side's row
    Replace,
}

/// Counts of what a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    pub nodes_added: usize,
    pub nodes_updated: usize,
    pub links_added: usize,
    pub links_updated: usize,
    pub links_dropped: usize,
    pub domains_added: usize,
    pub boundaries_added: usize,
    pub versions_added: usize,
    pub details_added: usize,
}

/// Merge `other` into `graph` under the given conflict policy.
///
/// Nodes merge before links so endpoint checks see the union.
/// `allow_domain_merging=false` leaves the target's domains and
/// boundaries untouched; nodes still arrive with their domain
/// metadata either way.
pub fn merge_lineage(
    graph: &mut LineageGraph,
    other: &LineageGraph,
    conflict: ConflictResolution,
    allow_domain_merging: bool,
) -> MergeStats {
    let mut stats = MergeStats::default();

    if allow_domain_merging {
        let mut domains: Vec<_> = other.domains().collect();
        domains.sort_by(|a, b| a.id.cmp(&b.id));
        for domain in domains {
            if graph.domain(&domain.id).is_none() {
                graph.insert_domain_raw(domain.clone());
                stats.domains_added += 1;
            } else if conflict == ConflictResolution::Replace {
                graph.insert_domain_raw(domain.clone());
            }
        }
        let mut boundaries: Vec<_> = other.boundaries().collect();
        boundaries.sort_by(|a, b| a.id.cmp(&b.id));
        for boundary in boundaries {
            if graph.boundary(&boundary.id).is_none() {
                graph.insert_boundary_raw(boundary.clone());
                stats.boundaries_added += 1;
            } else if conflict == ConflictResolution::Replace {
                graph.insert_boundary_raw(boundary.clone());
            }
        }
    }

    let mut nodes: Vec<&LineageNode> = other.nodes().collect();
    nodes.sort_by(|a, b| a.id.cmp(&b.id));
    for node in nodes {
        match graph.node(&node.id) {
            None => {
                graph.insert_node_raw(node.clone());
                stats.nodes_added += 1;
            }
            Some(existing) => {
                let take = match conflict {
                    ConflictResolution::Replace => true,
                    ConflictResolution::Newer => node.timestamp > existing.timestamp,
                    ConflictResolution::Keep => false,
                };
                if take {
                    graph.insert_node_raw(node.clone());
                    stats.nodes_updated += 1;
                }
            }
        }
    }

    let mut links: Vec<&LineageLink> = other.links().collect();
    links.sort_by(|a, b| a.key().cmp(&b.key()));
    for link in links {
        match graph.link(&link.key()) {
            None => {
                if graph.insert_link_raw(link.clone()) {
                    stats.links_added += 1;
                } else {
                    stats.links_dropped += 1;
                }
            }
            Some(existing) => {
                let take = match conflict {
                    ConflictResolution::Replace => true,
                    ConflictResolution::Newer => link.timestamp > existing.timestamp,
                    ConflictResolution::Keep => false,
                };
                if take && graph.insert_link_raw(link.clone()) {
                    stats.links_updated += 1;
                }
            }
        }
    }

    let mut versions: Vec<_> = other.versions().collect();
    versions.sort_by(|a, b| a.id.cmp(&b.id));
    for version in versions {
        if !graph.has_node(&version.node_id) {
            continue;
        }
        if graph.version(&version.id).is_none() {
            graph.insert_version_raw(version.clone());
            stats.versions_added += 1;
        } else if conflict == ConflictResolution::Replace {
            graph.insert_version_raw(version.clone());
        }
    }

    let mut details: Vec<_> = other.details().collect();
    details.sort_by(|a, b| a.id.cmp(&b.id));
    for detail in details {
        if !graph.has_node(&detail.transformation_id) {
            continue;
        }
        if graph.detail(&detail.id).is_none() {
            graph.insert_detail_raw(detail.clone());
            stats.details_added += 1;
        } else if conflict == ConflictResolution::Replace {
            graph.insert_detail_raw(detail.clone());
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphSnapshot, LineageNode, NodeId, NodeKind};
    use chrono::{Duration, TimeZone, Utc};

    fn node_at(id: &str, hour: i64, label: &str) -> LineageNode {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
        LineageNode::with_id(id, NodeKind::Record)
            .with_attribute("label", label)
            .with_timestamp(t)
    }

    #[test]
    fn disjoint_graphs_union() {
        let mut left = LineageGraph::new();
        left.insert_node_raw(node_at("a", 0, "left"));
        let mut right = LineageGraph::new();
        right.insert_node_raw(node_at("b", 0, "right"));
        right.insert_node_raw(node_at("c", 0, "right"));
        right.insert_link_raw(LineageLink::new(
            NodeId::from("b"),
            NodeId::from("c"),
            "derived_from",
        ));

        let stats = merge_lineage(&mut left, &right, ConflictResolution::Newer, true);
        assert_eq!(stats.nodes_added, 2);
        assert_eq!(stats.links_added, 1);
        assert_eq!(left.node_count(), 3);
    }

    #[test]
    fn newer_takes_the_younger_row() {
        let mut left = LineageGraph::new();
        left.insert_node_raw(node_at("a", 0, "old"));
        let mut right = LineageGraph::new();
        right.insert_node_raw(node_at("a", 1, "new"));

        let stats = merge_lineage(&mut left, &right, ConflictResolution::Newer, true);
        assert_eq!(stats.nodes_updated, 1);
        let label = left
            .node(&NodeId::from("a"))
            .and_then(|n| n.metadata.get("label"))
            .and_then(|v| v.as_str())
            .unwrap();
        assert_eq!(label, "new");
    }

    #[test]
    fn newer_keeps_self_on_equal_timestamps() {
        let mut left = LineageGraph::new();
        left.insert_node_raw(node_at("a", 0, "mine"));
        let mut right = LineageGraph::new();
        right.insert_node_raw(node_at("a", 0, "theirs"));

        let stats = merge_lineage(&mut left, &right, ConflictResolution::Newer, true);
        assert_eq!(stats.nodes_updated, 0);
        let label = left
            .node(&NodeId::from("a"))
            .and_then(|n| n.metadata.get("label"))
            .and_then(|v| v.as_str())
            .unwrap();
        assert_eq!(label, "mine");
    }

    #[test]
    fn keep_never_overwrites() {
        let mut left = LineageGraph::new();
        left.insert_node_raw(node_at("a", 0, "mine"));
        let mut right = LineageGraph::new();
        right.insert_node_raw(node_at("a", 5, "theirs"));

        merge_lineage(&mut left, &right, ConflictResolution::Keep, true);
        let label = left
            .node(&NodeId::from("a"))
            .and_then(|n| n.metadata.get("label"))
            .and_then(|v| v.as_str())
            .unwrap();
        assert_eq!(label, "mine");
    }

    #[test]
    fn replace_always_overwrites() {
        let mut left = LineageGraph::new();
        left.insert_node_raw(node_at("a", 5, "mine"));
        let mut right = LineageGraph::new();
        right.insert_node_raw(node_at("a", 0, "theirs"));

        merge_lineage(&mut left, &right, ConflictResolution::Replace, true);
        let label = left
            .node(&NodeId::from("a"))
            .and_then(|n| n.metadata.get("label"))
            .and_then(|v| v.as_str())
            .unwrap();
        assert_eq!(label, "theirs");
    }

    #[test]
    fn dangling_edge_from_a_snapshot_is_dropped() {
        // a snapshot naming an edge whose endpoint is absent
        let mut snapshot = GraphSnapshot::default();
        snapshot.nodes.push(node_at("x", 0, "only"));
        snapshot.links.push(LineageLink::new(
            NodeId::from("x"),
            NodeId::from("y"),
            "derived_from",
        ));
        let other = LineageGraph::from_snapshot(snapshot);

        let mut graph = LineageGraph::new();
        let stats = merge_lineage(&mut graph, &other, ConflictResolution::Newer, true);
        assert_eq!(stats.nodes_added, 1);
        assert_eq!(stats.links_added, 0);
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn domain_merging_can_be_disabled() {
        let mut right = LineageGraph::new();
        right
            .create_domain("sales", "department", Default::default(), Default::default(), None)
            .unwrap();
        let mut left = LineageGraph::new();

        let stats = merge_lineage(&mut left, &right, ConflictResolution::Newer, false);
        assert_eq!(stats.domains_added, 0);
        assert_eq!(left.domain_count(), 0);

        let stats = merge_lineage(&mut left, &right, ConflictResolution::Newer, true);
        assert_eq!(stats.domains_added, 1);
        assert_eq!(left.domain_count(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut left = LineageGraph::new();
        left.insert_node_raw(node_at("a", 0, "x"));
        left.insert_node_raw(node_at("b", 0, "y"));
        left.insert_link_raw(LineageLink::new(
            NodeId::from("a"),
            NodeId::from("b"),
            "derived_from",
        ));
        let copy = left.clone();

        let stats = merge_lineage(&mut left, &copy, ConflictResolution::Newer, true);
        assert_eq!(stats.nodes_added, 0);
        assert_eq!(stats.nodes_updated, 0);
        assert_eq!(stats.links_added, 0);
        assert_eq!(left.node_count(), 2);
    }

    #[test]
    fn versions_follow_merged_nodes() {
        let mut right = LineageGraph::new();
        right.insert_node_raw(node_at("a", 0, "x"));
        right
            .create_version(
                &NodeId::from("a"),
                "v1",
                None,
                "initial",
                "tester",
                Default::default(),
            )
            .unwrap();

        let mut left = LineageGraph::new();
        let stats = merge_lineage(&mut left, &right, ConflictResolution::Newer, true);
        assert_eq!(stats.versions_added, 1);
        assert_eq!(left.versions_of(&NodeId::from("a")).len(), 1);
    }
}
