//! Graph construction and invariant tests

use chrono::{Duration, Utc};

use crate::record::{Metadata, MetaValue, Record, RecordDetail};

use super::*;

/// Build the 4-node diamond a -> b -> d, a -> c -> d
fn diamond() -> (LineageGraph, NodeId, NodeId, NodeId, NodeId) {
    let mut graph = LineageGraph::new();
    let a = graph
        .create_node(NodeKind::Record, Metadata::new(), None, None)
        .unwrap();
    let b = graph
        .create_node(NodeKind::Record, Metadata::new(), None, None)
        .unwrap();
    let c = graph
        .create_node(NodeKind::Record, Metadata::new(), None, None)
        .unwrap();
    let d = graph
        .create_node(NodeKind::Record, Metadata::new(), None, None)
        .unwrap();
    for (s, t) in [(&a, &b), (&b, &d), (&a, &c), (&c, &d)] {
        graph
            .create_link(
                s,
                t,
                "derived_from",
                Metadata::new(),
                1.0,
                LinkDirection::Forward,
                false,
            )
            .unwrap();
    }
    (graph, a, b, c, d)
}

fn source_record(agent: &str, output: &str) -> Record {
    Record::new(
        agent,
        RecordDetail::Source {
            source_type: "file".to_string(),
            format: "csv".to_string(),
            location: format!("/data/{output}.csv"),
        },
    )
    .with_output(output)
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from_string("node:alpha");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"node:alpha\"");
    }

    #[test]
    fn create_domain_rejects_unknown_parent() {
        let mut graph = LineageGraph::new();
        let missing = DomainId::from_string("nope");
        let result = graph.create_domain(
            "child",
            "dataset",
            Metadata::new(),
            Metadata::new(),
            Some(&missing),
        );
        assert!(result.is_err());
        assert_eq!(graph.domain_count(), 0);
    }

    #[test]
    fn create_domain_with_existing_parent() {
        let mut graph = LineageGraph::new();
        let parent = graph
            .create_domain("org", "organization", Metadata::new(), Metadata::new(), None)
            .unwrap();
        let child = graph
            .create_domain(
                "pipeline",
                "system",
                Metadata::new(),
                Metadata::new(),
                Some(&parent),
            )
            .unwrap();
        assert_eq!(
            graph.domain(&child).unwrap().parent_domain_id,
            Some(parent)
        );
    }

    #[test]
    fn create_boundary_rejects_unknown_domain() {
        let mut graph = LineageGraph::new();
        let known = graph
            .create_domain("a", "organization", Metadata::new(), Metadata::new(), None)
            .unwrap();
        let unknown = DomainId::from_string("ghost");
        let result = graph.create_domain_boundary(
            &known,
            &unknown,
            BoundaryType::Organization,
            Metadata::new(),
            vec![],
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_node_injects_domain_metadata() {
        let mut graph = LineageGraph::new();
        let domain = graph
            .create_domain("analytics", "system", Metadata::new(), Metadata::new(), None)
            .unwrap();
        let node_id = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&domain), None)
            .unwrap();
        let node = graph.node(&node_id).unwrap();
        assert_eq!(node.domain_id(), Some(domain.as_str()));
        assert_eq!(
            node.metadata.get("domain_name").and_then(|v| v.as_str()),
            Some("analytics")
        );
    }

    #[test]
    fn add_record_rejects_duplicate_id() {
        let mut graph = LineageGraph::new();
        let record = source_record("agent-1", "dataset-a");
        graph.add_record(&record).unwrap();
        let result = graph.add_record(&record);
        assert!(result.is_err());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn add_record_indexes_outputs_as_entities() {
        let mut graph = LineageGraph::new();
        let record = source_record("agent-1", "dataset-a").with_output("dataset-b");
        let node_id = graph.add_record(&record).unwrap();
        assert_eq!(graph.entity_nodes("dataset-a"), &[node_id.clone()]);
        assert_eq!(graph.entity_nodes("dataset-b"), &[node_id]);
    }

    #[test]
    fn create_link_rejects_unknown_endpoint() {
        let mut graph = LineageGraph::new();
        let a = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let ghost = NodeId::from_string("ghost");
        let result = graph.create_link(
            &a,
            &ghost,
            "derived_from",
            Metadata::new(),
            1.0,
            LinkDirection::Forward,
            false,
        );
        assert!(result.is_err());
        assert_eq!(graph.link_count(), 0);
    }

    #[test]
    fn create_link_overwrites_same_triple() {
        let (mut graph, a, b, _, _) = diamond();
        let before = graph.link_count();
        let key = graph
            .create_link(
                &a,
                &b,
                "derived_from",
                Metadata::new(),
                0.4,
                LinkDirection::Forward,
                false,
            )
            .unwrap();
        assert_eq!(graph.link_count(), before);
        assert_eq!(graph.link(&key).unwrap().confidence, 0.4);
    }

    #[test]
    fn parallel_relationships_are_independent_links() {
        let (mut graph, a, b, _, _) = diamond();
        let before = graph.link_count();
        graph
            .create_link(
                &a,
                &b,
                "references",
                Metadata::new(),
                1.0,
                LinkDirection::Forward,
                false,
            )
            .unwrap();
        assert_eq!(graph.link_count(), before + 1);
        assert_eq!(graph.outgoing(&a).count(), 3);
    }

    #[test]
    fn backward_direction_stores_reversed_edge() {
        let mut graph = LineageGraph::new();
        let a = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let b = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let key = graph
            .create_link(
                &a,
                &b,
                "generates",
                Metadata::new(),
                1.0,
                LinkDirection::Backward,
                false,
            )
            .unwrap();
        assert_eq!(key.source, b);
        assert_eq!(key.target, a);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn bidirectional_direction_stores_inverse_pair() {
        let mut graph = LineageGraph::new();
        let a = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let b = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let key = graph
            .create_link(
                &a,
                &b,
                "similar_to",
                Metadata::new(),
                0.8,
                LinkDirection::Bidirectional,
                false,
            )
            .unwrap();
        assert_eq!(graph.link_count(), 2);
        let inverse = graph.link(&key.inverse()).unwrap();
        assert_eq!(inverse.relationship, "similar_to_inverse");
        assert_eq!(inverse.confidence, 0.8);
    }

    #[test]
    fn cross_domain_link_requires_boundary() {
        let mut graph = LineageGraph::new();
        let da = graph
            .create_domain("a", "organization", Metadata::new(), Metadata::new(), None)
            .unwrap();
        let db = graph
            .create_domain("b", "organization", Metadata::new(), Metadata::new(), None)
            .unwrap();
        let na = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&da), None)
            .unwrap();
        let nb = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&db), None)
            .unwrap();

        let result = graph.create_link(
            &na,
            &nb,
            "transfers_to",
            Metadata::new(),
            1.0,
            LinkDirection::Forward,
            true,
        );
        assert!(result.is_err());
        assert_eq!(graph.link_count(), 0, "rejected link must not be stored");

        graph
            .create_domain_boundary(
                &da,
                &db,
                BoundaryType::Organization,
                Metadata::new(),
                vec![],
            )
            .unwrap();
        let key = graph
            .create_link(
                &na,
                &nb,
                "transfers_to",
                Metadata::new(),
                1.0,
                LinkDirection::Forward,
                true,
            )
            .unwrap();
        let link = graph.link(&key).unwrap();
        assert_eq!(link.metadata.get("cross_domain"), Some(&MetaValue::Bool(true)));
    }

    #[test]
    fn confidence_is_clamped() {
        let (mut graph, a, b, _, _) = diamond();
        let key = graph
            .create_link(
                &a,
                &b,
                "references",
                Metadata::new(),
                3.5,
                LinkDirection::Forward,
                false,
            )
            .unwrap();
        assert_eq!(graph.link(&key).unwrap().confidence, 1.0);
    }

    #[test]
    fn duplicate_version_number_rejected_without_mutation() {
        let mut graph = LineageGraph::new();
        let node = graph
            .create_node(NodeKind::Record, Metadata::new(), None, Some("dataset-a"))
            .unwrap();
        graph
            .create_version(&node, "v1", None, "initial", "agent-1", Metadata::new())
            .unwrap();
        let before_versions = graph.versions().count();
        let before_list = graph.node(&node).unwrap().version_ids.clone();

        let result =
            graph.create_version(&node, "v1", None, "again", "agent-1", Metadata::new());
        assert!(result.is_err());
        assert_eq!(graph.versions().count(), before_versions);
        assert_eq!(graph.node(&node).unwrap().version_ids, before_list);
    }

    #[test]
    fn version_parent_must_exist() {
        let mut graph = LineageGraph::new();
        let node = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let ghost = VersionId::from_string("ghost");
        let result = graph.create_version(
            &node,
            "v2",
            Some(&ghost),
            "update",
            "agent-1",
            Metadata::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn version_chain_links_parents() {
        let mut graph = LineageGraph::new();
        let node = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let v1 = graph
            .create_version(&node, "v1", None, "initial", "agent-1", Metadata::new())
            .unwrap();
        let v2 = graph
            .create_version(&node, "v2", Some(&v1), "update", "agent-1", Metadata::new())
            .unwrap();
        let versions = graph.versions_of(&node);
        assert_eq!(versions.len(), 2);
        assert_eq!(
            graph.version(&v2).unwrap().parent_version_id,
            Some(v1)
        );
    }

    #[test]
    fn transformation_details_attach_to_node() {
        let mut graph = LineageGraph::new();
        let node = graph
            .create_node(NodeKind::Record, Metadata::new(), None, None)
            .unwrap();
        let detail_id = graph
            .record_transformation_details(
                &node,
                "normalize",
                vec!["raw.email".to_string()],
                vec!["clean.email".to_string()],
                Metadata::new(),
                ImpactLevel::Field,
                0.9,
            )
            .unwrap();
        let details = graph.details_of(&node);
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, detail_id);
        assert_eq!(details[0].impact_level, ImpactLevel::Field);
    }

    #[test]
    fn descendants_and_ancestors_cover_diamond() {
        let (graph, a, b, c, d) = diamond();
        let down = graph.descendants(&a);
        assert_eq!(down.len(), 3);
        assert!(down.contains(&b) && down.contains(&c) && down.contains(&d));

        let up = graph.ancestors(&d);
        assert_eq!(up.len(), 3);
        assert!(up.contains(&a) && up.contains(&b) && up.contains(&c));

        assert!(graph.descendants(&d).is_empty());
        assert!(graph.ancestors(&a).is_empty());
    }

    #[test]
    fn roots_and_sinks() {
        let (graph, a, _, _, d) = diamond();
        assert_eq!(graph.roots(), vec![&a]);
        assert_eq!(graph.sinks(), vec![&d]);
    }

    #[test]
    fn entity_latest_prefers_newest_timestamp() {
        let mut graph = LineageGraph::new();
        let older = source_record("agent-1", "dataset-a")
            .with_timestamp(Utc::now() - Duration::hours(2));
        let newer = source_record("agent-2", "dataset-a");
        let old_id = graph.add_record(&older).unwrap();
        let new_id = graph.add_record(&newer).unwrap();

        assert_eq!(graph.entity_latest("dataset-a"), Some(&new_id));
        assert_eq!(graph.entity_nodes("dataset-a").len(), 2);
        assert!(graph.entity_nodes("dataset-a").contains(&old_id));
    }

    #[test]
    fn snapshot_roundtrip_preserves_graph() {
        let mut graph = LineageGraph::new();
        let domain = graph
            .create_domain("analytics", "system", Metadata::new(), Metadata::new(), None)
            .unwrap();
        let a = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&domain), Some("e1"))
            .unwrap();
        let b = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&domain), None)
            .unwrap();
        graph
            .create_link(
                &a,
                &b,
                "derived_from",
                Metadata::new(),
                0.7,
                LinkDirection::Forward,
                false,
            )
            .unwrap();
        graph
            .create_version(&a, "v1", None, "initial", "agent-1", Metadata::new())
            .unwrap();
        graph
            .record_transformation_details(
                &b,
                "join",
                vec![],
                vec![],
                Metadata::new(),
                ImpactLevel::Record,
                1.0,
            )
            .unwrap();

        let restored = LineageGraph::from_snapshot(graph.snapshot());
        assert_eq!(graph, restored);
        assert_eq!(restored.entity_latest("e1"), Some(&a));
    }

    #[test]
    fn serde_roundtrip_preserves_graph() {
        let (graph, _, _, _, _) = diamond();
        let json = serde_json::to_string(&graph).unwrap();
        let restored: LineageGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(graph, restored);
    }

    #[test]
    fn canonical_bytes_are_order_stable() {
        let (g1, _, _, _, _) = diamond();
        let g2 = LineageGraph::from_snapshot(g1.snapshot());
        assert_eq!(g1.canonical_bytes().unwrap(), g2.canonical_bytes().unwrap());
    }

    #[test]
    fn snapshot_drops_dangling_links() {
        let (graph, a, b, _, _) = diamond();
        let mut snapshot = graph.snapshot();
        snapshot.nodes.retain(|n| n.id == a || n.id == b);
        let restored = LineageGraph::from_snapshot(snapshot);
        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.link_count(), 1);
    }
}
