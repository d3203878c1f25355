//! Shared builders for stemma integration tests
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use stemma::{
    BoundaryConstraint, BoundaryType, GraphSnapshot, ImpactLevel, LineageGraph, LineageLink,
    LineageNode, Metadata, NodeId, NodeKind, Record, RecordDetail, RecordId,
};

/// Fixed base timestamp so every test sees the same clock.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Record node tagged with a document id, `offset_secs` after base time.
pub fn doc_node(id: &str, document_id: &str, offset_secs: i64) -> LineageNode {
    LineageNode::with_id(id, NodeKind::Record)
        .with_timestamp(base_time() + Duration::seconds(offset_secs))
        .with_attribute("document_id", document_id)
}

/// Link with a fixed timestamp so graphs compare equal across runs.
pub fn timed_link(source: &str, target: &str, relationship: &str) -> LineageLink {
    LineageLink::new(NodeId::from(source), NodeId::from(target), relationship)
        .with_timestamp(base_time())
}

/// Graph from plain node and edge lists. Nodes are spaced one second
/// apart in declaration order so timestamps are distinct.
pub fn graph_from(nodes: &[&str], edges: &[(&str, &str, &str)]) -> LineageGraph {
    let snapshot = GraphSnapshot {
        nodes: nodes
            .iter()
            .enumerate()
            .map(|(i, id)| {
                LineageNode::with_id(*id, NodeKind::Record)
                    .with_timestamp(base_time() + Duration::seconds(i as i64))
            })
            .collect(),
        links: edges
            .iter()
            .map(|(source, target, rel)| timed_link(source, target, rel))
            .collect(),
        ..GraphSnapshot::default()
    };
    LineageGraph::from_snapshot(snapshot)
}

/// Source record with a fixed id and timestamp.
pub fn source_record(id: &str, entity: &str, offset_secs: i64) -> Record {
    let mut record = Record::new(
        "ingest",
        RecordDetail::Source {
            source_type: "file".to_string(),
            format: "csv".to_string(),
            location: format!("/data/{entity}.csv"),
        },
    )
    .with_output(entity)
    .with_timestamp(base_time() + Duration::seconds(offset_secs));
    record.id = RecordId::from_string(id);
    record
}

/// Transformation record deriving `output` from `inputs`.
pub fn transform_record(id: &str, inputs: &[&str], output: &str, offset_secs: i64) -> Record {
    let mut record = Record::new(
        "pipeline",
        RecordDetail::Transformation {
            transformation_type: "normalize".to_string(),
            tool: "spark".to_string(),
            parameters: Metadata::new(),
        },
    )
    .with_output(output)
    .with_timestamp(base_time() + Duration::seconds(offset_secs));
    for entity in inputs {
        record = record.with_input(*entity);
    }
    record.id = RecordId::from_string(id);
    record
}

/// A graph exercising every collection: two documents, a domain with a
/// self-boundary, a version and a transformation detail.
pub fn sample_graph() -> LineageGraph {
    let mut graph = LineageGraph::from_snapshot(GraphSnapshot {
        nodes: vec![
            doc_node("src-a", "dataset:alpha", 0).with_entity("dataset:raw"),
            doc_node("xf-b", "dataset:alpha", 60).with_entity("dataset:clean"),
            doc_node("src-c", "dataset:beta", 120),
        ],
        links: vec![
            timed_link("xf-b", "src-a", "derived_from"),
            timed_link("src-c", "xf-b", "references"),
        ],
        ..GraphSnapshot::default()
    });
    let domain = graph
        .create_domain("warehouse", "storage", Metadata::new(), Metadata::new(), None)
        .expect("domain");
    graph
        .create_domain_boundary(
            &domain,
            &domain,
            BoundaryType::Dataset,
            Metadata::new(),
            vec![BoundaryConstraint::new("require_schema_match")],
        )
        .expect("boundary");
    graph
        .create_version(
            &NodeId::from("xf-b"),
            "v1",
            None,
            "initial clean pass",
            "pipeline",
            Metadata::new(),
        )
        .expect("version");
    graph
        .record_transformation_details(
            &NodeId::from("xf-b"),
            "rename_column",
            vec!["raw.customer".to_string()],
            vec!["clean.customer_id".to_string()],
            Metadata::new(),
            ImpactLevel::Field,
            0.9,
        )
        .expect("detail");
    graph
}
