//! Generic JSON export and import
//!
//! The generic format is the lossless one: nodes and edges become flat
//! attribute bags (core fields plus metadata keys), and domains,
//! boundaries, versions and details ride along unchanged. Core fields
//! win over metadata keys of the same name.

use crate::error::{LineageError, LineageResult};
use crate::graph::{
    GraphSnapshot, LineageBoundary, LineageDomain, LineageGraph, LineageLink, LineageNode,
    LineageVersion, NodeId, NodeKind, TransformationDetail,
};
use crate::record::{MetaValue, Metadata};
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

/// Keys of a node bag that map to struct fields, not metadata
const NODE_FIELDS: &[&str] = &["id", "node_type", "entity_id", "record_type", "timestamp"];
/// Keys of an edge bag that map to struct fields, not metadata
const EDGE_FIELDS: &[&str] = &["source", "target", "relationship", "confidence", "timestamp"];

pub(super) fn kind_label(kind: &NodeKind) -> String {
    kind.as_label().to_string()
}

pub(super) fn kind_from_label(label: &str) -> NodeKind {
    match label {
        "record" => NodeKind::Record,
        "domain" => NodeKind::Domain,
        "cluster" => NodeKind::Cluster,
        other => NodeKind::Custom(other.to_string()),
    }
}

pub(super) fn metadata_bag(metadata: &Metadata) -> Map<String, Value> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), v.to_json()))
        .collect()
}

pub(super) fn node_bag(node: &LineageNode) -> Value {
    let mut bag = metadata_bag(&node.metadata);
    bag.insert("id".to_string(), Value::String(node.id.to_string()));
    bag.insert("node_type".to_string(), Value::String(kind_label(&node.node_type)));
    if let Some(entity) = &node.entity_id {
        bag.insert("entity_id".to_string(), Value::String(entity.clone()));
    }
    if let Some(record_type) = &node.record_type {
        bag.insert(
            "record_type".to_string(),
            Value::String(record_type.as_str().to_string()),
        );
    }
    bag.insert(
        "timestamp".to_string(),
        Value::String(node.timestamp.to_rfc3339()),
    );
    Value::Object(bag)
}

pub(super) fn edge_bag(link: &LineageLink) -> Value {
    let mut bag = metadata_bag(&link.metadata);
    bag.insert("source".to_string(), Value::String(link.source.to_string()));
    bag.insert("target".to_string(), Value::String(link.target.to_string()));
    bag.insert(
        "relationship".to_string(),
        Value::String(link.relationship.clone()),
    );
    bag.insert("confidence".to_string(), json!(link.confidence));
    bag.insert(
        "timestamp".to_string(),
        Value::String(link.timestamp.to_rfc3339()),
    );
    Value::Object(bag)
}

/// Export a graph to the generic JSON shape.
pub fn to_json(graph: &LineageGraph) -> LineageResult<Value> {
    let snapshot = graph.snapshot();
    Ok(json!({
        "metadata": metadata_bag(&snapshot.metadata),
        "nodes": snapshot.nodes.iter().map(node_bag).collect::<Vec<_>>(),
        "edges": snapshot.links.iter().map(edge_bag).collect::<Vec<_>>(),
        "domains": serde_json::to_value(&snapshot.domains)?,
        "boundaries": serde_json::to_value(&snapshot.boundaries)?,
        "versions": serde_json::to_value(&snapshot.versions)?,
        "details": serde_json::to_value(&snapshot.details)?,
    }))
}

pub(super) fn malformed(what: &str) -> LineageError {
    LineageError::MalformedRecord(format!("generic JSON export: {what}"))
}

fn required_str<'a>(bag: &'a Map<String, Value>, key: &str, kind: &str) -> LineageResult<&'a str> {
    bag.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed(&format!("{kind} is missing string field {key}")))
}

fn parse_timestamp(bag: &Map<String, Value>, kind: &str) -> LineageResult<DateTime<Utc>> {
    let raw = required_str(bag, "timestamp", kind)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(&format!("{kind} timestamp {raw:?} is invalid: {e}")))
}

pub(super) fn leftover_metadata(bag: &Map<String, Value>, fields: &[&str]) -> Metadata {
    bag.iter()
        .filter(|(key, _)| !fields.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), MetaValue::from_json(value)))
        .collect()
}

fn node_from_bag(value: &Value) -> LineageResult<LineageNode> {
    let bag = value.as_object().ok_or_else(|| malformed("node is not an object"))?;
    let mut node = LineageNode::with_id(
        NodeId::from_string(required_str(bag, "id", "node")?),
        kind_from_label(required_str(bag, "node_type", "node")?),
    )
    .with_timestamp(parse_timestamp(bag, "node")?);
    node.entity_id = bag
        .get("entity_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.record_type = bag
        .get("record_type")
        .and_then(Value::as_str)
        .map(|raw| raw.parse().map_err(|e: String| malformed(&e)))
        .transpose()?;
    node.metadata = leftover_metadata(bag, NODE_FIELDS);
    Ok(node)
}

fn link_from_bag(value: &Value) -> LineageResult<LineageLink> {
    let bag = value.as_object().ok_or_else(|| malformed("edge is not an object"))?;
    let mut link = LineageLink::new(
        NodeId::from_string(required_str(bag, "source", "edge")?),
        NodeId::from_string(required_str(bag, "target", "edge")?),
        required_str(bag, "relationship", "edge")?,
    )
    .with_confidence(bag.get("confidence").and_then(Value::as_f64).unwrap_or(1.0))
    .with_timestamp(parse_timestamp(bag, "edge")?);
    link.metadata = leftover_metadata(bag, EDGE_FIELDS);
    Ok(link)
}

/// Import a graph from the generic JSON shape. Unknown top-level keys
/// are ignored; malformed nodes or edges fail the whole import.
pub fn from_json(value: &Value) -> LineageResult<LineageGraph> {
    let root = value
        .as_object()
        .ok_or_else(|| malformed("document is not an object"))?;

    let nodes = root
        .get("nodes")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(node_from_bag).collect::<LineageResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    let links = root
        .get("edges")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(link_from_bag).collect::<LineageResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    let domains: Vec<LineageDomain> = decode_section(root, "domains")?;
    let boundaries: Vec<LineageBoundary> = decode_section(root, "boundaries")?;
    let versions: Vec<LineageVersion> = decode_section(root, "versions")?;
    let details: Vec<TransformationDetail> = decode_section(root, "details")?;
    let metadata = root
        .get("metadata")
        .map(|m| MetaValue::from_json(m))
        .and_then(|m| match m {
            MetaValue::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    Ok(LineageGraph::from_snapshot(GraphSnapshot {
        nodes,
        links,
        domains,
        boundaries,
        versions,
        details,
        metadata,
    }))
}

fn decode_section<T: serde::de::DeserializeOwned>(
    root: &Map<String, Value>,
    key: &str,
) -> LineageResult<Vec<T>> {
    match root.get(key) {
        Some(section) => serde_json::from_value(section.clone())
            .map_err(|e| malformed(&format!("{key} section is invalid: {e}"))),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{BoundaryConstraint, BoundaryType, LinkDirection};
    use crate::record::RecordType;

    fn sample_graph() -> LineageGraph {
        let mut graph = LineageGraph::new();
        let domain = graph
            .create_domain("pipeline", "processing", Metadata::new(), Metadata::new(), None)
            .unwrap();

        let source = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&domain), Some("dataset:raw"))
            .unwrap();
        graph.set_node_attribute(&source, "document_id", "org:acme/ingest");
        graph.set_node_attribute(&source, "row_count", 120_i64);

        let derived = graph
            .create_node(NodeKind::Record, Metadata::new(), Some(&domain), Some("dataset:clean"))
            .unwrap();

        let mut link_meta = Metadata::new();
        link_meta.insert("mapper".into(), MetaValue::from("clean-v2"));
        graph
            .create_link(
                &derived,
                &source,
                "derived_from",
                link_meta,
                0.9,
                LinkDirection::Forward,
                false,
            )
            .unwrap();

        graph
            .create_version(&source, "1.0", None, "initial load", "ingest", Metadata::new())
            .unwrap();
        graph
            .record_transformation_details(
                &derived,
                "normalize",
                vec!["raw.amount".into()],
                vec!["clean.amount".into()],
                Metadata::new(),
                crate::graph::ImpactLevel::Field,
                0.95,
            )
            .unwrap();
        graph
            .create_domain_boundary(
                &domain,
                &domain,
                BoundaryType::Dataset,
                Metadata::new(),
                vec![BoundaryConstraint::new("require_schema_match")],
            )
            .unwrap();
        graph
    }

    #[test]
    fn round_trip_preserves_core_attributes() {
        let graph = sample_graph();
        let exported = to_json(&graph).unwrap();
        let restored = from_json(&exported).unwrap();
        assert_eq!(restored, graph);
    }

    #[test]
    fn node_bags_are_flat() {
        let graph = sample_graph();
        let exported = to_json(&graph).unwrap();
        let nodes = exported["nodes"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);

        let with_doc = nodes
            .iter()
            .find(|n| n.get("document_id").is_some())
            .expect("annotated node present");
        assert_eq!(with_doc["document_id"], "org:acme/ingest");
        assert_eq!(with_doc["row_count"], 120);
        assert_eq!(with_doc["node_type"], "record");
    }

    #[test]
    fn record_type_survives_the_trip() {
        let mut graph = LineageGraph::new();
        let record = crate::record::Record::new(
            "agent",
            crate::record::RecordDetail::Query {
                query_text: "select 1".into(),
            },
        );
        graph.add_record(&record).unwrap();

        let restored = from_json(&to_json(&graph).unwrap()).unwrap();
        let node = restored.nodes().next().unwrap();
        assert_eq!(node.record_type, Some(RecordType::Query));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        assert!(matches!(
            from_json(&json!("not an object")),
            Err(LineageError::MalformedRecord(_))
        ));
        assert!(matches!(
            from_json(&json!({"nodes": [{"id": "n1"}]})),
            Err(LineageError::MalformedRecord(_))
        ));
        assert!(matches!(
            from_json(&json!({
                "nodes": [{"id": "n1", "node_type": "record", "timestamp": "not a time"}]
            })),
            Err(LineageError::MalformedRecord(_))
        ));
    }

    #[test]
    fn empty_document_is_an_empty_graph() {
        let graph = from_json(&json!({})).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.link_count(), 0);
    }
}
