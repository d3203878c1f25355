//! Node-link JSON for external graph tools
//!
//! This is the shape networkx and d3 consume: top-level `directed` and
//! `multigraph` flags, a `graph` attribute block, `nodes`, and `links`.
//! Export carries the same flat bags as the generic format; import is
//! best effort, tolerating foreign files with numeric ids and missing
//! lineage fields. Domains, boundaries, versions and details do not fit
//! this format and are dropped.

use super::json::{edge_bag, kind_from_label, malformed, metadata_bag, node_bag};
use crate::error::LineageResult;
use crate::graph::{GraphSnapshot, LineageGraph, LineageLink, LineageNode, NodeId, NodeKind};
use crate::record::MetaValue;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

/// Export a graph in node-link shape.
pub fn to_node_link(graph: &LineageGraph) -> LineageResult<Value> {
    let snapshot = graph.snapshot();
    let links: Vec<Value> = snapshot
        .links
        .iter()
        .map(|link| {
            let mut bag = match edge_bag(link) {
                Value::Object(bag) => bag,
                _ => Map::new(),
            };
            // Multigraph edge key; the relationship field stays too
            bag.insert("key".to_string(), Value::String(link.relationship.clone()));
            Value::Object(bag)
        })
        .collect();

    Ok(json!({
        "directed": true,
        "multigraph": true,
        "graph": metadata_bag(&snapshot.metadata),
        "nodes": snapshot.nodes.iter().map(node_bag).collect::<Vec<_>>(),
        "links": links,
    }))
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn bag_timestamp(bag: &Map<String, Value>) -> DateTime<Utc> {
    bag.get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn leftover(bag: &Map<String, Value>, consumed: &[&str]) -> crate::record::Metadata {
    bag.iter()
        .filter(|(key, _)| !consumed.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), MetaValue::from_json(value)))
        .collect()
}

fn node_from_bag(value: &Value) -> LineageResult<LineageNode> {
    let bag = value
        .as_object()
        .ok_or_else(|| malformed("node-link node is not an object"))?;
    let id = bag
        .get("id")
        .and_then(id_string)
        .ok_or_else(|| malformed("node-link node has no id"))?;
    let kind = bag
        .get("node_type")
        .and_then(Value::as_str)
        .map(kind_from_label)
        .unwrap_or_else(|| NodeKind::Custom("imported".to_string()));

    let mut node = LineageNode::with_id(NodeId::from_string(id), kind)
        .with_timestamp(bag_timestamp(bag));
    node.entity_id = bag
        .get("entity_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    node.record_type = bag
        .get("record_type")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok());
    node.metadata = leftover(
        bag,
        &["id", "node_type", "entity_id", "record_type", "timestamp"],
    );
    Ok(node)
}

fn link_from_bag(value: &Value) -> LineageResult<LineageLink> {
    let bag = value
        .as_object()
        .ok_or_else(|| malformed("node-link edge is not an object"))?;
    let source = bag
        .get("source")
        .and_then(id_string)
        .ok_or_else(|| malformed("node-link edge has no source"))?;
    let target = bag
        .get("target")
        .and_then(id_string)
        .ok_or_else(|| malformed("node-link edge has no target"))?;
    let relationship = bag
        .get("relationship")
        .or_else(|| bag.get("key"))
        .and_then(Value::as_str)
        .unwrap_or("related_to")
        .to_string();

    let mut link = LineageLink::new(
        NodeId::from_string(source),
        NodeId::from_string(target),
        relationship,
    )
    .with_confidence(bag.get("confidence").and_then(Value::as_f64).unwrap_or(1.0))
    .with_timestamp(bag_timestamp(bag));
    link.metadata = leftover(
        bag,
        &["source", "target", "key", "relationship", "confidence", "timestamp"],
    );
    Ok(link)
}

/// Import a node-link document. Links whose endpoints are missing from
/// the node list are dropped rather than rejected.
pub fn from_node_link(value: &Value) -> LineageResult<LineageGraph> {
    let root = value
        .as_object()
        .ok_or_else(|| malformed("node-link document is not an object"))?;

    let nodes = root
        .get("nodes")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(node_from_bag).collect::<LineageResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    let links = root
        .get("links")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(link_from_bag).collect::<LineageResult<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();
    let metadata = match root.get("graph").map(MetaValue::from_json) {
        Some(MetaValue::Object(map)) => map,
        _ => Default::default(),
    };

    Ok(LineageGraph::from_snapshot(GraphSnapshot {
        nodes,
        links,
        metadata,
        ..GraphSnapshot::default()
    }))
}
