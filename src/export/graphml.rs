//! GraphML export
//!
//! Export only. GraphML wants every attribute declared up front with a
//! type, so attribute keys are collected in a first pass; values whose
//! type varies across the graph, and nested values, are stringified.
//! Output is fully deterministic: keys, nodes and edges all come out
//! sorted the way the snapshot sorts them.

use crate::graph::{LineageGraph, LineageLink, LineageNode};
use crate::record::MetaValue;
use std::collections::BTreeMap;
use std::fmt::Write;

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<graphml xmlns="http://graphml.graphdrawing.org/xmlns">
"#;

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// GraphML attr.type for a value, when it has a stable primitive one
fn value_type(value: &MetaValue) -> &'static str {
    match value {
        MetaValue::String(_) => "string",
        MetaValue::Int(_) => "long",
        MetaValue::Float(_) => "double",
        MetaValue::Bool(_) => "boolean",
        MetaValue::Array(_) | MetaValue::Object(_) | MetaValue::Null => "string",
    }
}

/// Key id usable as an XML NMTOKEN
fn key_id(prefix: &str, name: &str) -> String {
    let clean: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{prefix}_{clean}")
}

/// Merge an attribute's type across occurrences; disagreement widens to
/// string.
fn merge_type(types: &mut BTreeMap<String, &'static str>, name: &str, value: &MetaValue) {
    let next = value_type(value);
    types
        .entry(name.to_string())
        .and_modify(|current| {
            if *current != next {
                *current = "string";
            }
        })
        .or_insert(next);
}

fn node_attributes(node: &LineageNode) -> Vec<(String, MetaValue)> {
    let mut attrs: Vec<(String, MetaValue)> = Vec::new();
    attrs.push((
        "node_type".to_string(),
        MetaValue::String(node.node_type.as_label().to_string()),
    ));
    if let Some(entity) = &node.entity_id {
        attrs.push(("entity_id".to_string(), MetaValue::String(entity.clone())));
    }
    if let Some(record_type) = &node.record_type {
        attrs.push((
            "record_type".to_string(),
            MetaValue::String(record_type.as_str().to_string()),
        ));
    }
    attrs.push((
        "timestamp".to_string(),
        MetaValue::String(node.timestamp.to_rfc3339()),
    ));
    for (key, value) in &node.metadata {
        attrs.push((key.clone(), value.clone()));
    }
    attrs
}

fn edge_attributes(link: &LineageLink) -> Vec<(String, MetaValue)> {
    let mut attrs: Vec<(String, MetaValue)> = Vec::new();
    attrs.push((
        "relationship".to_string(),
        MetaValue::String(link.relationship.clone()),
    ));
    attrs.push(("confidence".to_string(), MetaValue::Float(link.confidence)));
    attrs.push((
        "timestamp".to_string(),
        MetaValue::String(link.timestamp.to_rfc3339()),
    ));
    for (key, value) in &link.metadata {
        attrs.push((key.clone(), value.clone()));
    }
    attrs
}

/// Render a graph as a GraphML document.
pub fn to_graphml(graph: &LineageGraph) -> String {
    let snapshot = graph.snapshot();

    let mut node_types: BTreeMap<String, &'static str> = BTreeMap::new();
    for node in &snapshot.nodes {
        for (name, value) in node_attributes(node) {
            merge_type(&mut node_types, &name, &value);
        }
    }
    let mut edge_types: BTreeMap<String, &'static str> = BTreeMap::new();
    for link in &snapshot.links {
        for (name, value) in edge_attributes(link) {
            merge_type(&mut edge_types, &name, &value);
        }
    }

    let mut out = String::from(HEADER);
    for (name, attr_type) in &node_types {
        let _ = writeln!(
            out,
            r#"  <key id="{}" for="node" attr.name="{}" attr.type="{}"/>"#,
            key_id("n", name),
            escape(name),
            attr_type
        );
    }
    for (name, attr_type) in &edge_types {
        let _ = writeln!(
            out,
            r#"  <key id="{}" for="edge" attr.name="{}" attr.type="{}"/>"#,
            key_id("e", name),
            escape(name),
            attr_type
        );
    }

    let _ = writeln!(out, r#"  <graph id="lineage" edgedefault="directed">"#);
    for node in &snapshot.nodes {
        let _ = writeln!(out, r#"    <node id="{}">"#, escape(node.id.as_str()));
        for (name, value) in node_attributes(node) {
            let _ = writeln!(
                out,
                r#"      <data key="{}">{}</data>"#,
                key_id("n", &name),
                escape(&value.to_flat_string())
            );
        }
        let _ = writeln!(out, "    </node>");
    }
    for link in &snapshot.links {
        let _ = writeln!(
            out,
            r#"    <edge source="{}" target="{}">"#,
            escape(link.source.as_str()),
            escape(link.target.as_str())
        );
        for (name, value) in edge_attributes(link) {
            let _ = writeln!(
                out,
                r#"      <data key="{}">{}</data>"#,
                key_id("e", &name),
                escape(&value.to_flat_string())
            );
        }
        let _ = writeln!(out, "    </edge>");
    }
    let _ = writeln!(out, "  </graph>");
    out.push_str("</graphml>\n");
    out
}
