//! Attribute-filter queries
//!
//! A conjunctive builder: every condition added must hold for a node
//! to be selected. Execution materializes the selected nodes plus the
//! links among them into a fresh graph.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::graph::{DomainId, LineageGraph, LineageNode, NodeKind};
use crate::record::{MetaValue, RecordType};

use super::subgraph::induced_subgraph;

/// Builder for node-filter queries
///
/// ```
/// use stemma::{LineageQuery, RecordType};
///
/// let query = LineageQuery::new()
///     .record_type(RecordType::Transformation)
///     .metadata_equals("tool", "spark");
/// ```
#[derive(Debug, Clone, Default)]
pub struct LineageQuery {
    node_kind: Option<NodeKind>,
    record_type: Option<RecordType>,
    entity_id: Option<String>,
    domain_id: Option<DomainId>,
    after: Option<DateTime<Utc>>,
    before: Option<DateTime<Utc>>,
    metadata_equals: Vec<(String, MetaValue)>,
    relationship: Option<String>,
}

impl LineageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep nodes of this kind.
    pub fn node_kind(mut self, kind: NodeKind) -> Self {
        self.node_kind = Some(kind);
        self
    }

    /// Keep nodes backed by this record type.
    pub fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = Some(record_type);
        self
    }

    /// Keep nodes tracking this entity.
    pub fn entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Keep nodes belonging to this domain.
    pub fn domain(mut self, domain_id: DomainId) -> Self {
        self.domain_id = Some(domain_id);
        self
    }

    /// Keep nodes with `timestamp >= after`.
    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    /// Keep nodes with `timestamp <= before`.
    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    /// Keep nodes whose metadata carries exactly this key/value pair.
    /// May be given several times; all pairs must match.
    pub fn metadata_equals(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata_equals.push((key.into(), value.into()));
        self
    }

    /// Keep nodes with at least one incident link of this relationship
    /// type. Materialized links are restricted to the same type.
    pub fn relationship(mut self, relationship: impl Into<String>) -> Self {
        self.relationship = Some(relationship.into());
        self
    }

    /// Whether a node satisfies every condition of this query.
    pub fn matches(&self, graph: &LineageGraph, node: &LineageNode) -> bool {
        self.matches_attributes(node) && self.matches_relationship(graph, node)
    }

    fn matches_attributes(&self, node: &LineageNode) -> bool {
        if let Some(kind) = &self.node_kind {
            if &node.node_type != kind {
                return false;
            }
        }
        if let Some(record_type) = &self.record_type {
            if node.record_type.as_ref() != Some(record_type) {
                return false;
            }
        }
        if let Some(entity) = &self.entity_id {
            if node.entity_id.as_deref() != Some(entity.as_str()) {
                return false;
            }
        }
        if let Some(domain) = &self.domain_id {
            if node.domain_id() != Some(domain.as_str()) {
                return false;
            }
        }
        if let Some(after) = self.after {
            if node.timestamp < after {
                return false;
            }
        }
        if let Some(before) = self.before {
            if node.timestamp > before {
                return false;
            }
        }
        for (key, value) in &self.metadata_equals {
            if node.metadata.get(key) != Some(value) {
                return false;
            }
        }
        true
    }

    fn matches_relationship(&self, graph: &LineageGraph, node: &LineageNode) -> bool {
        let Some(relationship) = &self.relationship else {
            return true;
        };
        graph
            .outgoing(&node.id)
            .chain(graph.incoming(&node.id))
            .any(|link| &link.relationship == relationship)
    }

    /// Run the query, materializing the selected nodes and the links
    /// among them.
    pub fn execute(&self, graph: &LineageGraph) -> LineageGraph {
        let included: HashSet<crate::graph::NodeId> = graph
            .nodes()
            .filter(|node| self.matches(graph, node))
            .map(|node| node.id.clone())
            .collect();
        let types = self
            .relationship
            .as_ref()
            .map(|relationship| vec![relationship.clone()]);
        induced_subgraph(graph, &included, types.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{LineageLink, LineageNode, NodeId};
    use chrono::TimeZone;

    fn sample_graph() -> LineageGraph {
        let mut graph = LineageGraph::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        graph.insert_node_raw(
            LineageNode::with_id("src", NodeKind::Record)
                .with_record_type(RecordType::Source)
                .with_entity("dataset-1")
                .with_attribute("tool", "extractor")
                .with_timestamp(t),
        );
        graph.insert_node_raw(
            LineageNode::with_id("xform", NodeKind::Record)
                .with_record_type(RecordType::Transformation)
                .with_entity("dataset-2")
                .with_attribute("tool", "spark")
                .with_timestamp(t + chrono::Duration::hours(1)),
        );
        graph.insert_node_raw(
            LineageNode::with_id("check", NodeKind::Record)
                .with_record_type(RecordType::Verification)
                .with_timestamp(t + chrono::Duration::hours(2)),
        );
        graph.insert_link_raw(LineageLink::new(
            NodeId::from("xform"),
            NodeId::from("src"),
            "derived_from",
        ));
        graph.insert_link_raw(LineageLink::new(
            NodeId::from("check"),
            NodeId::from("xform"),
            "verifies",
        ));
        graph
    }

    #[test]
    fn empty_query_selects_everything() {
        let graph = sample_graph();
        let result = LineageQuery::new().execute(&graph);
        assert_eq!(result.node_count(), 3);
        assert_eq!(result.link_count(), 2);
    }

    #[test]
    fn record_type_filter_is_exact() {
        let graph = sample_graph();
        let result = LineageQuery::new()
            .record_type(RecordType::Transformation)
            .execute(&graph);
        assert_eq!(result.node_count(), 1);
        assert!(result.has_node(&NodeId::from("xform")));
    }

    #[test]
    fn conditions_are_conjunctive() {
        let graph = sample_graph();
        let result = LineageQuery::new()
            .record_type(RecordType::Transformation)
            .metadata_equals("tool", "extractor")
            .execute(&graph);
        assert_eq!(result.node_count(), 0);
    }

    #[test]
    fn entity_filter_matches_tracked_entity() {
        let graph = sample_graph();
        let result = LineageQuery::new().entity("dataset-1").execute(&graph);
        assert_eq!(result.node_count(), 1);
        assert!(result.has_node(&NodeId::from("src")));
    }

    #[test]
    fn time_range_is_inclusive() {
        let graph = sample_graph();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let result = LineageQuery::new()
            .after(t)
            .before(t + chrono::Duration::hours(1))
            .execute(&graph);
        assert_eq!(result.node_count(), 2);
        assert!(!result.has_node(&NodeId::from("check")));
    }

    #[test]
    fn relationship_filter_needs_an_incident_link() {
        let graph = sample_graph();
        let result = LineageQuery::new().relationship("verifies").execute(&graph);
        // both endpoints of the verifies link qualify
        assert_eq!(result.node_count(), 2);
        assert_eq!(result.link_count(), 1);
        assert!(result.has_node(&NodeId::from("check")));
        assert!(result.has_node(&NodeId::from("xform")));
    }

    #[test]
    fn metadata_filter_matches_values() {
        let graph = sample_graph();
        let result = LineageQuery::new()
            .metadata_equals("tool", "spark")
            .execute(&graph);
        assert_eq!(result.node_count(), 1);
        assert!(result.has_node(&NodeId::from("xform")));
    }
}
