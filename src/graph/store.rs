//! The in-memory lineage graph aggregate
//!
//! `LineageGraph` owns every node, link, domain, boundary, version and
//! transformation detail, plus the derived adjacency and entity indexes.
//! It is a plain single-threaded structure; callers needing concurrent
//! mutation must serialize access themselves.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::config::TrackerConfig;
use crate::error::{LineageError, LineageResult};
use crate::record::{Metadata, MetaValue, Record};

use super::domain::{
    BoundaryConstraint, BoundaryId, BoundaryType, DomainId, LineageBoundary, LineageDomain,
};
use super::link::{LineageLink, LinkDirection, LinkKey};
use super::node::{LineageNode, NodeId, NodeKind};
use super::version::{
    DetailId, ImpactLevel, LineageVersion, TransformationDetail, VersionId,
};

/// Serializable, order-stable form of a [`LineageGraph`]
///
/// Collections are sorted by id so the same graph always serializes to
/// the same bytes, which content-addressed storage relies on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<LineageNode>,
    #[serde(default)]
    pub links: Vec<LineageLink>,
    #[serde(default)]
    pub domains: Vec<LineageDomain>,
    #[serde(default)]
    pub boundaries: Vec<LineageBoundary>,
    #[serde(default)]
    pub versions: Vec<LineageVersion>,
    #[serde(default)]
    pub details: Vec<TransformationDetail>,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// The central lineage aggregate: a directed multigraph of nodes and
/// typed links, with domains, boundaries, versions and transformation
/// details attached.
#[derive(Debug, Clone)]
pub struct LineageGraph {
    nodes: HashMap<NodeId, LineageNode>,
    links: HashMap<LinkKey, LineageLink>,
    domains: HashMap<DomainId, LineageDomain>,
    boundaries: HashMap<BoundaryId, LineageBoundary>,
    versions: HashMap<VersionId, LineageVersion>,
    details: HashMap<DetailId, TransformationDetail>,
    /// Graph-level annotations written by analysis passes
    metadata: Metadata,
    // Derived indexes, rebuilt on load
    outgoing: HashMap<NodeId, Vec<LinkKey>>,
    incoming: HashMap<NodeId, Vec<LinkKey>>,
    entity_index: HashMap<String, Vec<NodeId>>,
    // Behavior knobs, not part of graph identity
    temporal_check: bool,
    temporal_tolerance_ms: i64,
}

impl Default for LineageGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl LineageGraph {
    /// Create an empty graph with default behavior
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            links: HashMap::new(),
            domains: HashMap::new(),
            boundaries: HashMap::new(),
            versions: HashMap::new(),
            details: HashMap::new(),
            metadata: Metadata::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            entity_index: HashMap::new(),
            temporal_check: true,
            temporal_tolerance_ms: 100,
        }
    }

    /// Create an empty graph configured from tracker settings
    pub fn with_config(config: &TrackerConfig) -> Self {
        Self {
            temporal_check: config.enable_temporal_consistency,
            temporal_tolerance_ms: config.temporal_tolerance_ms,
            ..Self::new()
        }
    }

    // --- Create operations ---

    /// Register a new domain. The parent, when given, must already exist.
    pub fn create_domain(
        &mut self,
        name: impl Into<String>,
        domain_type: impl Into<String>,
        attributes: Metadata,
        metadata_schema: Metadata,
        parent_domain_id: Option<&DomainId>,
    ) -> LineageResult<DomainId> {
        if let Some(parent) = parent_domain_id {
            if !self.domains.contains_key(parent) {
                return Err(LineageError::validation(format!(
                    "parent domain does not exist: {parent}"
                )));
            }
        }
        let mut domain = LineageDomain::new(name, domain_type);
        domain.attributes = attributes;
        domain.metadata_schema = metadata_schema;
        domain.parent_domain_id = parent_domain_id.cloned();
        let id = domain.id.clone();
        self.domains.insert(id.clone(), domain);
        Ok(id)
    }

    /// Declare a boundary between two existing domains.
    pub fn create_domain_boundary(
        &mut self,
        source_domain_id: &DomainId,
        target_domain_id: &DomainId,
        boundary_type: BoundaryType,
        attributes: Metadata,
        constraints: Vec<BoundaryConstraint>,
    ) -> LineageResult<BoundaryId> {
        for domain_id in [source_domain_id, target_domain_id] {
            if !self.domains.contains_key(domain_id) {
                return Err(LineageError::validation(format!(
                    "domain does not exist: {domain_id}"
                )));
            }
        }
        let mut boundary = LineageBoundary::new(
            source_domain_id.clone(),
            target_domain_id.clone(),
            boundary_type,
        );
        boundary.attributes = attributes;
        boundary.constraints = constraints;
        let id = boundary.id.clone();
        self.boundaries.insert(id.clone(), boundary);
        Ok(id)
    }

    /// Create a standalone node. When a domain is given its id and name
    /// are injected into the node metadata.
    pub fn create_node(
        &mut self,
        node_type: NodeKind,
        mut metadata: Metadata,
        domain_id: Option<&DomainId>,
        entity_id: Option<&str>,
    ) -> LineageResult<NodeId> {
        if let Some(domain_id) = domain_id {
            let domain = self.domains.get(domain_id).ok_or_else(|| {
                LineageError::validation(format!("domain does not exist: {domain_id}"))
            })?;
            metadata.insert(
                "domain_id".to_string(),
                MetaValue::String(domain_id.to_string()),
            );
            metadata.insert(
                "domain_name".to_string(),
                MetaValue::String(domain.name.clone()),
            );
        }
        let mut node = LineageNode::new(node_type);
        node.metadata = metadata;
        node.entity_id = entity_id.map(|e| e.to_string());
        let id = node.id.clone();
        self.index_entities(&node);
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Add a node backed by a lineage record. The node takes the record's
    /// id, so adding the same record twice is rejected.
    pub fn add_record(&mut self, record: &Record) -> LineageResult<NodeId> {
        let id = NodeId::from(&record.id);
        if self.nodes.contains_key(&id) {
            return Err(LineageError::validation(format!(
                "node already exists: {id}"
            )));
        }
        let mut node = LineageNode::with_id(id.clone(), NodeKind::Record)
            .with_record_type(record.record_type())
            .with_timestamp(record.timestamp);
        node.metadata = record.metadata.clone();
        node.metadata.insert(
            "agent_id".to_string(),
            MetaValue::String(record.agent_id.clone()),
        );
        if !record.description.is_empty() {
            node.metadata.insert(
                "description".to_string(),
                MetaValue::String(record.description.clone()),
            );
        }
        if !record.input_ids.is_empty() {
            node.metadata.insert(
                "input_ids".to_string(),
                MetaValue::Array(
                    record
                        .input_ids
                        .iter()
                        .map(|i| MetaValue::String(i.clone()))
                        .collect(),
                ),
            );
        }
        if !record.output_ids.is_empty() {
            node.metadata.insert(
                "output_ids".to_string(),
                MetaValue::Array(
                    record
                        .output_ids
                        .iter()
                        .map(|o| MetaValue::String(o.clone()))
                        .collect(),
                ),
            );
            node.entity_id = Some(record.output_ids[0].clone());
        }
        self.index_entities(&node);
        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Create a link between two existing nodes.
    ///
    /// `cross_domain=true` asserts the link crosses domains; it is
    /// rejected when the endpoint domains differ and no boundary joins
    /// them. Temporal consistency violations are logged, never blocked.
    #[allow(clippy::too_many_arguments)]
    pub fn create_link(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        relationship: impl Into<String>,
        metadata: Metadata,
        confidence: f64,
        direction: LinkDirection,
        cross_domain: bool,
    ) -> LineageResult<LinkKey> {
        let relationship = relationship.into();
        for endpoint in [source, target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(LineageError::validation(format!(
                    "node does not exist: {endpoint}"
                )));
            }
        }
        if cross_domain {
            self.check_cross_domain(source, target)?;
        }

        let (phys_source, phys_target) = match direction {
            LinkDirection::Forward | LinkDirection::Bidirectional => {
                (source.clone(), target.clone())
            }
            LinkDirection::Backward => (target.clone(), source.clone()),
        };
        self.check_temporal(&phys_source, &phys_target, &relationship);

        let mut link = LineageLink::new(phys_source, phys_target, relationship)
            .with_confidence(confidence);
        link.metadata = metadata;
        if cross_domain {
            link.metadata
                .insert("cross_domain".to_string(), MetaValue::Bool(true));
        }
        let key = link.key();
        if direction == LinkDirection::Bidirectional {
            self.insert_link_raw(link.reversed());
        }
        self.insert_link_raw(link);
        Ok(key)
    }

    /// Attach field-level transformation details to an existing node.
    #[allow(clippy::too_many_arguments)]
    pub fn record_transformation_details(
        &mut self,
        transformation_id: &NodeId,
        operation_type: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        parameters: Metadata,
        impact_level: ImpactLevel,
        confidence: f64,
    ) -> LineageResult<DetailId> {
        if !self.nodes.contains_key(transformation_id) {
            return Err(LineageError::validation(format!(
                "node does not exist: {transformation_id}"
            )));
        }
        let mut detail = TransformationDetail::new(transformation_id.clone(), operation_type);
        detail.inputs = inputs;
        detail.outputs = outputs;
        detail.parameters = parameters;
        detail.impact_level = impact_level;
        detail.confidence = confidence.clamp(0.0, 1.0);
        let id = detail.id.clone();
        self.details.insert(id.clone(), detail);
        if let Some(node) = self.nodes.get_mut(transformation_id) {
            node.detail_ids.push(id.clone());
        }
        Ok(id)
    }

    /// Record a new version of a node's entity.
    ///
    /// All validation happens before any mutation, so a rejected call
    /// leaves the graph untouched.
    pub fn create_version(
        &mut self,
        node_id: &NodeId,
        version_number: impl Into<String>,
        parent_version_id: Option<&VersionId>,
        change_description: impl Into<String>,
        creator_id: impl Into<String>,
        metadata: Metadata,
    ) -> LineageResult<VersionId> {
        let version_number = version_number.into();
        let node = self.nodes.get(node_id).ok_or_else(|| {
            LineageError::validation(format!("node does not exist: {node_id}"))
        })?;
        if let Some(parent) = parent_version_id {
            if !self.versions.contains_key(parent) {
                return Err(LineageError::validation(format!(
                    "parent version does not exist: {parent}"
                )));
            }
        }
        let duplicate = node
            .version_ids
            .iter()
            .filter_map(|vid| self.versions.get(vid))
            .any(|v| v.version_number == version_number);
        if duplicate {
            return Err(LineageError::validation(format!(
                "version {version_number} already exists for node {node_id}"
            )));
        }

        let mut version = LineageVersion::new(
            node_id.clone(),
            version_number,
            change_description,
            creator_id,
        );
        version.parent_version_id = parent_version_id.cloned();
        version.metadata = metadata;
        let id = version.id.clone();
        self.versions.insert(id.clone(), version);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.version_ids.push(id.clone());
        }
        Ok(id)
    }

    fn check_cross_domain(&self, source: &NodeId, target: &NodeId) -> LineageResult<()> {
        let source_domain = self
            .nodes
            .get(source)
            .and_then(|n| n.domain_id())
            .map(DomainId::from_string);
        let target_domain = self
            .nodes
            .get(target)
            .and_then(|n| n.domain_id())
            .map(DomainId::from_string);
        if let (Some(a), Some(b)) = (source_domain, target_domain) {
            if a != b && self.boundary_between(&a, &b).is_none() {
                return Err(LineageError::validation(
                    "cannot create cross-domain link without a domain boundary",
                ));
            }
        }
        Ok(())
    }

    fn check_temporal(&self, source: &NodeId, target: &NodeId, relationship: &str) {
        if !self.temporal_check {
            return;
        }
        let (Some(src), Some(tgt)) = (self.nodes.get(source), self.nodes.get(target)) else {
            return;
        };
        let tolerance = Duration::milliseconds(self.temporal_tolerance_ms);
        if src.timestamp - tgt.timestamp > tolerance {
            tracing::warn!(
                "temporal inconsistency on {}-[{}]->{}: target is {}ms older than source",
                source,
                relationship,
                target,
                (src.timestamp - tgt.timestamp).num_milliseconds()
            );
        }
    }

    // --- Raw insertion, used by merge and load ---

    /// Insert or overwrite a node, keeping the entity index in sync.
    pub(crate) fn insert_node_raw(&mut self, node: LineageNode) {
        self.index_entities(&node);
        self.nodes.insert(node.id.clone(), node);
    }

    /// Insert or overwrite a link. Returns false (and inserts nothing)
    /// when either endpoint is missing.
    pub(crate) fn insert_link_raw(&mut self, link: LineageLink) -> bool {
        if !self.nodes.contains_key(&link.source) || !self.nodes.contains_key(&link.target) {
            return false;
        }
        let key = link.key();
        let out = self.outgoing.entry(link.source.clone()).or_default();
        if !out.contains(&key) {
            out.push(key.clone());
        }
        let inc = self.incoming.entry(link.target.clone()).or_default();
        if !inc.contains(&key) {
            inc.push(key.clone());
        }
        self.links.insert(key, link);
        true
    }

    pub(crate) fn insert_domain_raw(&mut self, domain: LineageDomain) {
        self.domains.insert(domain.id.clone(), domain);
    }

    pub(crate) fn insert_boundary_raw(&mut self, boundary: LineageBoundary) {
        self.boundaries.insert(boundary.id.clone(), boundary);
    }

    pub(crate) fn insert_version_raw(&mut self, version: LineageVersion) {
        if let Some(node) = self.nodes.get_mut(&version.node_id) {
            if !node.version_ids.contains(&version.id) {
                node.version_ids.push(version.id.clone());
            }
        }
        self.versions.insert(version.id.clone(), version);
    }

    pub(crate) fn insert_detail_raw(&mut self, detail: TransformationDetail) {
        if let Some(node) = self.nodes.get_mut(&detail.transformation_id) {
            if !node.detail_ids.contains(&detail.id) {
                node.detail_ids.push(detail.id.clone());
            }
        }
        self.details.insert(detail.id.clone(), detail);
    }

    fn index_entities(&mut self, node: &LineageNode) {
        for entity in Self::entity_ids_of(node) {
            let ids = self.entity_index.entry(entity).or_default();
            if !ids.contains(&node.id) {
                ids.push(node.id.clone());
            }
        }
    }

    /// Entities a node participates in: its own entity id plus every
    /// output id recorded in its metadata.
    fn entity_ids_of(node: &LineageNode) -> Vec<String> {
        let mut entities = Vec::new();
        if let Some(entity) = &node.entity_id {
            entities.push(entity.clone());
        }
        if let Some(MetaValue::Array(outputs)) = node.metadata.get("output_ids") {
            for output in outputs {
                if let Some(id) = output.as_str() {
                    if !entities.iter().any(|e| e == id) {
                        entities.push(id.to_string());
                    }
                }
            }
        }
        entities
    }

    // --- Accessors ---

    pub fn node(&self, id: &NodeId) -> Option<&LineageNode> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &LineageNode> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link(&self, key: &LinkKey) -> Option<&LineageLink> {
        self.links.get(key)
    }

    pub fn links(&self) -> impl Iterator<Item = &LineageLink> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn domain(&self, id: &DomainId) -> Option<&LineageDomain> {
        self.domains.get(id)
    }

    pub fn domains(&self) -> impl Iterator<Item = &LineageDomain> {
        self.domains.values()
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn boundary(&self, id: &BoundaryId) -> Option<&LineageBoundary> {
        self.boundaries.get(id)
    }

    pub fn boundaries(&self) -> impl Iterator<Item = &LineageBoundary> {
        self.boundaries.values()
    }

    /// Boundary joining two domains, in either orientation
    pub fn boundary_between(&self, a: &DomainId, b: &DomainId) -> Option<&LineageBoundary> {
        self.boundaries.values().find(|bound| bound.joins(a, b))
    }

    pub fn version(&self, id: &VersionId) -> Option<&LineageVersion> {
        self.versions.get(id)
    }

    pub fn versions(&self) -> impl Iterator<Item = &LineageVersion> {
        self.versions.values()
    }

    pub fn versions_of(&self, node_id: &NodeId) -> Vec<&LineageVersion> {
        self.nodes
            .get(node_id)
            .map(|n| {
                n.version_ids
                    .iter()
                    .filter_map(|vid| self.versions.get(vid))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn detail(&self, id: &DetailId) -> Option<&TransformationDetail> {
        self.details.get(id)
    }

    pub fn details(&self) -> impl Iterator<Item = &TransformationDetail> {
        self.details.values()
    }

    pub fn details_of(&self, node_id: &NodeId) -> Vec<&TransformationDetail> {
        self.nodes
            .get(node_id)
            .map(|n| {
                n.detail_ids
                    .iter()
                    .filter_map(|did| self.details.get(did))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Graph-level annotations
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Set one metadata attribute on an existing node. Returns false
    /// when the node does not exist.
    pub fn set_node_attribute(
        &mut self,
        id: &NodeId,
        key: impl Into<String>,
        value: impl Into<MetaValue>,
    ) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.metadata.insert(key.into(), value.into());
                true
            }
            None => false,
        }
    }

    // --- Adjacency ---

    /// Links leaving a node
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &LineageLink> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.links.get(key))
    }

    /// Links arriving at a node
    pub fn incoming(&self, id: &NodeId) -> impl Iterator<Item = &LineageLink> {
        self.incoming
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|key| self.links.get(key))
    }

    /// Direct successors; a node linked by several relationships
    /// appears once per link.
    pub fn successors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.outgoing(id).map(|l| &l.target)
    }

    /// Direct predecessors
    pub fn predecessors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.incoming(id).map(|l| &l.source)
    }

    pub fn out_degree(&self, id: &NodeId) -> usize {
        self.outgoing.get(id).map(|v| v.len()).unwrap_or(0)
    }

    pub fn in_degree(&self, id: &NodeId) -> usize {
        self.incoming.get(id).map(|v| v.len()).unwrap_or(0)
    }

    /// Nodes with no incoming links
    pub fn roots(&self) -> Vec<&NodeId> {
        self.nodes
            .keys()
            .filter(|id| self.in_degree(id) == 0)
            .collect()
    }

    /// Nodes with no outgoing links
    pub fn sinks(&self) -> Vec<&NodeId> {
        self.nodes
            .keys()
            .filter(|id| self.out_degree(id) == 0)
            .collect()
    }

    /// Every node reachable from `id` along outgoing links, excluding
    /// `id` itself.
    pub fn descendants(&self, id: &NodeId) -> HashSet<NodeId> {
        self.reach(id, true)
    }

    /// Every node that can reach `id` along outgoing links, excluding
    /// `id` itself.
    pub fn ancestors(&self, id: &NodeId) -> HashSet<NodeId> {
        self.reach(id, false)
    }

    fn reach(&self, start: &NodeId, forward: bool) -> HashSet<NodeId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.clone());
        while let Some(current) = queue.pop_front() {
            let next: Vec<NodeId> = if forward {
                self.successors(&current).cloned().collect()
            } else {
                self.predecessors(&current).cloned().collect()
            };
            for neighbor in next {
                if neighbor != *start && seen.insert(neighbor.clone()) {
                    queue.push_back(neighbor);
                }
            }
        }
        seen
    }

    // --- Entity index ---

    /// Nodes recorded against an entity, in insertion order
    pub fn entity_nodes(&self, entity_id: &str) -> &[NodeId] {
        self.entity_index
            .get(entity_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The node with the newest timestamp among an entity's nodes.
    /// Ties go to the most recently indexed node.
    pub fn entity_latest(&self, entity_id: &str) -> Option<&NodeId> {
        let mut latest: Option<&NodeId> = None;
        for id in self.entity_nodes(entity_id) {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            match latest.and_then(|l| self.nodes.get(l)) {
                Some(best) if node.timestamp < best.timestamp => {}
                _ => latest = Some(id),
            }
        }
        latest
    }

    /// Entity ids with at least one recorded node
    pub fn entity_ids(&self) -> impl Iterator<Item = &String> {
        self.entity_index.keys()
    }

    // --- Snapshots ---

    /// Order-stable copy of all graph contents
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut nodes: Vec<LineageNode> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut links: Vec<LineageLink> = self.links.values().cloned().collect();
        links.sort_by_key(|l| l.key());
        let mut domains: Vec<LineageDomain> = self.domains.values().cloned().collect();
        domains.sort_by(|a, b| a.id.cmp(&b.id));
        let mut boundaries: Vec<LineageBoundary> = self.boundaries.values().cloned().collect();
        boundaries.sort_by(|a, b| a.id.cmp(&b.id));
        let mut versions: Vec<LineageVersion> = self.versions.values().cloned().collect();
        versions.sort_by(|a, b| a.id.cmp(&b.id));
        let mut details: Vec<TransformationDetail> = self.details.values().cloned().collect();
        details.sort_by(|a, b| a.id.cmp(&b.id));
        GraphSnapshot {
            nodes,
            links,
            domains,
            boundaries,
            versions,
            details,
            metadata: self.metadata.clone(),
        }
    }

    /// Rebuild a graph from a snapshot, reconstructing all derived
    /// indexes. Links whose endpoints are missing are dropped.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = Self::new();
        for node in snapshot.nodes {
            graph.insert_node_raw(node);
        }
        for link in snapshot.links {
            graph.insert_link_raw(link);
        }
        for domain in snapshot.domains {
            graph.insert_domain_raw(domain);
        }
        for boundary in snapshot.boundaries {
            graph.insert_boundary_raw(boundary);
        }
        for version in snapshot.versions {
            graph.insert_version_raw(version);
        }
        for detail in snapshot.details {
            graph.insert_detail_raw(detail);
        }
        graph.metadata = snapshot.metadata;
        graph
    }

    /// Canonical JSON bytes of this graph, stable across attribute and
    /// insertion order.
    pub fn canonical_bytes(&self) -> LineageResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.snapshot())?)
    }
}

/// Equality over graph contents; derived indexes and behavior knobs do
/// not participate.
impl PartialEq for LineageGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.links == other.links
            && self.domains == other.domains
            && self.boundaries == other.boundaries
            && self.versions == other.versions
            && self.details == other.details
            && self.metadata == other.metadata
    }
}

impl Serialize for LineageGraph {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LineageGraph {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        GraphSnapshot::deserialize(deserializer).map(LineageGraph::from_snapshot)
    }
}
