//! Record and graph persistence over a content store

use super::codec::{
    self, StoredGraph, StoredGraphIndex, StoredPartition, StoredRecord, TypedLink, GRAPH_INDEX_SCHEMA,
    GRAPH_SCHEMA, PARTITION_SCHEMA, RECORD_SCHEMA,
};
use super::traits::{ContentId, ContentStore, StorageError};
use crate::config::TrackerConfig;
use crate::error::{LineageError, LineageResult};
use crate::graph::{GraphSnapshot, LineageGraph, LineageNode, NodeId};
use crate::query::TraversalDirection;
use crate::record::{Record, RecordId};
use crate::signing::{signer_from_config, Signer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// One record that failed verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityViolation {
    pub record_id: RecordId,
    pub reason: String,
}

/// Outcome of a full integrity sweep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub checked: usize,
    pub valid: usize,
    pub violations: Vec<IntegrityViolation>,
}

impl IntegrityReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Persists records and graphs into a content store and reads them back
///
/// The archiver owns the record-id to content-id map. Stored records
/// carry typed links to the records that produced their inputs
/// (`input/<entity>`) and to the record each output supersedes
/// (`output/<entity>`), which is what `traverse_stored` walks without
/// loading the whole graph.
pub struct RecordArchiver {
    store: Arc<dyn ContentStore>,
    signer: Arc<dyn Signer>,
    /// record id -> content id of its stored envelope
    cid_map: HashMap<RecordId, ContentId>,
    /// entity id -> record that most recently produced it
    entity_producers: HashMap<String, RecordId>,
    /// parent cid -> (link name on the child, child cid)
    children: HashMap<ContentId, Vec<(String, ContentId)>>,
    enable_partitioning: bool,
    partition_size_limit: usize,
}

impl RecordArchiver {
    /// Build an archiver with the signer the configuration asks for.
    pub fn new(store: Arc<dyn ContentStore>, config: &TrackerConfig) -> Self {
        let signer = signer_from_config(config);
        Self::with_signer(store, signer, config)
    }

    /// Build an archiver around an explicit signer.
    pub fn with_signer(
        store: Arc<dyn ContentStore>,
        signer: Arc<dyn Signer>,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            store,
            signer,
            cid_map: HashMap::new(),
            entity_producers: HashMap::new(),
            children: HashMap::new(),
            enable_partitioning: config.enable_partitioning,
            partition_size_limit: config.partition_size_limit.max(1),
        }
    }

    /// The underlying content store.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Content id a record was stored under, if this archiver stored or
    /// loaded it.
    pub fn content_id_of(&self, record_id: &RecordId) -> Option<&ContentId> {
        self.cid_map.get(record_id)
    }

    /// All tracked (record id, content id) pairs, sorted by record id.
    pub fn record_cids(&self) -> Vec<(&RecordId, &ContentId)> {
        let mut pairs: Vec<_> = self.cid_map.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
    }

    fn fetch(&self, id: &ContentId) -> LineageResult<Vec<u8>> {
        match self.store.get(id) {
            Ok(bytes) => Ok(bytes),
            Err(StorageError::ContentNotFound(missing)) => {
                Err(LineageError::not_found(format!("content id {missing}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn index_stored(&mut self, cid: &ContentId, stored: &StoredRecord) {
        self.cid_map
            .insert(stored.record.id.clone(), cid.clone());
        for output in &stored.record.output_ids {
            self.entity_producers
                .insert(output.clone(), stored.record.id.clone());
        }
        for link in &stored.links {
            let entry = self.children.entry(link.target.clone()).or_default();
            if !entry.iter().any(|(_, child)| child == cid) {
                entry.push((link.name.clone(), cid.clone()));
            }
        }
    }

    // --- Records ---

    /// Serialize, optionally sign, and store one record. Typed links to
    /// the producers of its inputs and to each output's previous
    /// producer are derived from what this archiver has already stored.
    pub fn store_record(&mut self, record: &Record) -> LineageResult<ContentId> {
        let mut record = record.clone();
        if record.signature.is_none() {
            record.signature = self.signer.sign(&record.canonical_bytes());
        }

        let mut links = Vec::new();
        for input in &record.input_ids {
            if let Some(cid) = self
                .entity_producers
                .get(input)
                .and_then(|producer| self.cid_map.get(producer))
            {
                links.push(TypedLink::new(format!("input/{input}"), cid.clone()));
            }
        }
        for output in &record.output_ids {
            // Previous producer of the same entity, forming the version chain
            if let Some(cid) = self
                .entity_producers
                .get(output)
                .filter(|producer| **producer != record.id)
                .and_then(|producer| self.cid_map.get(producer))
            {
                links.push(TypedLink::new(format!("output/{output}"), cid.clone()));
            }
        }

        let stored = StoredRecord::new(record, links);
        let value = serde_json::to_value(&stored)?;
        let cid = self.store.put_with_schema(&value, RECORD_SCHEMA)?;
        self.index_stored(&cid, &stored);
        Ok(cid)
    }

    /// Store a batch of records, reporting success or failure per item.
    pub fn store_records_batch(
        &mut self,
        records: &[Record],
    ) -> Vec<(RecordId, LineageResult<ContentId>)> {
        records
            .iter()
            .map(|record| (record.id.clone(), self.store_record(record)))
            .collect()
    }

    /// Load a stored record envelope, links included.
    pub fn load_stored_record(&self, id: &ContentId) -> LineageResult<StoredRecord> {
        let bytes = self.fetch(id)?;
        codec::decode(&bytes, RECORD_SCHEMA)
    }

    /// Load one record by content id.
    pub fn load_record(&self, id: &ContentId) -> LineageResult<Record> {
        Ok(self.load_stored_record(id)?.record)
    }

    /// Load a batch of records, reporting success or failure per item.
    pub fn load_records_batch(
        &self,
        ids: &[ContentId],
    ) -> Vec<(ContentId, LineageResult<Record>)> {
        ids.iter()
            .map(|id| (id.clone(), self.load_record(id)))
            .collect()
    }

    // --- Graphs ---

    /// Store a whole graph. Small graphs go in one object; graphs past
    /// the partition limit are split into temporal buckets (equal
    /// slices when timestamps cannot spread them) behind an index
    /// object, which becomes the returned head.
    pub fn store_graph(&mut self, graph: &LineageGraph) -> LineageResult<ContentId> {
        let snapshot = graph.snapshot();
        let record_cids = self.graph_record_cids(graph);
        let mut roots: Vec<NodeId> = graph.roots().into_iter().cloned().collect();
        roots.sort();

        if !self.enable_partitioning || snapshot.nodes.len() <= self.partition_size_limit {
            let stored = StoredGraph {
                schema: GRAPH_SCHEMA.to_string(),
                snapshot,
                record_cids,
                roots,
            };
            let value = serde_json::to_value(&stored)?;
            return Ok(self.store.put_with_schema(&value, GRAPH_SCHEMA)?);
        }

        let buckets = partition_nodes(&snapshot.nodes, self.partition_size_limit);
        let mut partition_of: HashMap<NodeId, usize> = HashMap::new();
        for (index, bucket) in buckets.iter().enumerate() {
            for node in bucket {
                partition_of.insert(node.id.clone(), index);
            }
        }

        let mut partition_cids = Vec::with_capacity(buckets.len());
        let mut cross_links = Vec::new();
        for (index, bucket) in buckets.into_iter().enumerate() {
            let members: HashSet<NodeId> = bucket.iter().map(|n| n.id.clone()).collect();
            let mut boundary: Vec<NodeId> = Vec::new();
            for node in &bucket {
                let crosses = graph
                    .outgoing(&node.id)
                    .map(|l| &l.target)
                    .chain(graph.incoming(&node.id).map(|l| &l.source))
                    .any(|other| !members.contains(other));
                if crosses {
                    boundary.push(node.id.clone());
                }
            }
            boundary.sort();

            let mut part_snapshot = GraphSnapshot {
                nodes: bucket,
                ..GraphSnapshot::default()
            };
            part_snapshot.links = snapshot
                .links
                .iter()
                .filter(|l| members.contains(&l.source) && members.contains(&l.target))
                .cloned()
                .collect();
            part_snapshot.versions = snapshot
                .versions
                .iter()
                .filter(|v| members.contains(&v.node_id))
                .cloned()
                .collect();
            part_snapshot.details = snapshot
                .details
                .iter()
                .filter(|d| members.contains(&d.transformation_id))
                .cloned()
                .collect();

            let stored = StoredPartition {
                schema: PARTITION_SCHEMA.to_string(),
                index,
                snapshot: part_snapshot,
                boundary_nodes: boundary,
            };
            let value = serde_json::to_value(&stored)?;
            partition_cids.push(self.store.put_with_schema(&value, PARTITION_SCHEMA)?);
        }

        for link in &snapshot.links {
            if partition_of.get(&link.source) != partition_of.get(&link.target) {
                cross_links.push(link.clone());
            }
        }

        let stored = StoredGraphIndex {
            schema: GRAPH_INDEX_SCHEMA.to_string(),
            partitions: partition_cids,
            cross_links,
            domains: snapshot.domains,
            boundaries: snapshot.boundaries,
            metadata: snapshot.metadata,
            record_cids,
            roots,
        };
        let value = serde_json::to_value(&stored)?;
        Ok(self.store.put_with_schema(&value, GRAPH_INDEX_SCHEMA)?)
    }

    /// Load a graph stored by `store_graph`, whole or partitioned, and
    /// repopulate this archiver's record and traversal indexes from it.
    pub fn load_graph(&mut self, id: &ContentId) -> LineageResult<LineageGraph> {
        let bytes = self.fetch(id)?;
        let schema = codec::schema_of(&bytes)?;
        let (snapshot, record_cids) = match schema.as_str() {
            GRAPH_SCHEMA => {
                let stored: StoredGraph = codec::decode(&bytes, GRAPH_SCHEMA)?;
                (stored.snapshot, stored.record_cids)
            }
            GRAPH_INDEX_SCHEMA => {
                let stored: StoredGraphIndex = codec::decode(&bytes, GRAPH_INDEX_SCHEMA)?;
                let mut parts = Vec::with_capacity(stored.partitions.len());
                for cid in &stored.partitions {
                    let part_bytes = self.fetch(cid)?;
                    let part: StoredPartition = codec::decode(&part_bytes, PARTITION_SCHEMA)?;
                    parts.push(part);
                }
                parts.sort_by_key(|p| p.index);

                let mut snapshot = GraphSnapshot {
                    domains: stored.domains,
                    boundaries: stored.boundaries,
                    metadata: stored.metadata,
                    ..GraphSnapshot::default()
                };
                for part in parts {
                    snapshot.nodes.extend(part.snapshot.nodes);
                    snapshot.links.extend(part.snapshot.links);
                    snapshot.versions.extend(part.snapshot.versions);
                    snapshot.details.extend(part.snapshot.details);
                }
                snapshot.links.extend(stored.cross_links);
                (snapshot, stored.record_cids)
            }
            other => {
                return Err(LineageError::MalformedRecord(format!(
                    "expected a stored graph, found schema {other}"
                )))
            }
        };

        let graph = LineageGraph::from_snapshot(snapshot);
        self.reindex_from(&record_cids)?;
        Ok(graph)
    }

    /// Rebuild cid, producer and child indexes from a stored record map.
    fn reindex_from(&mut self, record_cids: &BTreeMap<String, ContentId>) -> LineageResult<()> {
        self.cid_map.clear();
        self.entity_producers.clear();
        self.children.clear();

        // Replay in timestamp order so the producer map lands on the
        // newest record for each entity, matching store order.
        let mut stored: Vec<(ContentId, StoredRecord)> = Vec::with_capacity(record_cids.len());
        for cid in record_cids.values() {
            stored.push((cid.clone(), self.load_stored_record(cid)?));
        }
        stored.sort_by(|a, b| {
            a.1.record
                .timestamp
                .cmp(&b.1.record.timestamp)
                .then_with(|| a.1.record.id.cmp(&b.1.record.id))
        });
        for (cid, envelope) in stored {
            self.index_stored(&cid, &envelope);
        }
        Ok(())
    }

    /// Record ids of the graph's nodes that this archiver has stored,
    /// keyed by id string for a stable stored shape.
    fn graph_record_cids(&self, graph: &LineageGraph) -> BTreeMap<String, ContentId> {
        self.cid_map
            .iter()
            .filter(|(record_id, _)| graph.has_node(&NodeId::from(*record_id)))
            .map(|(record_id, cid)| (record_id.to_string(), cid.clone()))
            .collect()
    }

    // --- Stored-structure traversal ---

    /// BFS over stored typed links from one record, without loading the
    /// whole graph. `Backward` follows the links a record carries (its
    /// producers), `Forward` follows records stored later that link back
    /// to it. `relation_filter` keeps only links whose name prefix
    /// (before `/`) matches. Returns content ids in visit order,
    /// starting with `start`.
    pub fn traverse_stored(
        &self,
        start: &ContentId,
        max_depth: usize,
        direction: TraversalDirection,
        relation_filter: Option<&str>,
    ) -> LineageResult<Vec<ContentId>> {
        // Fail fast on a bad starting point
        let _ = self.load_stored_record(start)?;

        let mut visited: HashSet<ContentId> = HashSet::from([start.clone()]);
        let mut order = vec![start.clone()];
        let mut queue: VecDeque<(ContentId, usize)> = VecDeque::from([(start.clone(), 0)]);

        while let Some((cid, depth)) = queue.pop_front() {
            if depth == max_depth {
                continue;
            }
            let mut neighbors: Vec<(String, ContentId)> = Vec::new();
            if matches!(
                direction,
                TraversalDirection::Backward | TraversalDirection::Both
            ) {
                let stored = self.load_stored_record(&cid)?;
                neighbors.extend(
                    stored
                        .links
                        .into_iter()
                        .map(|link| (link.name, link.target)),
                );
            }
            if matches!(
                direction,
                TraversalDirection::Forward | TraversalDirection::Both
            ) {
                if let Some(children) = self.children.get(&cid) {
                    neighbors.extend(children.iter().cloned());
                }
            }
            neighbors.retain(|(name, _)| match relation_filter {
                Some(filter) => name.split('/').next() == Some(filter),
                None => true,
            });
            neighbors.sort();

            for (_, next) in neighbors {
                if visited.insert(next.clone()) {
                    order.push(next.clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }
        Ok(order)
    }

    // --- Verification ---

    /// Re-check every record this archiver tracks: signatures are
    /// recomputed against canonical bytes, and every typed link must
    /// resolve to content that is actually present. A record with a
    /// good signature but a dangling link is still invalid.
    pub fn verify_integrity(&self) -> LineageResult<IntegrityReport> {
        let mut report = IntegrityReport::default();
        for (record_id, cid) in self.record_cids() {
            report.checked += 1;
            let stored = match self.load_stored_record(cid) {
                Ok(stored) => stored,
                Err(e) => {
                    report.violations.push(IntegrityViolation {
                        record_id: record_id.clone(),
                        reason: format!("unreadable stored record: {e}"),
                    });
                    continue;
                }
            };

            let bytes = stored.record.canonical_bytes();
            let mut reasons = Vec::new();
            match &stored.record.signature {
                Some(signature) => {
                    if !self.signer.verify(&bytes, signature) {
                        reasons.push("signature mismatch".to_string());
                    }
                }
                None => {
                    if self.signer.sign(&bytes).is_some() {
                        reasons.push("record is unsigned but signing is enabled".to_string());
                    }
                }
            }

            for link in &stored.links {
                if !self.store.has(&link.target)? {
                    reasons.push(format!("dangling reference {}", link.name));
                }
            }

            if reasons.is_empty() {
                report.valid += 1;
            } else {
                report.violations.push(IntegrityViolation {
                    record_id: record_id.clone(),
                    reason: reasons.join("; "),
                });
            }
        }
        Ok(report)
    }
}

/// Split nodes into buckets of at most `limit`, preferring buckets that
/// follow the timestamp axis. Falls back to equal slices of the
/// (timestamp, id)-sorted list when timestamps cannot spread the nodes
/// evenly enough.
fn partition_nodes(nodes: &[LineageNode], limit: usize) -> Vec<Vec<LineageNode>> {
    let mut sorted: Vec<LineageNode> = nodes.to_vec();
    sorted.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

    let count = sorted.len().div_ceil(limit);
    if count <= 1 {
        return vec![sorted];
    }

    let earliest = sorted.first().map(|n| n.timestamp);
    let latest = sorted.last().map(|n| n.timestamp);
    if let (Some(earliest), Some(latest)) = (earliest, latest) {
        let span = (latest - earliest).num_milliseconds();
        if span > 0 {
            let mut buckets: Vec<Vec<LineageNode>> = vec![Vec::new(); count];
            for node in &sorted {
                let offset = (node.timestamp - earliest).num_milliseconds();
                let index = ((offset as u128 * count as u128) / (span as u128 + 1)) as usize;
                buckets[index.min(count - 1)].push(node.clone());
            }
            buckets.retain(|b| !b.is_empty());
            if buckets.iter().all(|b| b.len() <= limit) {
                return buckets;
            }
        }
    }

    // Equal slices keep every bucket under the limit by construction
    sorted
        .chunks(limit)
        .map(|chunk| chunk.to_vec())
        .collect()
}
