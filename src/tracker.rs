//! High-level lineage tracking session
//!
//! [`LineageTracker`] is the explicit context object callers hold for the
//! lifetime of a pipeline run. It owns the graph, the configuration, the
//! signing and semantic-detection capabilities, and (optionally) a content
//! store with its archiver. There is no process-wide session; two trackers
//! never share state unless they share a store.
//!
//! The `record_*` operations are the main entry points: each builds a
//! [`Record`], adds it to the graph, links the new node to the latest
//! producer of every input entity, and persists the record when a store is
//! attached.

use std::sync::Arc;

use crate::analysis::{
    analyze_graph, LineageReport, NoopSemanticAnalyzer, SemanticAnalyzer, TokenOverlapAnalyzer,
};
use crate::config::TrackerConfig;
use crate::error::{LineageError, LineageResult};
use crate::graph::{LineageGraph, LinkDirection, NodeId};
use crate::query;
use crate::record::{Metadata, Record, RecordDetail, RecordId, RecordType};
use crate::signing::{signer_from_config, Signer};
use crate::storage::{ContentId, ContentStore, IntegrityReport, RecordArchiver};

/// Relationship used when linking a record's node back to the producer
/// of one of its input entities.
fn input_relationship(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::Verification => "verifies",
        RecordType::Query => "queries",
        RecordType::Annotation => "annotates",
        _ => "derived_from",
    }
}

/// A lineage tracking session.
pub struct LineageTracker {
    config: TrackerConfig,
    graph: LineageGraph,
    signer: Arc<dyn Signer>,
    detector: Arc<dyn SemanticAnalyzer>,
    archiver: Option<RecordArchiver>,
}

impl LineageTracker {
    /// In-memory tracker with no persistence.
    pub fn new(config: TrackerConfig) -> Self {
        let signer = signer_from_config(&config);
        let detector: Arc<dyn SemanticAnalyzer> = if config.enable_semantic_detection {
            Arc::new(TokenOverlapAnalyzer::new(config.semantic_similarity_threshold))
        } else {
            Arc::new(NoopSemanticAnalyzer)
        };
        Self {
            graph: LineageGraph::with_config(&config),
            signer,
            detector,
            archiver: None,
            config,
        }
    }

    /// Tracker backed by a content store. Records are written through to
    /// the store as they are recorded; the archiver signs them with the
    /// tracker's own signer.
    pub fn with_store(config: TrackerConfig, store: Arc<dyn ContentStore>) -> Self {
        let mut tracker = Self::new(config);
        tracker.archiver = Some(RecordArchiver::with_signer(
            store,
            tracker.signer.clone(),
            &tracker.config,
        ));
        tracker
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut LineageGraph {
        &mut self.graph
    }

    pub fn archiver(&self) -> Option<&RecordArchiver> {
        self.archiver.as_ref()
    }

    pub fn archiver_mut(&mut self) -> Option<&mut RecordArchiver> {
        self.archiver.as_mut()
    }

    // === Recording ===

    /// Ingest a prepared record: add its node, link it to the latest
    /// producer of each input entity, and persist it when a store is
    /// attached. Inputs nobody has produced yet are left unlinked.
    pub fn record(&mut self, record: Record) -> LineageResult<RecordId> {
        let producers: Vec<NodeId> = record
            .input_ids
            .iter()
            .filter_map(|entity| self.graph.entity_latest(entity))
            .cloned()
            .collect();
        let node = self.graph.add_record(&record)?;
        let relationship = input_relationship(record.record_type());
        for producer in producers {
            self.graph.create_link(
                &node,
                &producer,
                relationship,
                Metadata::new(),
                1.0,
                LinkDirection::Forward,
                false,
            )?;
        }
        if let Some(archiver) = self.archiver.as_mut() {
            archiver.store_record(&record)?;
        }
        Ok(record.id)
    }

    /// Record raw data entering the pipeline as `entity_id`.
    pub fn record_source(
        &mut self,
        agent_id: impl Into<String>,
        entity_id: impl Into<String>,
        source_type: impl Into<String>,
        format: impl Into<String>,
        location: impl Into<String>,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::Source {
            source_type: source_type.into(),
            format: format.into(),
            location: location.into(),
        };
        self.record(build_record(agent_id, detail, &[], &[&entity_id.into()], metadata))
    }

    /// Record a derivation of `output` from `inputs` by a tool.
    #[allow(clippy::too_many_arguments)]
    pub fn record_transformation(
        &mut self,
        agent_id: impl Into<String>,
        inputs: &[&str],
        output: impl Into<String>,
        transformation_type: impl Into<String>,
        tool: impl Into<String>,
        parameters: Metadata,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::Transformation {
            transformation_type: transformation_type.into(),
            tool: tool.into(),
            parameters,
        };
        self.record(build_record(agent_id, detail, inputs, &[&output.into()], metadata))
    }

    /// Record several input entities combined into `output`.
    pub fn record_merge(
        &mut self,
        agent_id: impl Into<String>,
        inputs: &[&str],
        output: impl Into<String>,
        strategy: impl Into<String>,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::Merge {
            strategy: strategy.into(),
        };
        self.record(build_record(agent_id, detail, inputs, &[&output.into()], metadata))
    }

    /// Record a read against an entity. Produces no output entity; the
    /// node links to the entity's producer with a `queries` edge.
    pub fn record_query(
        &mut self,
        agent_id: impl Into<String>,
        entity_id: impl Into<String>,
        query_text: impl Into<String>,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::Query {
            query_text: query_text.into(),
        };
        self.record(build_record(agent_id, detail, &[&entity_id.into()], &[], metadata))
    }

    /// Record a validation run over an entity (`verifies` edge).
    #[allow(clippy::too_many_arguments)]
    pub fn record_verification(
        &mut self,
        agent_id: impl Into<String>,
        entity_id: impl Into<String>,
        pass_count: u32,
        fail_count: u32,
        is_valid: bool,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::Verification {
            pass_count,
            fail_count,
            is_valid,
        };
        self.record(build_record(agent_id, detail, &[&entity_id.into()], &[], metadata))
    }

    /// Record commentary attached to an entity (`annotates` edge).
    pub fn record_annotation(
        &mut self,
        agent_id: impl Into<String>,
        entity_id: impl Into<String>,
        annotation_type: impl Into<String>,
        content: impl Into<String>,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::Annotation {
            annotation_type: annotation_type.into(),
            content: content.into(),
        };
        self.record(build_record(agent_id, detail, &[&entity_id.into()], &[], metadata))
    }

    /// Record a model trained from `inputs`, producing `model_entity`.
    pub fn record_training(
        &mut self,
        agent_id: impl Into<String>,
        inputs: &[&str],
        model_entity: impl Into<String>,
        model_type: impl Into<String>,
        hyperparameters: Metadata,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let detail = RecordDetail::ModelTraining {
            model_type: model_type.into(),
            hyperparameters,
        };
        self.record(build_record(agent_id, detail, inputs, &[&model_entity.into()], metadata))
    }

    /// Record a model applied to `inputs`, producing `output`. The model
    /// entity counts as an input, so the prediction links back to the
    /// training record that produced the model.
    pub fn record_inference(
        &mut self,
        agent_id: impl Into<String>,
        model_entity: impl Into<String>,
        inputs: &[&str],
        output: impl Into<String>,
        metadata: Metadata,
    ) -> LineageResult<RecordId> {
        let model_entity = model_entity.into();
        let detail = RecordDetail::ModelInference {
            model_id: model_entity.clone(),
        };
        let mut all_inputs: Vec<&str> = vec![model_entity.as_str()];
        all_inputs.extend_from_slice(inputs);
        self.record(build_record(agent_id, detail, &all_inputs, &[&output.into()], metadata))
    }

    // === Queries and Analysis ===

    /// Everything connected to one entity, including semantically related
    /// nodes when detection is enabled.
    pub fn entity_lineage(&self, entity_id: &str) -> LineageGraph {
        query::entity_lineage(
            &self.graph,
            entity_id,
            self.detector.as_ref(),
            self.config.max_semantic_candidates,
        )
    }

    /// Run every analysis pass, write the aggregate results into the
    /// graph's metadata and node attributes, and return the full report.
    pub fn analyze(&mut self) -> LineageReport {
        let report = analyze_graph(&self.graph, &self.config);
        report.boundaries.apply_to(self.graph.metadata_mut());
        report.semantics.apply_to(self.graph.metadata_mut());
        report.clusters.apply(&mut self.graph);
        report
    }

    // === Persistence ===

    /// Store the current graph, returning the content id of its head
    /// object. Fails when no store is configured.
    pub fn store(&mut self) -> LineageResult<ContentId> {
        let archiver = self.archiver.as_mut().ok_or_else(no_store)?;
        archiver.store_graph(&self.graph)
    }

    /// Replace the current graph with one loaded from the store.
    pub fn load(&mut self, id: &ContentId) -> LineageResult<()> {
        let archiver = self.archiver.as_mut().ok_or_else(no_store)?;
        self.graph = archiver.load_graph(id)?;
        Ok(())
    }

    /// Check every stored record for signature validity and dangling
    /// references.
    pub fn verify(&self) -> LineageResult<IntegrityReport> {
        let archiver = self.archiver.as_ref().ok_or_else(no_store)?;
        archiver.verify_integrity()
    }
}

fn no_store() -> LineageError {
    LineageError::validation("no content store configured")
}

fn build_record(
    agent_id: impl Into<String>,
    detail: RecordDetail,
    inputs: &[&str],
    outputs: &[&str],
    metadata: Metadata,
) -> Record {
    let mut record = Record::new(agent_id, detail);
    for entity in inputs {
        record = record.with_input(*entity);
    }
    for entity in outputs {
        record = record.with_output(*entity);
    }
    record.metadata = metadata;
    record
}
