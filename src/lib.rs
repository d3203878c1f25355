//! Stemma: Cross-Document Data Lineage Engine
//!
//! An embeddable lineage graph engine that records how data moves through a
//! pipeline: which sources were read, which transformations ran, and which
//! entities they produced. The graph is archival: nodes are never deleted,
//! and analysis passes annotate rather than rewrite.
//!
//! # Core Concepts
//!
//! - **Records**: provenance events emitted by a pipeline (source read,
//!   transformation, merge, verification, ...)
//! - **Entities**: logical, versioned pieces of data identified by stable
//!   ids, distinct from the records that produced or consumed them
//! - **Boundaries**: links whose endpoints belong to different documents,
//!   detected and classified by the analysis passes
//!
//! # Example
//!
//! ```
//! use stemma::{LineageTracker, Metadata, TrackerConfig};
//!
//! let mut tracker = LineageTracker::new(TrackerConfig::default());
//! tracker
//!     .record_source("ingest", "dataset:raw", "file", "csv", "/data/raw.csv", Metadata::new())
//!     .unwrap();
//! ```

mod config;
mod error;
mod graph;
mod record;
mod signing;
mod tracker;
mod viz;

pub mod analysis;
pub mod export;
pub mod query;
pub mod storage;

pub use analysis::{
    LineageReport, NoopSemanticAnalyzer, SemanticAnalyzer, SemanticCategory, TokenOverlapAnalyzer,
};
pub use config::{ClusterAlgorithm, TrackerConfig};
pub use error::{LineageError, LineageResult};
pub use graph::{
    BoundaryConstraint, BoundaryId, BoundaryType, DetailId, DomainId, GraphSnapshot, ImpactLevel,
    LineageBoundary, LineageDomain, LineageGraph, LineageLink, LineageNode, LineageVersion,
    LinkDirection, LinkKey, NodeId, NodeKind, TransformationDetail, VersionId,
};
pub use query::LineageQuery;
pub use record::{MetaValue, Metadata, Record, RecordDetail, RecordId, RecordType};
pub use signing::{signer_from_config, NoopSigner, Sha256Signer, Signer};
pub use storage::{
    ContentId, ContentStore, IntegrityReport, IntegrityViolation, MemoryStore, OpenStore,
    RecordArchiver, SqliteStore, StorageError, StorageResult,
};
pub use tracker::LineageTracker;
pub use viz::{build_viz, category_color, NoRenderer, Renderer, VizEdge, VizGraph, VizNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
