//! Analysis passes over a lineage graph
//!
//! Every pass here is a pure read of a [`LineageGraph`](crate::graph::LineageGraph)
//! that returns its own report struct:
//!
//! - **Boundary detection**: links whose endpoints sit in different documents
//! - **Semantic classification**: relationship names mapped into fixed categories
//! - **Document clustering**: community detection over the document co-occurrence graph
//! - **Metrics**: impact/dependency scores, betweenness centrality, upstream
//!   complexity and critical paths
//!
//! Reports can be applied back onto graph metadata explicitly; the passes
//! themselves never mutate shared state, so re-running one always yields
//! the same result on the same graph.

mod boundary;
mod cluster;
mod metrics;
mod semantic;
mod summary;

pub use boundary::{analyze_boundaries, BoundaryEdge, BoundaryReport};
pub use cluster::{detect_clusters, ClusterReport};
pub use metrics::{
    betweenness_centrality, betweenness_for_type, complexity, critical_paths,
    critical_paths_with, dependency_score, impact_score, ComplexityReport, CriticalPath,
    CRITICAL_PATH_THRESHOLD,
};
pub use semantic::{
    analyze_semantics, classify_name, classify_relationship, ClassifiedEdge,
    NoopSemanticAnalyzer, RelatedPair, SemanticAnalyzer, SemanticCategory, SemanticReport,
    TokenOverlapAnalyzer,
};
pub use summary::{
    analyze_graph, basic_metrics, time_analysis, BasicMetrics, LineageReport, TimeAnalysis,
};
