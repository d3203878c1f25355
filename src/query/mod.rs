//! Query operations over lineage graphs
//!
//! Subgraph extraction around a root, path finding between nodes,
//! conjunctive attribute filters, graph merging, and entity-centric
//! lineage. Queries return fresh graphs or plain data; merging is the
//! one operation that mutates its target.

mod entity;
mod filter;
mod merge;
mod paths;
mod subgraph;

pub use entity::entity_lineage;
pub use filter::LineageQuery;
pub use merge::{merge_lineage, ConflictResolution, MergeStats};
pub use paths::find_paths;
pub use subgraph::{extract_subgraph, TraversalDirection};

pub(crate) use paths::simple_paths;
pub(crate) use subgraph::induced_subgraph;
