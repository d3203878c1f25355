//! Pipeline record model
//!
//! Records are the raw provenance events a pipeline emits: a source was
//! read, a transformation ran, two datasets were merged, a verification
//! passed. The graph store turns them into lineage nodes and links.

mod types;
mod value;

pub use types::{Record, RecordDetail, RecordId, RecordType};
pub use value::{MetaValue, Metadata};
