//! Export and import formatters
//!
//! Generic JSON is the lossless interchange shape; node-link JSON and
//! GraphML are best-effort exports for external graph tooling.

mod graphml;
mod json;
mod node_link;

pub use graphml::to_graphml;
pub use json::{from_json, to_json};
pub use node_link::{from_node_link, to_node_link};
