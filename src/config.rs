//! Tracker configuration
//!
//! Every recognized option is an explicit field; deserialization rejects
//! unknown keys instead of silently inventing attributes.

use serde::{Deserialize, Serialize};

/// Algorithm used to partition the document co-occurrence graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterAlgorithm {
    /// Greedy modularity maximization (Louvain-style).
    #[default]
    Louvain,
    /// Plain connected components, used when modularity-based
    /// partitioning is disabled or degenerate.
    ConnectedComponents,
}

/// Configuration for a [`LineageTracker`](crate::LineageTracker).
///
/// All options are enumerated here with their defaults; there is no
/// pass-through metadata bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TrackerConfig {
    /// Warn (never block) when a link's target node predates its source
    /// by more than the tolerance.
    pub enable_temporal_consistency: bool,
    /// Tolerance for the temporal-consistency check, in milliseconds.
    pub temporal_tolerance_ms: i64,
    /// Discover semantically-related nodes by pairwise description
    /// comparison in entity-lineage queries.
    pub enable_semantic_detection: bool,
    /// Cap on candidate nodes considered for pairwise semantic
    /// comparison (bounds the quadratic cost).
    pub max_semantic_candidates: usize,
    /// Minimum similarity for a detector pair to count as related.
    pub semantic_similarity_threshold: f64,
    /// Sign records on store with the configured signer.
    pub enable_signing: bool,
    /// Key material for the keyed signer. Signing degrades to a no-op
    /// with a warning when enabled without a key.
    pub signing_key: Option<String>,
    /// Split stored graphs that exceed `partition_size_limit` nodes.
    pub enable_partitioning: bool,
    /// Node count above which `store_graph` partitions the graph.
    pub partition_size_limit: usize,
    /// Document clustering algorithm.
    pub cluster_algorithm: ClusterAlgorithm,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enable_temporal_consistency: true,
            temporal_tolerance_ms: 100,
            enable_semantic_detection: true,
            max_semantic_candidates: 100,
            semantic_similarity_threshold: 0.25,
            enable_signing: false,
            signing_key: None,
            enable_partitioning: true,
            partition_size_limit: 1000,
            cluster_algorithm: ClusterAlgorithm::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON, rejecting unknown keys.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = TrackerConfig::default();
        assert!(config.enable_temporal_consistency);
        assert_eq!(config.temporal_tolerance_ms, 100);
        assert_eq!(config.partition_size_limit, 1000);
        assert_eq!(config.cluster_algorithm, ClusterAlgorithm::Louvain);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = TrackerConfig::from_json(r#"{"enable_signing": true, "mystery_knob": 3}"#);
        assert!(result.is_err(), "unknown config keys must be rejected");
    }

    #[test]
    fn partial_configs_fill_defaults() {
        let config = TrackerConfig::from_json(r#"{"partition_size_limit": 50}"#).unwrap();
        assert_eq!(config.partition_size_limit, 50);
        assert!(config.enable_temporal_consistency);
    }
}
