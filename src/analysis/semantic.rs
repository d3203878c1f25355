//! Semantic classification of lineage relationships
//!
//! Relationship names map into four fixed categories; anything outside
//! the tables is `unknown`. An explicit `semantic_context.category`
//! attribute on a link always takes precedence over the tables.
//!
//! A pluggable [`SemanticAnalyzer`] can additionally propose related
//! node pairs from node content. The graph itself carries no text
//! analysis; [`NoopSemanticAnalyzer`] is the default and proposes
//! nothing, [`TokenOverlapAnalyzer`] compares node descriptions by
//! token overlap.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::graph::{LineageGraph, LineageLink, NodeId};
use crate::record::{MetaValue, Metadata};

const CAUSAL: &[&str] = &["derived_from", "transforms", "generates"];
const STRUCTURAL: &[&str] = &["contains", "part_of", "references"];
const TEMPORAL: &[&str] = &["precedes", "follows", "concurrent_with"];
const SEMANTIC: &[&str] = &["similar_to", "semantically_related", "contradicts"];

/// Category of a lineage relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticCategory {
    Causal,
    Structural,
    Temporal,
    Semantic,
    #[default]
    Unknown,
}

impl SemanticCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticCategory::Causal => "causal",
            SemanticCategory::Structural => "structural",
            SemanticCategory::Temporal => "temporal",
            SemanticCategory::Semantic => "semantic",
            SemanticCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SemanticCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SemanticCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "causal" => Ok(SemanticCategory::Causal),
            "structural" => Ok(SemanticCategory::Structural),
            "temporal" => Ok(SemanticCategory::Temporal),
            "semantic" => Ok(SemanticCategory::Semantic),
            "unknown" => Ok(SemanticCategory::Unknown),
            other => Err(format!("unknown semantic category: {other}")),
        }
    }
}

/// Classify a relationship name through the fixed tables.
pub fn classify_name(relationship: &str) -> SemanticCategory {
    if CAUSAL.contains(&relationship) {
        SemanticCategory::Causal
    } else if STRUCTURAL.contains(&relationship) {
        SemanticCategory::Structural
    } else if TEMPORAL.contains(&relationship) {
        SemanticCategory::Temporal
    } else if SEMANTIC.contains(&relationship) {
        SemanticCategory::Semantic
    } else {
        SemanticCategory::Unknown
    }
}

/// Classify one link. An explicit `semantic_context.category` attribute
/// wins; an unrecognized explicit category classifies as `unknown`
/// rather than falling back to the tables.
pub fn classify_relationship(link: &LineageLink) -> SemanticCategory {
    if let Some(category) = explicit_category(link) {
        return category;
    }
    classify_name(&link.relationship)
}

fn explicit_category(link: &LineageLink) -> Option<SemanticCategory> {
    let MetaValue::Object(context) = link.metadata.get("semantic_context")? else {
        return None;
    };
    let label = context.get("category")?.as_str()?;
    Some(label.parse().unwrap_or(SemanticCategory::Unknown))
}

/// A classified link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedEdge {
    pub source: NodeId,
    pub target: NodeId,
    pub relationship: String,
    pub category: SemanticCategory,
}

/// Aggregate result of a semantic pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticReport {
    /// Number of classified links
    pub total: usize,
    /// Count per category label
    pub by_category: BTreeMap<String, usize>,
    /// Count per relationship name
    pub by_relationship: BTreeMap<String, usize>,
    /// Every classified link, sorted by (source, target, relationship)
    pub edges: Vec<ClassifiedEdge>,
}

impl SemanticReport {
    /// Category of a specific link, when it was classified.
    pub fn category_of(&self, source: &NodeId, target: &NodeId, relationship: &str) -> Option<SemanticCategory> {
        self.edges
            .iter()
            .find(|e| &e.source == source && &e.target == target && e.relationship == relationship)
            .map(|e| e.category)
    }

    /// Write the aggregate counts into a metadata map. Overwrites the
    /// same keys on re-application.
    pub fn apply_to(&self, metadata: &mut Metadata) {
        metadata.insert(
            "semantic_relationship_count".to_string(),
            MetaValue::Int(self.total as i64),
        );
        let histogram: BTreeMap<String, MetaValue> = self
            .by_category
            .iter()
            .map(|(label, count)| (label.clone(), MetaValue::Int(*count as i64)))
            .collect();
        metadata.insert(
            "semantic_categories".to_string(),
            MetaValue::Object(histogram),
        );
    }
}

/// Classify every link in the graph.
pub fn analyze_semantics(graph: &LineageGraph) -> SemanticReport {
    let mut edges: Vec<ClassifiedEdge> = graph
        .links()
        .map(|link| ClassifiedEdge {
            source: link.source.clone(),
            target: link.target.clone(),
            relationship: link.relationship.clone(),
            category: classify_relationship(link),
        })
        .collect();
    edges.sort_by(|a, b| {
        (&a.source, &a.target, &a.relationship).cmp(&(&b.source, &b.target, &b.relationship))
    });

    let mut by_category = BTreeMap::new();
    let mut by_relationship = BTreeMap::new();
    for edge in &edges {
        *by_category
            .entry(edge.category.as_str().to_string())
            .or_insert(0) += 1;
        *by_relationship.entry(edge.relationship.clone()).or_insert(0) += 1;
    }
    SemanticReport {
        total: edges.len(),
        by_category,
        by_relationship,
        edges,
    }
}

/// A pair of nodes an analyzer considers related
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedPair {
    pub left: NodeId,
    pub right: NodeId,
    pub score: f64,
}

/// Proposes related node pairs from node content.
///
/// Chosen once when a tracker is constructed, never per call. Absence
/// of a real implementation degrades to [`NoopSemanticAnalyzer`].
pub trait SemanticAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Propose related pairs, considering at most `max_candidates`
    /// nodes. Implementations must return the same pairs for the same
    /// graph.
    fn related_pairs(&self, graph: &LineageGraph, max_candidates: usize) -> Vec<RelatedPair>;
}

/// Analyzer that proposes nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSemanticAnalyzer;

impl SemanticAnalyzer for NoopSemanticAnalyzer {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn related_pairs(&self, _graph: &LineageGraph, _max_candidates: usize) -> Vec<RelatedPair> {
        Vec::new()
    }
}

/// Token-overlap similarity over node `description` attributes.
///
/// Candidates are the nodes carrying a description, taken in id order
/// up to the cap; every pair above the threshold is reported. The
/// comparison is quadratic in the candidate count, which is why the
/// cap exists.
#[derive(Debug, Clone)]
pub struct TokenOverlapAnalyzer {
    threshold: f64,
}

impl TokenOverlapAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }
}

impl SemanticAnalyzer for TokenOverlapAnalyzer {
    fn name(&self) -> &'static str {
        "token_overlap"
    }

    fn related_pairs(&self, graph: &LineageGraph, max_candidates: usize) -> Vec<RelatedPair> {
        let mut candidates: Vec<(&NodeId, HashSet<String>)> = graph
            .nodes()
            .filter_map(|node| {
                let text = node.metadata.get("description")?.as_str()?;
                let tokens = tokenize(text);
                if tokens.is_empty() {
                    None
                } else {
                    Some((&node.id, tokens))
                }
            })
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(b.0));
        candidates.truncate(max_candidates);

        let mut pairs = Vec::new();
        for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                let score = jaccard(&candidates[i].1, &candidates[j].1);
                if score >= self.threshold {
                    pairs.push(RelatedPair {
                        left: candidates[i].0.clone(),
                        right: candidates[j].0.clone(),
                        score,
                    });
                }
            }
        }
        pairs
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2)
        .map(|token| token.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}
