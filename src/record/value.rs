//! Typed metadata values
//!
//! Metadata maps use `BTreeMap` so every serialization of the same map
//! produces the same byte sequence; canonical bytes feed both content
//! addressing and signing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A JSON-compatible metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<MetaValue>),
    Object(BTreeMap<String, MetaValue>),
    Null,
}

/// Metadata collection with deterministic key order.
pub type Metadata = BTreeMap<String, MetaValue>;

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetaValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            MetaValue::Float(f) => Some(*f),
            MetaValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value` (for export formats).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            MetaValue::String(s) => serde_json::Value::String(s.clone()),
            MetaValue::Int(n) => serde_json::Value::from(*n),
            MetaValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            MetaValue::Bool(b) => serde_json::Value::Bool(*b),
            MetaValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            MetaValue::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            MetaValue::Null => serde_json::Value::Null,
        }
    }

    /// Build from a `serde_json::Value` (import side of export formats).
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => MetaValue::String(s.clone()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetaValue::Int(i)
                } else {
                    MetaValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::Bool(b) => MetaValue::Bool(*b),
            serde_json::Value::Array(items) => {
                MetaValue::Array(items.iter().map(MetaValue::from_json).collect())
            }
            serde_json::Value::Object(map) => MetaValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), MetaValue::from_json(v)))
                    .collect(),
            ),
            serde_json::Value::Null => MetaValue::Null,
        }
    }

    /// Flatten to a display string; nested values render as compact JSON.
    /// Used by export formats that cannot carry nesting.
    pub fn to_flat_string(&self) -> String {
        match self {
            MetaValue::String(s) => s.clone(),
            MetaValue::Int(n) => n.to_string(),
            MetaValue::Float(f) => f.to_string(),
            MetaValue::Bool(b) => b.to_string(),
            MetaValue::Null => String::new(),
            other => serde_json::to_string(&other.to_json()).unwrap_or_default(),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Int(n)
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        MetaValue::Float(f)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_roundtrip_preserves_types() {
        let mut map: Metadata = BTreeMap::new();
        map.insert("name".into(), MetaValue::from("raw_events"));
        map.insert("rows".into(), MetaValue::from(42_i64));
        map.insert("ratio".into(), MetaValue::from(0.5));
        map.insert("valid".into(), MetaValue::from(true));

        let json = serde_json::to_string(&map).unwrap();
        let back: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }

    #[test]
    fn serialization_is_deterministic() {
        let mut a: Metadata = BTreeMap::new();
        a.insert("zeta".into(), MetaValue::from(1_i64));
        a.insert("alpha".into(), MetaValue::from(2_i64));

        let mut b: Metadata = BTreeMap::new();
        b.insert("alpha".into(), MetaValue::from(2_i64));
        b.insert("zeta".into(), MetaValue::from(1_i64));

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap(),
        );
    }

    #[test]
    fn flat_string_stringifies_nested_values() {
        let nested = MetaValue::Array(vec![MetaValue::from(1_i64), MetaValue::from(2_i64)]);
        assert_eq!(nested.to_flat_string(), "[1,2]");
        assert_eq!(MetaValue::from("plain").to_flat_string(), "plain");
    }
}
