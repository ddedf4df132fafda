//! Resource descriptors.
//!
//! # Responsibilities
//! - Represent the requesting client's identity as key/value attributes
//! - Render attributes into the `"key:value"` labels config blocks require

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Attribute value as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(value) => write!(f, "{}", value),
            AttributeValue::Int(value) => write!(f, "{}", value),
            AttributeValue::Double(value) => write!(f, "{}", value),
            AttributeValue::String(value) => f.write_str(value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Double(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: AttributeValue,
}

/// The requesting client's identity. Read-only input to matching.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.push(KeyValue {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Normalized `"key:value"` labels in attribute order.
    pub fn labels(&self) -> Vec<String> {
        self.attributes
            .iter()
            .map(|kv| normalize_label(&format!("{}:{}", kv.key, kv.value)))
            .collect()
    }

    pub fn label_set(&self) -> HashSet<String> {
        self.labels().into_iter().collect()
    }
}

/// Strip whitespace and double quotes from a `"key:value"` label.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"')
        .collect()
}
