//! Raw config types matching `collections.json`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a collection holds plain documents or directed edges (`_from` / `_to`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Document,
    Edge,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Document => "document",
            CollectionKind::Edge => "edge",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub kind: CollectionKind,
    /// Mount path segment; defaults to `name`.
    #[serde(default)]
    pub path_segment: Option<String>,
    /// Attribute rules. Empty means any attributes are accepted.
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
}

impl CollectionConfig {
    pub fn new(name: &str, kind: CollectionKind) -> Self {
        CollectionConfig {
            name: name.to_string(),
            kind,
            path_segment: None,
            validation: HashMap::new(),
        }
    }
}

/// All collection configs in one struct for in-memory loading.
#[derive(Clone, Debug, Default)]
pub struct FullConfig {
    pub collections: Vec<CollectionConfig>,
}

impl FullConfig {
    /// The five stock collections: three document collections and two edge collections.
    pub fn builtin() -> Self {
        FullConfig {
            collections: vec![
                CollectionConfig::new("resources", CollectionKind::Document),
                CollectionConfig::new("services", CollectionKind::Document),
                CollectionConfig::new("land", CollectionKind::Document),
                CollectionConfig::new("family", CollectionKind::Edge),
                CollectionConfig::new("ministry", CollectionKind::Edge),
            ],
        }
    }
}
