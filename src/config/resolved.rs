//! Resolved collection model: config validated and flattened for runtime use.

use crate::config::CollectionKind;
use crate::service::AttributeRules;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct ResolvedCollection {
    /// Logical name, e.g. "land".
    pub name: String,
    /// Name in the store: deployment prefix + logical name.
    pub physical_name: String,
    pub kind: CollectionKind,
    pub path_segment: String,
    /// Attribute rules with patterns compiled.
    pub rules: AttributeRules,
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub collections: Vec<ResolvedCollection>,
    pub collection_by_path: HashMap<String, usize>,
}

impl ResolvedModel {
    pub fn collection_by_path(&self, path: &str) -> Option<&ResolvedCollection> {
        self.collection_by_path
            .get(path)
            .and_then(|i| self.collections.get(*i))
    }

    pub fn collection(&self, name: &str) -> Option<&ResolvedCollection> {
        self.collections.iter().find(|c| c.name == name)
    }
}
