//! Shared application state: the store engine and the resolved collection model.

use crate::config::{ResolvedCollection, ResolvedModel};
use crate::store::{Collection, DocumentStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub model: Arc<ResolvedModel>,
}

/// State for one mounted route group.
#[derive(Clone)]
pub struct CollectionState {
    pub collection: Collection,
    pub spec: Arc<ResolvedCollection>,
}

impl CollectionState {
    pub fn new(store: Arc<dyn DocumentStore>, spec: &ResolvedCollection) -> Self {
        CollectionState {
            collection: Collection::for_resolved(store, spec),
            spec: Arc::new(spec.clone()),
        }
    }
}
