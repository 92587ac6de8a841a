//! Collection-scoped accessor over a [`DocumentStore`].

use crate::config::{CollectionKind, ResolvedCollection};
use crate::document::{Document, DocumentBody};
use crate::error::StoreError;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct Collection {
    store: Arc<dyn DocumentStore>,
    name: String,
    kind: CollectionKind,
}

impl Collection {
    pub fn new(store: Arc<dyn DocumentStore>, name: impl Into<String>, kind: CollectionKind) -> Self {
        Collection {
            store,
            name: name.into(),
            kind,
        }
    }

    pub fn for_resolved(store: Arc<dyn DocumentStore>, resolved: &ResolvedCollection) -> Self {
        Self::new(store, resolved.physical_name.clone(), resolved.kind)
    }

    /// Physical collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub async fn list_all(&self) -> Result<Vec<Document>, StoreError> {
        self.store.list_all(&self.name).await
    }

    pub async fn insert(&self, body: DocumentBody) -> Result<Document, StoreError> {
        self.store.insert(&self.name, body).await
    }

    pub async fn get(&self, key: &str) -> Result<Document, StoreError> {
        self.store.get(&self.name, key).await
    }

    pub async fn replace(
        &self,
        key: &str,
        body: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<Document, StoreError> {
        self.store.replace(&self.name, key, body, expected_rev).await
    }

    pub async fn merge(
        &self,
        key: &str,
        patch: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<(), StoreError> {
        self.store.merge(&self.name, key, patch, expected_rev).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.store.remove(&self.name, key).await
    }
}
