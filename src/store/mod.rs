//! Document store seam: the engine trait and the collection-scoped adapter used by route groups.

mod collection;
mod memory;
mod postgres;

pub use collection::Collection;
pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::config::CollectionKind;
use crate::document::{Document, DocumentBody};
use crate::error::StoreError;
use async_trait::async_trait;

/// A document database engine. Every mutating call is atomic for one record.
///
/// `expected_rev`, when given, must equal the stored `_rev` or the write fails with
/// [`StoreError::Conflict`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::DuplicateCollection`] if it already exists.
    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), StoreError>;

    /// Fails with [`StoreError::CollectionNotFound`] if it does not exist.
    async fn drop_collection(&self, name: &str) -> Result<(), StoreError>;

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    async fn insert(&self, collection: &str, body: DocumentBody) -> Result<Document, StoreError>;

    async fn get(&self, collection: &str, key: &str) -> Result<Document, StoreError>;

    async fn replace(
        &self,
        collection: &str,
        key: &str,
        body: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<Document, StoreError>;

    /// Shallow merge of `patch` attributes onto the stored record.
    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn remove(&self, collection: &str, key: &str) -> Result<(), StoreError>;
}
