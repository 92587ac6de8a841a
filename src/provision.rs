//! Collection provisioning: create the configured collections, or drop them all.

use crate::config::{CollectionKind, ResolvedModel};
use crate::error::StoreError;
use crate::store::DocumentStore;

/// Create every configured collection that does not exist yet: document collections
/// first, then edge collections. Existing collections are left untouched.
/// Returns the physical names that were created.
pub async fn setup(store: &dyn DocumentStore, model: &ResolvedModel) -> Result<Vec<String>, StoreError> {
    let mut created = Vec::new();
    for kind in [CollectionKind::Document, CollectionKind::Edge] {
        for c in model.collections.iter().filter(|c| c.kind == kind) {
            if store.collection_exists(&c.physical_name).await? {
                tracing::debug!(collection = %c.physical_name, "collection exists");
                continue;
            }
            store.create_collection(&c.physical_name, kind).await?;
            tracing::info!(collection = %c.physical_name, kind = kind.as_str(), "created collection");
            created.push(c.physical_name.clone());
        }
    }
    Ok(created)
}

/// Drop every configured collection. There is no existence check: the first
/// missing collection fails the teardown with [`StoreError::CollectionNotFound`].
pub async fn teardown(store: &dyn DocumentStore, model: &ResolvedModel) -> Result<(), StoreError> {
    for c in &model.collections {
        store.drop_collection(&c.physical_name).await?;
        tracing::info!(collection = %c.physical_name, "dropped collection");
    }
    Ok(())
}
