//! In-process document store. Used by tests and `--memory` runs.

use crate::config::CollectionKind;
use crate::document::{generate_key, generate_rev, Document, DocumentBody};
use crate::error::StoreError;
use crate::store::DocumentStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

struct MemCollection {
    kind: CollectionKind,
    docs: HashMap<String, Document>,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, MemCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&MemCollection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        let c = guard
            .get(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        f(c)
    }

    fn write<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut MemCollection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        let c = guard
            .get_mut(collection)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.to_string()))?;
        f(c)
    }
}

fn not_found(collection: &str, key: &str) -> StoreError {
    StoreError::NotFound {
        collection: collection.to_string(),
        key: key.to_string(),
    }
}

/// Locate `key` and enforce the optimistic revision check.
fn existing<'a>(
    c: &'a mut MemCollection,
    collection: &str,
    key: &str,
    expected_rev: Option<&str>,
) -> Result<&'a mut Document, StoreError> {
    let doc = c.docs.get_mut(key).ok_or_else(|| not_found(collection, key))?;
    if let Some(rev) = expected_rev {
        if doc.rev != rev {
            return Err(StoreError::Conflict {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(doc)
}

fn check_edge(kind: CollectionKind, collection: &str, from: &Option<String>, to: &Option<String>) -> Result<(), StoreError> {
    if kind == CollectionKind::Edge && (from.is_none() || to.is_none()) {
        return Err(StoreError::InvalidEdge(collection.to_string()));
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let guard = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.contains_key(name))
    }

    async fn create_collection(&self, name: &str, kind: CollectionKind) -> Result<(), StoreError> {
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        if guard.contains_key(name) {
            return Err(StoreError::DuplicateCollection(name.to_string()));
        }
        guard.insert(
            name.to_string(),
            MemCollection {
                kind,
                docs: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.write().unwrap_or_else(PoisonError::into_inner);
        guard
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    async fn list_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.read(collection, |c| Ok(c.docs.values().cloned().collect()))
    }

    async fn insert(&self, collection: &str, body: DocumentBody) -> Result<Document, StoreError> {
        self.write(collection, |c| {
            check_edge(c.kind, collection, &body.from, &body.to)?;
            let key = body.key.clone().unwrap_or_else(generate_key);
            if c.docs.contains_key(&key) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    key,
                });
            }
            let doc = body.into_document(collection, key.clone(), generate_rev());
            c.docs.insert(key, doc.clone());
            Ok(doc)
        })
    }

    async fn get(&self, collection: &str, key: &str) -> Result<Document, StoreError> {
        self.read(collection, |c| {
            c.docs.get(key).cloned().ok_or_else(|| not_found(collection, key))
        })
    }

    async fn replace(
        &self,
        collection: &str,
        key: &str,
        body: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<Document, StoreError> {
        self.write(collection, |c| {
            let kind = c.kind;
            let doc = existing(c, collection, key, expected_rev)?;
            check_edge(kind, collection, &body.from, &body.to)?;
            *doc = body.into_document(collection, key.to_string(), generate_rev());
            Ok(doc.clone())
        })
    }

    async fn merge(
        &self,
        collection: &str,
        key: &str,
        patch: DocumentBody,
        expected_rev: Option<&str>,
    ) -> Result<(), StoreError> {
        self.write(collection, |c| {
            let doc = existing(c, collection, key, expected_rev)?;
            if patch.from.is_some() {
                doc.from = patch.from;
            }
            if patch.to.is_some() {
                doc.to = patch.to;
            }
            doc.attributes.extend(patch.attributes);
            doc.rev = generate_rev();
            Ok(())
        })
    }

    async fn remove(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.write(collection, |c| {
            c.docs
                .remove(key)
                .map(|_| ())
                .ok_or_else(|| not_found(collection, key))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn attrs(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    async fn store_with(kind: CollectionKind) -> MemoryStore {
        let store = MemoryStore::new();
        store.create_collection("c", kind).await.unwrap();
        store
    }

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let store = store_with(CollectionKind::Document).await;
        let created = store
            .insert("c", DocumentBody::new(attrs(json!({"a": 1, "b": "x"}))))
            .await
            .unwrap();
        assert!(!created.key.is_empty());
        assert_eq!(created.id, format!("c/{}", created.key));
        assert_eq!(store.get("c", &created.key).await.unwrap(), created);
    }

    #[tokio::test]
    async fn duplicate_key_keeps_first() {
        let store = store_with(CollectionKind::Document).await;
        let first = store
            .insert("c", DocumentBody::new(attrs(json!({"v": 1}))).with_key("k"))
            .await
            .unwrap();
        let err = store
            .insert("c", DocumentBody::new(attrs(json!({"v": 2}))).with_key("k"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(store.get("c", "k").await.unwrap(), first);
    }

    #[tokio::test]
    async fn merge_only_touches_patched_attributes() {
        let store = store_with(CollectionKind::Document).await;
        let created = store
            .insert("c", DocumentBody::new(attrs(json!({"a": 1, "b": 2}))))
            .await
            .unwrap();
        store
            .merge("c", &created.key, DocumentBody::new(attrs(json!({"b": 3, "c": 4}))), None)
            .await
            .unwrap();
        let merged = store.get("c", &created.key).await.unwrap();
        assert_eq!(merged.attributes, attrs(json!({"a": 1, "b": 3, "c": 4})));
        assert_ne!(merged.rev, created.rev);
    }

    #[tokio::test]
    async fn replace_drops_leftover_attributes() {
        let store = store_with(CollectionKind::Document).await;
        let created = store
            .insert("c", DocumentBody::new(attrs(json!({"a": 1, "b": 2}))))
            .await
            .unwrap();
        let replaced = store
            .replace("c", &created.key, DocumentBody::new(attrs(json!({"z": true}))), None)
            .await
            .unwrap();
        assert_eq!(replaced.key, created.key);
        assert_eq!(store.get("c", &created.key).await.unwrap().attributes, attrs(json!({"z": true})));
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let store = store_with(CollectionKind::Document).await;
        let created = store.insert("c", DocumentBody::default()).await.unwrap();
        store
            .merge("c", &created.key, DocumentBody::new(attrs(json!({"a": 1}))), Some(&created.rev))
            .await
            .unwrap();
        let err = store
            .replace("c", &created.key, DocumentBody::default(), Some(&created.rev))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        let err = store
            .merge("c", &created.key, DocumentBody::default(), Some(&created.rev))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn missing_keys_and_collections() {
        let store = store_with(CollectionKind::Document).await;
        let created = store.insert("c", DocumentBody::default()).await.unwrap();
        store.remove("c", &created.key).await.unwrap();
        assert!(matches!(store.get("c", &created.key).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(store.remove("c", &created.key).await, Err(StoreError::NotFound { .. })));
        assert!(matches!(
            store.replace("c", "nope", DocumentBody::default(), None).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(store.list_all("other").await, Err(StoreError::CollectionNotFound(_))));
    }

    #[tokio::test]
    async fn edges_require_endpoints() {
        let store = store_with(CollectionKind::Edge).await;
        assert!(matches!(
            store.insert("c", DocumentBody::default()).await,
            Err(StoreError::InvalidEdge(_))
        ));
        let edge = store
            .insert("c", DocumentBody::default().with_edge("land/A", "land/B"))
            .await
            .unwrap();
        store
            .merge("c", &edge.key, DocumentBody::new(attrs(json!({"w": 1}))), None)
            .await
            .unwrap();
        let fetched = store.get("c", &edge.key).await.unwrap();
        assert_eq!(fetched.from.as_deref(), Some("land/A"));
        assert_eq!(fetched.to.as_deref(), Some("land/B"));
    }

    #[tokio::test]
    async fn collection_lifecycle() {
        let store = MemoryStore::new();
        assert!(!store.collection_exists("c").await.unwrap());
        store.create_collection("c", CollectionKind::Edge).await.unwrap();
        assert!(matches!(
            store.create_collection("c", CollectionKind::Edge).await,
            Err(StoreError::DuplicateCollection(_))
        ));
        store.drop_collection("c").await.unwrap();
        assert!(matches!(store.drop_collection("c").await, Err(StoreError::CollectionNotFound(_))));
    }
}
