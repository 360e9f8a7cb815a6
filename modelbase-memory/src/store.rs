//! In-memory storage implementation for the model store.
//!
//! Documents are stored per collection in insertion order behind an
//! async-aware read-write lock, so unsorted paged reads are deterministic.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;

use modelbase_core::{
    backend::{FindSpec, InsertOneResult, StoreBackend, StoreBackendBuilder, UpdateResult},
    error::{ModelStoreError, ModelStoreResult},
};

use crate::{matcher, pipeline};

type CollectionVec = Vec<Document>;
type StoreMap = HashMap<String, CollectionVec>;

/// Thread-safe in-memory storage backend.
///
/// Queries scan every document in a collection (no indexing), which is
/// fine for development and tests. `InMemoryStore` is cloneable; clones
/// share the same underlying data.
///
/// # Example
///
/// ```ignore
/// use modelbase_memory::InMemoryStore;
/// use modelbase::ModelStore;
///
/// let store = ModelStore::new(InMemoryStore::new());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<u64> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(0);
        };

        let mut count = 0;
        for document in documents {
            if matcher::matches(&filter, document)? {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<Document> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Err(ModelStoreError::NotFound);
        };

        for document in documents {
            if matcher::matches(&filter, document)? {
                return Ok(document.clone());
            }
        }

        Err(ModelStoreError::NotFound)
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> ModelStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched = Vec::new();
        for document in documents {
            if matcher::matches(&filter, document)? {
                matched.push(document.clone());
            }
        }

        if let Some(sort) = &spec.sort {
            pipeline::sort_documents(&mut matched, sort);
        }

        let mut shaped: Vec<Document> = matched
            .into_iter()
            .skip(spec.skip.unwrap_or(0) as usize)
            .take(spec.limit.map_or(usize::MAX, |l| l.max(0) as usize))
            .collect();

        if let Some(projection) = &spec.projection {
            shaped = shaped
                .iter()
                .map(|document| pipeline::project_document(document, projection))
                .collect();
        }

        Ok(shaped)
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> ModelStoreResult<InsertOneResult> {
        let inserted_id = document
            .get("_id")
            .cloned()
            .unwrap_or(Bson::Null);

        let mut store = self.store.write().await;
        let documents = store
            .entry(collection.to_string())
            .or_default();

        if documents
            .iter()
            .any(|existing| existing.get("_id") == Some(&inserted_id))
        {
            return Err(ModelStoreError::DuplicateId(
                format!("{inserted_id}"),
                collection.to_string(),
            ));
        }

        documents.push(document);
        Ok(InsertOneResult { inserted_id })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> ModelStoreResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(UpdateResult { matched_count: 0, modified_count: 0 });
        };

        let mut target = None;
        for document in documents.iter_mut() {
            if matcher::matches(&filter, document)? {
                target = Some(document);
                break;
            }
        }

        let Some(document) = target else {
            return Ok(UpdateResult { matched_count: 0, modified_count: 0 });
        };

        for (op, argument) in &update {
            match op.as_str() {
                "$set" => {
                    let fields = argument
                        .as_document()
                        .ok_or_else(|| ModelStoreError::UnsupportedOperator(
                            "$set expects a document".to_string(),
                        ))?;

                    for (field, value) in fields {
                        document.insert(field.clone(), value.clone());
                    }
                }
                other => {
                    return Err(ModelStoreError::UnsupportedOperator(other.to_string()));
                }
            }
        }

        Ok(UpdateResult { matched_count: 1, modified_count: 1 })
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> ModelStoreResult<()> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Err(ModelStoreError::NotFound);
        };

        let before = documents.len();
        documents.retain(|document| document.get("_id") != Some(&Bson::ObjectId(id)));

        if documents.len() == before {
            return Err(ModelStoreError::NotFound);
        }

        Ok(())
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelStoreResult<Vec<Bson>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut values: Vec<Bson> = Vec::new();
        for document in documents {
            if !matcher::matches(&filter, document)? {
                continue;
            }

            // Array values contribute their elements, as the driver does.
            match matcher::lookup(document, field) {
                Some(Bson::Array(elements)) => {
                    for element in elements {
                        if !values.contains(element) {
                            values.push(element.clone());
                        }
                    }
                }
                Some(value) => {
                    if !values.contains(value) {
                        values.push(value.clone());
                    }
                }
                None => {}
            }
        }

        Ok(values)
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelStoreResult<Vec<Document>> {
        let snapshot = {
            let store = self.store.read().await;
            store
                .get(collection)
                .cloned()
                .unwrap_or_default()
        };

        pipeline::run_pipeline(snapshot, pipeline)
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    async fn build(self) -> ModelStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn insert_rejects_duplicate_ids() {
        let backend = InMemoryStore::new();
        let id = ObjectId::new();

        backend
            .insert_one("items", doc! { "_id": id, "n": 1 })
            .await
            .unwrap();
        let result = backend
            .insert_one("items", doc! { "_id": id, "n": 2 })
            .await;

        assert!(matches!(result, Err(ModelStoreError::DuplicateId(_, _))));
    }

    #[tokio::test]
    async fn find_many_preserves_insertion_order() {
        let backend = InMemoryStore::new();
        for n in 0..5 {
            backend
                .insert_one("items", doc! { "_id": ObjectId::new(), "n": n })
                .await
                .unwrap();
        }

        let found = backend
            .find_many("items", doc! {}, FindSpec {
                skip: Some(1),
                limit: Some(2),
                ..FindSpec::default()
            })
            .await
            .unwrap();

        let ns: Vec<_> = found
            .iter()
            .map(|d| d.get_i32("n").unwrap())
            .collect();
        assert_eq!(ns, vec![1, 2]);
    }

    #[tokio::test]
    async fn update_one_applies_set_fields() {
        let backend = InMemoryStore::new();
        let id = ObjectId::new();
        backend
            .insert_one("items", doc! { "_id": id, "n": 1 })
            .await
            .unwrap();

        let result = backend
            .update_one(
                "items",
                doc! { "_id": id },
                doc! { "$set": { "n": 9 } },
            )
            .await
            .unwrap();
        assert_eq!(result.matched_count, 1);

        let stored = backend
            .find_one("items", doc! { "_id": id })
            .await
            .unwrap();
        assert_eq!(stored.get_i32("n").unwrap(), 9);
    }

    #[tokio::test]
    async fn delete_missing_document_is_not_found() {
        let backend = InMemoryStore::new();
        let result = backend
            .delete_by_id("items", ObjectId::new())
            .await;

        assert!(matches!(result, Err(ModelStoreError::NotFound)));
    }

    #[tokio::test]
    async fn distinct_unwinds_arrays_and_dedupes() {
        let backend = InMemoryStore::new();
        backend
            .insert_one("items", doc! { "_id": ObjectId::new(), "tags": ["a", "b"] })
            .await
            .unwrap();
        backend
            .insert_one("items", doc! { "_id": ObjectId::new(), "tags": ["b", "c"] })
            .await
            .unwrap();

        let values = backend
            .distinct("items", "tags", doc! {})
            .await
            .unwrap();

        assert_eq!(values, vec![Bson::from("a"), Bson::from("b"), Bson::from("c")]);
    }
}
