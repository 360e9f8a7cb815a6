//! Main store interface: generic operations and the pagination engine.
//!
//! [`ModelStore`] is an explicit handle around a [`StoreBackend`],
//! constructed once and immutable afterwards. Every operation takes
//! `&self` and is safe to invoke from concurrent tasks; the store never
//! retains references to the models or destinations the caller supplies.
//!
//! Error policy: read-oriented conveniences ([`find_one`](ModelStore::find_one),
//! [`exists`](ModelStore::exists), the paged queries) swallow operational
//! failures into sentinel return values after logging them; write-oriented
//! operations and [`distinct`](ModelStore::distinct)/[`aggregate`](ModelStore::aggregate)
//! always surface the error to the caller.

use bson::{Document, de::deserialize_from_bson, doc};
use serde::de::DeserializeOwned;

use crate::{
    backend::{FindSpec, InsertOneResult, StoreBackend, UpdateResult},
    error::ModelStoreResult,
    model::{Model, ModelExt, object_id_from_hex},
    page::{self, PooledFindPageOptions},
    updater::Updater,
};

/// A store handle bound to a specific backend implementation.
///
/// # Example
///
/// ```ignore
/// let store = ModelStore::new(backend);
/// let mut user = User::default();
/// store.insert(&mut user).await?;
/// ```
#[derive(Debug)]
pub struct ModelStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> ModelStore<B> {
    /// Creates a new store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs a paged query and appends the matching page to `dest`.
    ///
    /// `filter` defaults to match-all; `current_page` is 1-indexed.
    /// Returns `(total_documents, total_pages)` computed from a count
    /// query. A page past the last document returns the totals with an
    /// empty result set and issues no fetch.
    ///
    /// Any failure in the count or fetch phase is logged and yields
    /// `(0, 0)`, deliberately discarding totals already computed, so
    /// callers see the same zeroed counts for "no data" and "fetch
    /// error". `dest` is only appended to when the whole page decodes.
    pub async fn find_page<M: Model>(
        &self,
        filter: Option<Document>,
        dest: &mut Vec<M>,
        page_size: u64,
        current_page: u64,
    ) -> (u64, u64) {
        self.find_page_inner(filter, dest, page_size, current_page, None, None)
            .await
    }

    /// Like [`find_page`](Self::find_page), with a projection and sort
    /// order taken from a pooled option object.
    ///
    /// The option object is consumed: it is cleared and released back to
    /// its pool when this call returns, whether or not the query succeeded.
    pub async fn find_page_with_options<M: Model>(
        &self,
        filter: Option<Document>,
        dest: &mut Vec<M>,
        page_size: u64,
        current_page: u64,
        options: PooledFindPageOptions,
    ) -> (u64, u64) {
        let projection = options.projection_document();
        let sort = options.sort_document();

        let counts = self
            .find_page_inner(filter, dest, page_size, current_page, projection, sort)
            .await;

        drop(options);
        counts
    }

    async fn find_page_inner<M: Model>(
        &self,
        filter: Option<Document>,
        dest: &mut Vec<M>,
        page_size: u64,
        current_page: u64,
        projection: Option<Document>,
        sort: Option<Document>,
    ) -> (u64, u64) {
        let collection = M::collection_name();
        let filter = filter.unwrap_or_default();

        let total = match self
            .backend
            .count_documents(collection, filter.clone())
            .await
        {
            Ok(total) => total,
            Err(err) if err.is_not_found() => return (0, 0),
            Err(err) => {
                tracing::error!(collection, %err, "count query failed");
                return (0, 0);
            }
        };

        if total == 0 {
            return (0, 0);
        }

        let total_pages = page::total_pages(total, page_size);

        // Past the last page: report the totals, skip the fetch entirely.
        let Some((offset, size)) = page::page_slice(total, page_size, current_page) else {
            return (total, total_pages);
        };

        let spec = FindSpec {
            projection,
            sort,
            skip: Some(offset),
            limit: Some(size),
        };

        let documents = match self
            .backend
            .find_many(collection, filter, spec)
            .await
        {
            Ok(documents) => documents,
            Err(err) => {
                tracing::error!(collection, %err, "paged query failed");
                return (0, 0);
            }
        };

        let mut decoded = Vec::with_capacity(documents.len());
        for document in documents {
            match M::from_document(document) {
                Ok(model) => decoded.push(model),
                Err(err) => {
                    tracing::error!(collection, %err, "failed to decode paged result");
                    return (0, 0);
                }
            }
        }

        dest.append(&mut decoded);
        (total, total_pages)
    }

    /// Finds the first document matching `filter` (default: match-all) and
    /// decodes it into `model`. Returns whether a match was found.
    ///
    /// Not-found is silent; any other failure is logged and reported as
    /// "not found".
    pub async fn find_one<M: Model>(&self, model: &mut M, filter: Option<Document>) -> bool {
        let collection = M::collection_name();

        match self
            .backend
            .find_one(collection, filter.unwrap_or_default())
            .await
        {
            Ok(document) => match M::from_document(document) {
                Ok(found) => {
                    *model = found;
                    true
                }
                Err(err) => {
                    tracing::error!(collection, %err, "failed to decode find_one result");
                    false
                }
            },
            Err(err) if err.is_not_found() => false,
            Err(err) => {
                tracing::error!(collection, %err, "find_one query failed");
                false
            }
        }
    }

    /// Finds the document with the given hex identifier and decodes it
    /// into `dest`. Returns `Ok(false)` when no document matched.
    ///
    /// An invalid hex string resolves to the nil identifier (which matches
    /// nothing) rather than aborting. Operational failures are logged and
    /// propagated.
    pub async fn find_by_id<M: Model>(&self, id: &str, dest: &mut M) -> ModelStoreResult<bool> {
        let collection = M::collection_name();
        let filter = doc! { "_id": object_id_from_hex(id) };

        match self.backend.find_one(collection, filter).await {
            Ok(document) => {
                *dest = M::from_document(document)?;
                Ok(true)
            }
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => {
                tracing::error!(collection, id, %err, "find_by_id query failed");
                Err(err)
            }
        }
    }

    /// Persists `model` as a new document.
    ///
    /// Invokes the insert lifecycle hook first: the identifier and
    /// `create_time` are assigned if unset and `last_modify_time` is
    /// refreshed.
    pub async fn insert<M: Model>(&self, model: &mut M) -> ModelStoreResult<InsertOneResult> {
        model.base_mut().before_insert();
        let document = model.to_document()?;

        self.backend
            .insert_one(M::collection_name(), document)
            .await
    }

    /// Replaces the fields of the stored document with `model` via a
    /// `$set` update.
    ///
    /// The filter defaults to matching by identifier; when a custom filter
    /// is supplied, the identifier match is still forced into it, so an
    /// update can never target a document other than `model`'s own. The
    /// update lifecycle hook refreshes `last_modify_time` before the write.
    pub async fn update<M: Model>(
        &self,
        model: &mut M,
        filter: Option<Document>,
    ) -> ModelStoreResult<UpdateResult> {
        let mut filter = filter.unwrap_or_default();
        filter.insert("_id", model.object_id());

        model.base_mut().before_update();
        let update = doc! { "$set": model.to_document()? };

        self.backend
            .update_one(M::collection_name(), filter, update)
            .await
    }

    /// Removes the document matching `model`'s identifier. No hook is
    /// invoked.
    pub async fn delete<M: Model>(&self, model: &M) -> ModelStoreResult<()> {
        self.backend
            .delete_by_id(M::collection_name(), model.object_id())
            .await
    }

    /// Reports whether any document matches `filter` (default: match-all)
    /// without decoding a result body.
    ///
    /// Operational failures are logged and reported as absent.
    pub async fn exists<M: Model>(&self, filter: Option<Document>) -> bool {
        let collection = M::collection_name();

        match self
            .backend
            .find_one(collection, filter.unwrap_or_default())
            .await
        {
            Ok(_) => true,
            Err(err) if err.is_not_found() => false,
            Err(err) => {
                tracing::error!(collection, %err, "exists query failed");
                false
            }
        }
    }

    /// Collects the distinct values of `field` among documents matching
    /// `filter` (default: match-all) into `dest`.
    pub async fn distinct<M: Model, T: DeserializeOwned>(
        &self,
        filter: Option<Document>,
        field: &str,
        dest: &mut Vec<T>,
    ) -> ModelStoreResult<()> {
        let values = self
            .backend
            .distinct(M::collection_name(), field, filter.unwrap_or_default())
            .await?;

        let mut decoded = Vec::with_capacity(values.len());
        for value in values {
            decoded.push(deserialize_from_bson(value)?);
        }

        dest.append(&mut decoded);
        Ok(())
    }

    /// Executes an aggregation pipeline against `model`'s collection and
    /// decodes all resulting documents into `dest`.
    pub async fn aggregate<M: Model, T: DeserializeOwned>(
        &self,
        pipeline: Vec<Document>,
        dest: &mut Vec<T>,
    ) -> ModelStoreResult<()> {
        let documents = self
            .backend
            .aggregate(M::collection_name(), pipeline)
            .await?;

        let mut decoded = Vec::with_capacity(documents.len());
        for document in documents {
            decoded.push(deserialize_from_bson(document.into())?);
        }

        dest.append(&mut decoded);
        Ok(())
    }

    /// Creates an [`Updater`] for `model`, enforcing the find-then-update
    /// protocol.
    pub fn updater<'a, M: Model>(&'a self, model: &'a mut M) -> Updater<'a, B, M> {
        Updater::new(self, model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelStoreError;
    use crate::model::BaseModel;
    use async_trait::async_trait;
    use bson::{Bson, oid::ObjectId};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Item {
        #[serde(flatten)]
        base: BaseModel,
        name: String,
    }

    impl Model for Item {
        fn collection_name() -> &'static str {
            "items"
        }

        fn base(&self) -> &BaseModel {
            &self.base
        }

        fn base_mut(&mut self) -> &mut BaseModel {
            &mut self.base
        }
    }

    /// Backend that counts fine but fails every fetch.
    #[derive(Debug)]
    struct BrokenFetch {
        total: u64,
    }

    #[async_trait]
    impl StoreBackend for BrokenFetch {
        async fn count_documents(&self, _: &str, _: Document) -> ModelStoreResult<u64> {
            Ok(self.total)
        }

        async fn find_one(&self, _: &str, _: Document) -> ModelStoreResult<Document> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }

        async fn find_many(
            &self,
            _: &str,
            _: Document,
            _: FindSpec,
        ) -> ModelStoreResult<Vec<Document>> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }

        async fn insert_one(&self, _: &str, _: Document) -> ModelStoreResult<InsertOneResult> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }

        async fn update_one(
            &self,
            _: &str,
            _: Document,
            _: Document,
        ) -> ModelStoreResult<UpdateResult> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }

        async fn delete_by_id(&self, _: &str, _: ObjectId) -> ModelStoreResult<()> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }

        async fn distinct(&self, _: &str, _: &str, _: Document) -> ModelStoreResult<Vec<Bson>> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }

        async fn aggregate(&self, _: &str, _: Vec<Document>) -> ModelStoreResult<Vec<Document>> {
            Err(ModelStoreError::Backend("wire dropped".into()))
        }
    }

    #[tokio::test]
    async fn fetch_failure_zeroes_both_counts() {
        // A successful count followed by a failed fetch still reports
        // (0, 0) and leaves the destination untouched.
        let store = ModelStore::new(BrokenFetch { total: 25 });
        let mut dest: Vec<Item> = Vec::new();

        let (total, pages) = store.find_page(None, &mut dest, 10, 1).await;

        assert_eq!((total, pages), (0, 0));
        assert!(dest.is_empty());
    }

    #[tokio::test]
    async fn zero_total_short_circuits_before_the_fetch() {
        // With a zero count the broken fetch is never reached.
        let store = ModelStore::new(BrokenFetch { total: 0 });
        let mut dest: Vec<Item> = Vec::new();

        let (total, pages) = store.find_page(None, &mut dest, 10, 1).await;

        assert_eq!((total, pages), (0, 0));
        assert!(dest.is_empty());
    }

    #[tokio::test]
    async fn page_past_the_end_reports_totals_without_fetching() {
        let store = ModelStore::new(BrokenFetch { total: 25 });
        let mut dest: Vec<Item> = Vec::new();

        let (total, pages) = store.find_page(None, &mut dest, 10, 4).await;

        assert_eq!((total, pages), (25, 3));
        assert!(dest.is_empty());
    }

    #[tokio::test]
    async fn read_conveniences_swallow_backend_failures() {
        let store = ModelStore::new(BrokenFetch { total: 1 });
        let mut item = Item { base: BaseModel::new(), name: String::new() };

        assert!(!store.find_one(&mut item, None).await);
        assert!(!store.exists::<Item>(None).await);
    }

    #[tokio::test]
    async fn write_operations_surface_backend_failures() {
        let store = ModelStore::new(BrokenFetch { total: 1 });
        let mut item = Item { base: BaseModel::new(), name: "x".into() };

        assert!(store.insert(&mut item).await.is_err());
        assert!(store.update(&mut item, None).await.is_err());
        assert!(store.delete(&item).await.is_err());
    }
}
