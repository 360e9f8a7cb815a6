//! Storage backend abstraction for the model store.
//!
//! This module defines the capability surface the store consumes from a
//! document database driver. Implementations provide counting, filtered
//! retrieval with projection/sort/skip/limit, single-document writes,
//! distinct values and aggregation pipelines.
//!
//! Filters, projections, sorts and pipeline stages are raw
//! [`bson::Document`] values, passed through to the driver untranslated;
//! this layer is a convenience wrapper, not a query planner.

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use std::fmt::Debug;

use crate::error::ModelStoreResult;

/// Projection, sort and slicing applied to a [`StoreBackend::find_many`] call.
///
/// All fields default to "no constraint".
#[derive(Debug, Clone, Default)]
pub struct FindSpec {
    /// Field selection: field name mapped to include (1) or exclude (0).
    pub projection: Option<Document>,
    /// Sort specification: field name mapped to 1 (ascending) or -1 (descending).
    pub sort: Option<Document>,
    /// Number of matching documents to skip before returning results.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<i64>,
}

/// Acknowledgment returned by [`StoreBackend::insert_one`].
#[derive(Debug, Clone)]
pub struct InsertOneResult {
    /// The identifier of the inserted document.
    pub inserted_id: Bson,
}

/// Acknowledgment returned by [`StoreBackend::update_one`].
#[derive(Debug, Clone)]
pub struct UpdateResult {
    /// Number of documents that matched the filter.
    pub matched_count: u64,
    /// Number of documents actually modified.
    pub modified_count: u64,
}

/// Abstract interface for document database drivers.
///
/// All operations target a named collection and are async. Implementations
/// must be thread-safe (`Send + Sync`) and support concurrent calls; no
/// operation may block indefinitely: drivers with network I/O are expected
/// to bound every call with a timeout.
///
/// # Not-found sentinel
///
/// [`find_one`](Self::find_one) reports "zero documents matched" with the
/// distinguished [`ModelStoreError::NotFound`](crate::error::ModelStoreError::NotFound)
/// error so callers can separate it from operational failures.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Counts the documents in `collection` matching `filter`.
    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<u64>;

    /// Returns the first document in `collection` matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the not-found sentinel when nothing matches, or another
    /// [`ModelStoreError`](crate::error::ModelStoreError) on failure.
    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<Document>;

    /// Returns all documents in `collection` matching `filter`, shaped and
    /// sliced by `spec`.
    ///
    /// An empty match is `Ok(vec![])`, not an error.
    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> ModelStoreResult<Vec<Document>>;

    /// Inserts a single document into `collection`.
    ///
    /// The document is expected to carry its `_id`; inserting a duplicate
    /// identifier is an error.
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> ModelStoreResult<InsertOneResult>;

    /// Applies `update` to the first document in `collection` matching `filter`.
    ///
    /// `update` is a driver-native update document (e.g. `{"$set": {...}}`).
    /// Matching nothing is not an error; the returned counts report it.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> ModelStoreResult<UpdateResult>;

    /// Removes the document in `collection` with the given identifier.
    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> ModelStoreResult<()>;

    /// Returns the distinct values of `field` among documents in
    /// `collection` matching `filter`.
    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelStoreResult<Vec<Bson>>;

    /// Executes an aggregation pipeline against `collection` and returns
    /// all resulting documents.
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelStoreResult<Vec<Document>>;
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend,
{
    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<u64> {
        (*self)
            .count_documents(collection, filter)
            .await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<Document> {
        (*self).find_one(collection, filter).await
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> ModelStoreResult<Vec<Document>> {
        (*self)
            .find_many(collection, filter, spec)
            .await
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> ModelStoreResult<InsertOneResult> {
        (*self)
            .insert_one(collection, document)
            .await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> ModelStoreResult<UpdateResult> {
        (*self)
            .update_one(collection, filter, update)
            .await
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> ModelStoreResult<()> {
        (*self).delete_by_id(collection, id).await
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelStoreResult<Vec<Bson>> {
        (*self)
            .distinct(collection, field, filter)
            .await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelStoreResult<Vec<Document>> {
        (*self)
            .aggregate(collection, pipeline)
            .await
    }
}

/// Factory trait for constructing backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> ModelStoreResult<Self::Backend>;
}
