use std::{future::Future, time::Duration};

use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection,
    options::{ClientOptions, FindOptions},
};
use modelbase_core::{
    backend::{FindSpec, InsertOneResult, StoreBackend, StoreBackendBuilder, UpdateResult},
    error::{ModelStoreError, ModelStoreResult},
};

const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct MongoStore {
    client: Client,
    database: String,
    op_timeout: Duration,
}

impl MongoStore {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    /// Runs a driver call under the configured operation timeout.
    async fn bounded<T, F>(&self, future: F) -> ModelStoreResult<T>
    where
        F: Future<Output = ModelStoreResult<T>> + Send,
    {
        tokio::time::timeout(self.op_timeout, future)
            .await
            .map_err(|_| ModelStoreError::Timeout(self.op_timeout.as_millis() as u64))?
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
    }
}

#[async_trait]
impl StoreBackend for MongoStore {
    async fn count_documents(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<u64> {
        self.bounded(async {
            self.get_collection(collection)
                .count_documents(filter)
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))
        })
        .await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> ModelStoreResult<Document> {
        self.bounded(async {
            self.get_collection(collection)
                .find_one(filter)
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))?
                .ok_or(ModelStoreError::NotFound)
        })
        .await
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: Document,
        spec: FindSpec,
    ) -> ModelStoreResult<Vec<Document>> {
        let mut options = FindOptions::default();
        options.projection = spec.projection;
        options.sort = spec.sort;
        options.skip = spec.skip;
        options.limit = spec.limit;

        self.bounded(async {
            self.get_collection(collection)
                .find(filter)
                .with_options(options)
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))
        })
        .await
    }

    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
    ) -> ModelStoreResult<InsertOneResult> {
        self.bounded(async {
            self.get_collection(collection)
                .insert_one(document)
                .await
                .map(|result| InsertOneResult {
                    inserted_id: result.inserted_id,
                })
                .map_err(|e| ModelStoreError::Backend(e.to_string()))
        })
        .await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> ModelStoreResult<UpdateResult> {
        self.bounded(async {
            self.get_collection(collection)
                .update_one(filter, update)
                .await
                .map(|result| UpdateResult {
                    matched_count: result.matched_count,
                    modified_count: result.modified_count,
                })
                .map_err(|e| ModelStoreError::Backend(e.to_string()))
        })
        .await
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> ModelStoreResult<()> {
        self.bounded(async {
            let result = self
                .get_collection(collection)
                .delete_one(doc! { "_id": id })
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))?;

            if result.deleted_count == 0 {
                return Err(ModelStoreError::NotFound);
            }

            Ok(())
        })
        .await
    }

    async fn distinct(
        &self,
        collection: &str,
        field: &str,
        filter: Document,
    ) -> ModelStoreResult<Vec<Bson>> {
        self.bounded(async {
            self.get_collection(collection)
                .distinct(field, filter)
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))
        })
        .await
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: Vec<Document>,
    ) -> ModelStoreResult<Vec<Document>> {
        self.bounded(async {
            self.get_collection(collection)
                .aggregate(pipeline)
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| ModelStoreError::Backend(e.to_string()))
        })
        .await
    }
}

pub struct MongoStoreBuilder {
    dsn: String,
    database: String,
    op_timeout: Duration,
}

impl MongoStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
            op_timeout: DEFAULT_OP_TIMEOUT,
        }
    }

    /// Overrides the per-operation timeout.
    pub fn op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoStoreBuilder {
    type Backend = MongoStore;

    async fn build(self) -> ModelStoreResult<Self::Backend> {
        let client = Client::with_options(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(|e| ModelStoreError::Initialization(e.to_string()))?,
        )
        .map_err(|e| ModelStoreError::Initialization(e.to_string()))?;

        Ok(MongoStore {
            client,
            database: self.database,
            op_timeout: self.op_timeout,
        })
    }
}
