//! Error types and result types for model store operations.
//!
//! This module provides error handling for all model store operations.
//! Use [`ModelStoreResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a model store.
///
/// The [`NotFound`](ModelStoreError::NotFound) variant is a sentinel meaning zero
/// documents matched a query. It is never logged and is converted to a boolean or
/// empty result by the read-oriented convenience operations.
#[derive(Error, Debug)]
pub enum ModelStoreError {
    /// No document matched the filter. Sentinel, not an operational failure.
    #[error("no document matched the filter")]
    NotFound,
    /// Serialization/deserialization error when converting models to or from BSON/JSON.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("initialization error: {0}")]
    Initialization(String),
    /// A document with the given id already exists in the collection.
    /// The first argument is the document id, the second is the collection name.
    #[error("document {0} already exists in collection {1}")]
    DuplicateId(String, String),
    /// An update was attempted through an [`Updater`](crate::updater::Updater)
    /// whose `find()` has not succeeded.
    #[error("document does not exist")]
    DocumentNotExist,
    /// The backend does not support the requested filter or update operator.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// An operation exceeded its bounded duration (milliseconds).
    #[error("operation timed out after {0}ms")]
    Timeout(u64),
    /// An error occurred in the underlying storage backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for model store operations.
pub type ModelStoreResult<T> = Result<T, ModelStoreError>;

impl ModelStoreError {
    /// Returns true if this error is the not-found sentinel.
    ///
    /// Callers use this to distinguish "zero documents matched" from
    /// operational failures; only the latter are ever logged.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelStoreError::NotFound)
    }
}

impl From<BsonError> for ModelStoreError {
    fn from(err: BsonError) -> Self {
        ModelStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ModelStoreError {
    fn from(err: SerdeJsonError) -> Self {
        ModelStoreError::Serialization(err.to_string())
    }
}
