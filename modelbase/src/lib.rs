//! Main modelbase crate providing a unified interface for model storage.
//!
//! This crate is the primary entry point for users of the modelbase
//! framework. It re-exports the core types from the sub-crates and provides
//! convenient access to the storage backends.
//!
//! # Features
//!
//! - **Embedded base fields** - Every model carries its identifier and
//!   creation/modification timestamps through an embedded [`model::BaseModel`]
//! - **Generic operations** - Insert, find, update, delete, exists, distinct
//!   and aggregation, all typed by the model
//! - **Paged queries** - Count-backed pagination with projection and sort
//!   options drawn from a reuse pool
//! - **Multiple backends** - In-memory storage out of the box, MongoDB
//!   behind the `mongodb` feature
//!
//! # Quick Start
//!
//! ```ignore
//! use modelbase::{prelude::*, memory::InMemoryStore};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(flatten)]
//!     pub base: BaseModel,
//!     pub name: String,
//! }
//!
//! impl Model for User {
//!     fn collection_name() -> &'static str { "users" }
//!     fn base(&self) -> &BaseModel { &self.base }
//!     fn base_mut(&mut self) -> &mut BaseModel { &mut self.base }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = ModelStore::new(InMemoryStore::new());
//!
//!     let mut user = User { base: BaseModel::new(), name: "Alice".to_string() };
//!     store.insert(&mut user).await.unwrap();
//!
//!     let mut found = User { base: BaseModel::new(), name: String::new() };
//!     let hit = store.find_by_id(&user.id_hex(), &mut found).await.unwrap();
//!     assert!(hit);
//!
//!     let mut page: Vec<User> = Vec::new();
//!     let (total, pages) = store.find_page(None, &mut page, 10, 1).await;
//!     println!("{total} users across {pages} pages: {page:?}");
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use modelbase_core::{backend, error, model, page, store, updater};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use modelbase_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use modelbase_mongodb::{MongoStore, MongoStoreBuilder};
}
