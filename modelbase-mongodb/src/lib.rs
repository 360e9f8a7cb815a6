//! MongoDB backend implementation for modelbase.
//!
//! This crate implements the `StoreBackend` trait on top of the official
//! async MongoDB driver. Filters, projections, sorts and aggregation
//! pipelines pass through to the server unmodified, so the full query
//! language is available. Every driver call runs under a per-operation
//! timeout (10 seconds unless overridden through the builder).
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! modelbase = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use modelbase::{backend::StoreBackendBuilder, mongodb::MongoStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = MongoStore::builder("mongodb://localhost:27017", "my_database")
//!         .build()
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as modelbase_mongodb;

pub mod store;

pub use store::{MongoStore, MongoStoreBuilder};
