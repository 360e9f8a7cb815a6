//! In-memory backend for modelbase.
//!
//! Stores collections as insertion-ordered vectors of BSON documents and
//! evaluates a useful subset of the MongoDB query and aggregation
//! languages against them. Intended for tests and local development.

#[allow(unused_extern_crates)]
extern crate self as modelbase_memory;

mod matcher;
mod pipeline;
pub mod store;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
