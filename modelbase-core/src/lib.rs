//! A generic model and pagination layer over document databases.
//!
//! This crate is the core of the modelbase project and provides:
//!
//! - **Model contract** ([`model`]) - Base identity/timestamp shape and lifecycle hooks
//! - **Store backend abstraction** ([`backend`]) - Trait for implementing storage backends
//! - **Pagination** ([`page`]) - Page arithmetic and the pooled find-page option object
//! - **Generic operations** ([`store`]) - CRUD, existence, distinct and aggregation helpers
//! - **Chained updates** ([`updater`]) - Read-modify-write update protocol
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use modelbase::prelude::*;
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
//!     fn collection_name() -> &'static str {
//!         "users"
//!     }
//!
//!     fn base(&self) -> &BaseModel {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut BaseModel {
//!         &mut self.base
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as modelbase_core;

pub mod backend;
pub mod error;
pub mod model;
pub mod page;
pub mod store;
pub mod updater;
