//! Convenient re-exports of commonly used types from modelbase.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use modelbase::prelude::*;
//! ```

pub use modelbase_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{ModelStoreError, ModelStoreResult},
    model::{BaseModel, Model, ModelExt, object_id_from_hex},
    page::{FindPageOptions, PooledFindPageOptions, SortOrder},
    store::ModelStore,
    updater::Updater,
};
