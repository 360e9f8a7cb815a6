//! Chained read-modify-write updates.
//!
//! An [`Updater`] enforces at the API level that a document is loaded
//! before it is written: `update()` is refused until a `find()` on the
//! same instance has confirmed the document exists.

use bson::Document;

use crate::{
    backend::{StoreBackend, UpdateResult},
    error::{ModelStoreError, ModelStoreResult},
    model::Model,
    store::ModelStore,
};

/// Stateful update helper bound to a caller-owned model.
///
/// Created via [`ModelStore::updater`]. The model must already carry a
/// valid identifier; [`find`](Updater::find) loads the stored document
/// into it, and only then will [`update`](Updater::update) write.
///
/// # Example
///
/// ```ignore
/// let mut user = /* model with a known id */;
/// let mut updater = store.updater(&mut user);
/// if updater.find().await {
///     updater.model().name = "renamed".to_string();
///     updater.update(None).await?;
/// }
/// ```
#[derive(Debug)]
pub struct Updater<'a, B: StoreBackend, M: Model> {
    store: &'a ModelStore<B>,
    model: &'a mut M,
    has_result: bool,
}

impl<'a, B: StoreBackend, M: Model> Updater<'a, B, M> {
    pub(crate) fn new(store: &'a ModelStore<B>, model: &'a mut M) -> Self {
        Self { store, model, has_result: false }
    }

    /// Returns a mutable reference to the wrapped model for modification
    /// between `find` and `update`.
    pub fn model(&mut self) -> &mut M {
        self.model
    }

    /// Loads the document matching the model's identifier into the model.
    ///
    /// Returns whether a matching document exists; a successful load arms
    /// [`update`](Updater::update).
    pub async fn find(&mut self) -> bool {
        let id = self.model.id_hex();

        match self.store.find_by_id(&id, self.model).await {
            Ok(true) => {
                self.has_result = true;
                true
            }
            Ok(false) => false,
            Err(_) => false,
        }
    }

    /// Writes the model back, matching by its identifier merged with the
    /// optional extra `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelStoreError::DocumentNotExist`] without performing any
    /// write unless a prior [`find`](Updater::find) on this instance
    /// succeeded; otherwise propagates the underlying update result.
    pub async fn update(&mut self, filter: Option<Document>) -> ModelStoreResult<UpdateResult> {
        if !self.has_result {
            return Err(ModelStoreError::DocumentNotExist);
        }

        self.store.update(self.model, filter).await
    }
}
