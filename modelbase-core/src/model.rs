//! Core model contract: identity, timestamps and lifecycle hooks.
//!
//! Every persisted type embeds a [`BaseModel`] carrying its unique identifier
//! and creation/modification timestamps, and implements [`Model`] to declare
//! the collection it belongs to. The lifecycle hooks on [`BaseModel`] are
//! invoked by the operations layer as an explicit step right before insert
//! and update calls; they are not overridable.

use bson::{Bson, Document, oid::ObjectId, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::{ModelStoreError, ModelStoreResult};

const NIL_ID: [u8; 12] = [0u8; 12];

/// The base shape every persisted model embeds.
///
/// Embed it with `#[serde(flatten)]` so the identity and timestamp fields
/// land at the top level of the stored document:
///
/// ```ignore
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(flatten)]
///     pub base: BaseModel,
///     pub name: String,
/// }
/// ```
///
/// A freshly constructed `BaseModel` is zero-valued: the id is the all-zero
/// `ObjectId` and both timestamps are 0. The fields are populated by the
/// lifecycle hooks on first persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseModel {
    /// Unique identifier, assigned once. Zero until first insert or upsert.
    #[serde(rename = "_id")]
    pub id: ObjectId,
    /// Creation time in milliseconds since epoch, set exactly once.
    pub create_time: i64,
    /// Last modification time in milliseconds since epoch, refreshed on
    /// every insert, update and upsert.
    pub last_modify_time: i64,
}

impl BaseModel {
    /// Creates a zero-valued base: nil id, unset timestamps.
    pub fn new() -> Self {
        Self {
            id: ObjectId::from_bytes(NIL_ID),
            create_time: 0,
            last_modify_time: 0,
        }
    }

    /// Returns true while the identifier has not been assigned.
    pub fn is_zero(&self) -> bool {
        self.id.bytes() == NIL_ID
    }

    /// Insert hook: assigns the id if zero, sets `create_time` if unset and
    /// refreshes `last_modify_time`. Invoked by
    /// [`ModelStore::insert`](crate::store::ModelStore::insert).
    pub fn before_insert(&mut self) {
        if self.is_zero() {
            self.id = ObjectId::new();
        }
        if self.create_time == 0 {
            self.create_time = now_millis();
        }
        self.last_modify_time = now_millis();
    }

    /// Update hook: refreshes `last_modify_time` only. Invoked by
    /// [`ModelStore::update`](crate::store::ModelStore::update).
    pub fn before_update(&mut self) {
        self.last_modify_time = now_millis();
    }

    /// Upsert hook: identical to [`before_insert`](Self::before_insert),
    /// since an upsert may create the document.
    pub fn before_upsert(&mut self) {
        self.before_insert();
    }
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Core trait implemented by every persisted model type.
///
/// A model declares the collection it lives in (a pure function of the
/// type) and exposes its embedded [`BaseModel`]. Everything else the store
/// needs is provided on top of these three methods.
///
/// # Example
///
/// ```ignore
/// impl Model for User {
///     fn collection_name() -> &'static str { "users" }
///     fn base(&self) -> &BaseModel { &self.base }
///     fn base_mut(&mut self) -> &mut BaseModel { &mut self.base }
/// }
/// ```
pub trait Model: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns the name of the collection this model belongs to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users").
    fn collection_name() -> &'static str;

    /// Returns a reference to the embedded base fields.
    fn base(&self) -> &BaseModel;

    /// Returns a mutable reference to the embedded base fields.
    fn base_mut(&mut self) -> &mut BaseModel;

    /// Returns this model's identifier.
    fn object_id(&self) -> ObjectId {
        self.base().id
    }

    /// Returns the hexadecimal string form of this model's identifier.
    fn id_hex(&self) -> String {
        self.base().id.to_hex()
    }

    /// Replaces the identifier with the one encoded in `hex`.
    ///
    /// An invalid hex string leaves the identifier untouched.
    fn set_id_hex(&mut self, hex: &str) {
        if let Ok(id) = ObjectId::parse_str(hex) {
            self.base_mut().id = id;
        }
    }
}

/// Converts a hex string into an [`ObjectId`].
///
/// An invalid string is reported to the diagnostic sink and yields the nil
/// (all-zero) identifier rather than aborting the calling operation.
pub fn object_id_from_hex(hex: &str) -> ObjectId {
    match ObjectId::parse_str(hex) {
        Ok(id) => id,
        Err(err) => {
            tracing::error!(hex, %err, "invalid object id hex string");
            ObjectId::from_bytes(NIL_ID)
        }
    }
}

/// Extension trait providing serialization utilities for models.
///
/// Automatically implemented for all types that implement [`Model`].
pub trait ModelExt: Model {
    /// Converts this model to a BSON document for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the model does not
    /// serialize to a document.
    fn to_document(&self) -> ModelStoreResult<Document>;

    /// Creates a model from a stored BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    fn from_document(document: Document) -> ModelStoreResult<Self>;

    /// Converts this model to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> ModelStoreResult<Value>;

    /// Creates a model from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    fn from_json(value: Value) -> ModelStoreResult<Self>;
}

impl<M: Model> ModelExt for M {
    fn to_document(&self) -> ModelStoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(document) => Ok(document),
            other => Err(ModelStoreError::Serialization(format!(
                "model serialized to {:?}, expected a document",
                other.element_type()
            ))),
        }
    }

    fn from_document(document: Document) -> ModelStoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(document))?)
    }

    fn to_json(&self) -> ModelStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> ModelStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Doc {
        #[serde(flatten)]
        base: BaseModel,
        name: String,
    }

    impl Model for Doc {
        fn collection_name() -> &'static str {
            "docs"
        }

        fn base(&self) -> &BaseModel {
            &self.base
        }

        fn base_mut(&mut self) -> &mut BaseModel {
            &mut self.base
        }
    }

    #[test]
    fn fresh_base_is_zero() {
        let base = BaseModel::new();
        assert!(base.is_zero());
        assert_eq!(base.create_time, 0);
        assert_eq!(base.last_modify_time, 0);
    }

    #[test]
    fn before_insert_populates_once() {
        let mut base = BaseModel::new();
        base.before_insert();

        assert!(!base.is_zero());
        assert!(base.create_time > 0);
        assert!(base.last_modify_time >= base.create_time);

        let id = base.id;
        let created = base.create_time;
        base.before_insert();
        assert_eq!(base.id, id);
        assert_eq!(base.create_time, created);
    }

    #[test]
    fn before_update_refreshes_modify_time_only() {
        let mut base = BaseModel::new();
        base.before_insert();
        let id = base.id;
        let created = base.create_time;

        base.before_update();
        assert_eq!(base.id, id);
        assert_eq!(base.create_time, created);
        assert!(base.last_modify_time >= created);
    }

    #[test]
    fn set_id_hex_ignores_invalid_input() {
        let mut doc = Doc { base: BaseModel::new(), name: "a".into() };
        doc.set_id_hex("not-a-hex-id");
        assert!(doc.base.is_zero());

        let id = ObjectId::new();
        doc.set_id_hex(&id.to_hex());
        assert_eq!(doc.object_id(), id);
        assert_eq!(doc.id_hex(), id.to_hex());
    }

    #[test]
    fn object_id_from_hex_yields_nil_on_bad_input() {
        assert_eq!(object_id_from_hex("zz"), ObjectId::from_bytes([0u8; 12]));

        let id = ObjectId::new();
        assert_eq!(object_id_from_hex(&id.to_hex()), id);
    }

    #[test]
    fn document_round_trip_keeps_base_fields() {
        let mut doc = Doc { base: BaseModel::new(), name: "alice".into() };
        doc.base.before_insert();

        let stored = doc.to_document().unwrap();
        assert!(stored.contains_key("_id"));
        assert!(stored.contains_key("create_time"));

        let restored = Doc::from_document(stored).unwrap();
        assert_eq!(restored.base, doc.base);
        assert_eq!(restored.name, doc.name);
    }
}
