//! Core traits and types for documents stored through a repository.
//!
//! Every stored type embeds a [`BaseDocument`] carrying the `_id`, `created_at` and
//! `updated_at` fields and implements [`Document`] to name its collection and expose that
//! base. The repository runs the lifecycle hooks before inserts and replacements.

use bson::{
    Bson, DateTime, Document as BsonDocument,
    de::deserialize_from_document,
    oid::ObjectId,
    ser::serialize_to_document,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value, to_value};

use crate::{
    error::DocumentStoreResult,
    index::IndexDefinition,
    update::{FieldRef, FieldVisitor, UpdateSet},
    zero::IsZero,
};

/// Fields shared by every stored document.
///
/// Embed it with `#[serde(flatten)]` so the fields land at the top level of the stored
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseDocument {
    /// Identity, assigned on insert when absent.
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Default for BaseDocument {
    fn default() -> Self {
        Self {
            id: None,
            created_at: DateTime::from_millis(0),
            updated_at: DateTime::from_millis(0),
        }
    }
}

impl BaseDocument {
    /// Assigns an id if missing, sets `created_at` if unset and refreshes `updated_at`.
    pub fn before_insert(&mut self) {
        let now = DateTime::now();

        if self.id.is_none_or(|id| id.is_zero()) {
            self.id = Some(ObjectId::new());
        }
        if self.created_at.is_zero() {
            self.created_at = now;
        }
        self.updated_at = now;
    }

    /// Refreshes `updated_at`.
    pub fn before_update(&mut self) {
        self.updated_at = DateTime::now();
    }
}

impl UpdateSet for BaseDocument {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        visitor.visit_field(FieldRef::new("id", Some("_id,omitempty"), &self.id).with_zero_check(&self.id));
        visitor.visit_field(FieldRef::new("created_at", Some("created_at"), &self.created_at));
        visitor.visit_field(FieldRef::new("updated_at", Some("updated_at"), &self.updated_at));
    }
}

impl IsZero for BaseDocument {
    fn is_zero(&self) -> bool {
        self.id.is_zero() && self.created_at.is_zero() && self.updated_at.is_zero()
    }
}

/// Core trait that all documents stored through a repository must implement.
///
/// # Example
///
/// ```ignore
/// use mongolayer::document::{BaseDocument, Document};
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Default, Serialize, Deserialize)]
/// pub struct User {
///     #[serde(flatten)]
///     pub base: BaseDocument,
///     pub username: String,
/// }
///
/// impl Document for User {
///     fn collection_name() -> &'static str {
///         "users"
///     }
///
///     fn base(&self) -> &BaseDocument {
///         &self.base
///     }
///
///     fn base_mut(&mut self) -> &mut BaseDocument {
///         &mut self.base
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Returns the name of the collection this document belongs to.
    fn collection_name() -> &'static str;

    fn base(&self) -> &BaseDocument;

    fn base_mut(&mut self) -> &mut BaseDocument;

    /// Indexes this collection should carry. Empty by default.
    fn indexes() -> Vec<IndexDefinition> {
        Vec::new()
    }

    fn id(&self) -> Option<ObjectId> {
        self.base().id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.base_mut().id = Some(id);
    }

    fn created_at(&self) -> DateTime {
        self.base().created_at
    }

    fn updated_at(&self) -> DateTime {
        self.base().updated_at
    }

    fn set_updated_at(&mut self, at: DateTime) {
        self.base_mut().updated_at = at;
    }

    /// Called by the repository before the document is inserted.
    fn before_insert(&mut self) {
        self.base_mut().before_insert();
    }

    /// Called by the repository before the document replaces a stored one.
    fn before_update(&mut self) {
        self.base_mut().before_update();
    }
}

/// Conversion helpers between documents, BSON and JSON.
///
/// Automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document to a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_document(&self) -> DocumentStoreResult<BsonDocument>;

    /// Creates a document from a BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_document(document: BsonDocument) -> DocumentStoreResult<Self>;

    /// Converts this document to a JSON value.
    fn to_json(&self) -> DocumentStoreResult<Value>;

    /// Creates a document from a JSON value.
    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_document(&self) -> DocumentStoreResult<BsonDocument> {
        Ok(serialize_to_document(self)?)
    }

    fn from_document(document: BsonDocument) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_document(document)?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// Extracts the `_id` of a stored BSON document.
pub fn object_id_of(document: &BsonDocument) -> Option<ObjectId> {
    match document.get("_id") {
        Some(Bson::ObjectId(id)) => Some(*id),
        _ => None,
    }
}
