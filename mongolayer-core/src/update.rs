//! Partial-update document construction.
//!
//! [`build_update_set`] turns a record into a `{"$set": {...}}` update containing only the
//! fields the caller intends to write. Which fields take part is driven by serialization
//! tags (see [`crate::tag`]):
//!
//! - only public fields with a non-empty tag other than `-` are considered;
//! - an empty primary name falls back to the lower-cased field identifier;
//! - `omitempty` fields are skipped while they hold their zero value (see [`crate::zero`]);
//! - the identity field `_id` is never written.
//!
//! If no field qualifies the result is an empty document, not an error. Callers should check
//! for that before sending an update.
//!
//! Records expose their fields through [`UpdateSet`], normally generated with
//! `#[derive(UpdateSet)]`:
//!
//! ```ignore
//! use mongolayer::prelude::*;
//!
//! #[derive(UpdateSet)]
//! pub struct ProfilePatch {
//!     #[bson = "username"]
//!     pub name: String,
//!     #[bson = "profile.bio,omitempty"]
//!     pub bio: String,
//! }
//!
//! let update = build_update_set(&ProfilePatch { name: "alice".into(), bio: String::new() });
//! assert_eq!(update, doc! { "$set": { "username": "alice" } });
//! ```

use bson::{Bson, DateTime, Document, ser::serialize_to_bson};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashMap},
    rc::Rc,
    sync::Arc,
};

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    tag::FieldTag,
    zero::IsZero,
};

/// External name of the identity field. It never appears in a partial update.
pub const IDENTITY_FIELD: &str = "_id";

/// Update operator the collected fields are wrapped in.
pub const SET_OPERATOR: &str = "$set";

/// Field refreshed by the repository on every update.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// A field value that can be written into an update document.
///
/// Implemented for every `Serialize` type; object safe so records can hand out
/// `&dyn FieldValue` for heterogeneous fields.
pub trait FieldValue {
    /// Converts the value to its BSON representation.
    fn to_field_bson(&self) -> DocumentStoreResult<Bson>;
}

impl<T: Serialize> FieldValue for T {
    fn to_field_bson(&self) -> DocumentStoreResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }
}

/// One field of a record as seen by a [`FieldVisitor`].
pub struct FieldRef<'a> {
    ident: &'static str,
    tag: Option<&'static str>,
    value: &'a dyn FieldValue,
    zero: Option<&'a dyn IsZero>,
}

impl<'a> FieldRef<'a> {
    /// Describes a field by its declared identifier, raw tag and current value.
    pub fn new(ident: &'static str, tag: Option<&'static str>, value: &'a dyn FieldValue) -> Self {
        Self { ident, tag, value, zero: None }
    }

    /// Attaches the zero check used by `omitempty`.
    ///
    /// Fields without a zero check are always treated as non-zero.
    pub fn with_zero_check(mut self, zero: &'a dyn IsZero) -> Self {
        self.zero = Some(zero);
        self
    }

    /// The declared identifier of the field.
    pub fn ident(&self) -> &'static str {
        self.ident
    }

    /// The raw serialization tag, if the field has one.
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    /// The field's current value.
    pub fn value(&self) -> &'a dyn FieldValue {
        self.value
    }

    /// Returns `true` if the field has a zero check and currently holds its zero value.
    pub fn is_zero(&self) -> bool {
        self.zero.is_some_and(|zero| zero.is_zero())
    }
}

/// Receives the fields of a record in declaration order.
pub trait FieldVisitor {
    fn visit_field(&mut self, field: FieldRef<'_>);
}

/// A value that can describe itself as a set of tagged fields.
///
/// The default implementation exposes no fields; it is used for scalars, sequences and
/// mappings, which therefore produce an empty update.
pub trait UpdateSet {
    /// Hands every externally visible field to `visitor`, in declaration order.
    fn visit_fields(&self, _visitor: &mut dyn FieldVisitor) {}
}

impl<T: UpdateSet + ?Sized> UpdateSet for &T {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        (**self).visit_fields(visitor)
    }
}

impl<T: UpdateSet + ?Sized> UpdateSet for &mut T {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        (**self).visit_fields(visitor)
    }
}

impl<T: UpdateSet + ?Sized> UpdateSet for Box<T> {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        (**self).visit_fields(visitor)
    }
}

impl<T: UpdateSet + ?Sized> UpdateSet for Rc<T> {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        (**self).visit_fields(visitor)
    }
}

impl<T: UpdateSet + ?Sized> UpdateSet for Arc<T> {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        (**self).visit_fields(visitor)
    }
}

// An absent value is a null pointer: nothing to write.
impl<T: UpdateSet> UpdateSet for Option<T> {
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        if let Some(value) = self {
            value.visit_fields(visitor);
        }
    }
}

macro_rules! impl_update_set_opaque {
    ($($ty:ty),* $(,)?) => {
        $(impl UpdateSet for $ty {})*
    };
}

impl_update_set_opaque!(
    (), bool, char, str, String, f32, f64,
    i8, i16, i32, i64, i128, isize,
    u8, u16, u32, u64, u128, usize,
    Bson, Document, DateTime, bson::oid::ObjectId,
);

impl<T> UpdateSet for [T] {}
impl<T, const N: usize> UpdateSet for [T; N] {}
impl<T> UpdateSet for Vec<T> {}
impl<K, V, S> UpdateSet for HashMap<K, V, S> {}
impl<K, V> UpdateSet for BTreeMap<K, V> {}

/// [`FieldVisitor`] that applies the tag and zero-value rules and collects the fields to set.
#[derive(Debug, Default)]
pub struct UpdateSetBuilder {
    fields: Document,
}

impl UpdateSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fields collected so far, without the `$set` wrapper.
    pub fn fields(&self) -> &Document {
        &self.fields
    }

    /// Wraps the collected fields under `$set`, or returns an empty document if there are none.
    pub fn build(self) -> Document {
        let mut update = Document::new();

        if !self.fields.is_empty() {
            update.insert(SET_OPERATOR, self.fields);
        }

        update
    }
}

impl FieldVisitor for UpdateSetBuilder {
    fn visit_field(&mut self, field: FieldRef<'_>) {
        let Some(raw) = field.tag() else {
            return;
        };
        if FieldTag::is_excluded(raw) {
            return;
        }

        let tag = FieldTag::parse(raw);
        let name = tag.resolve_name(field.ident());

        if tag.omit_empty() && field.is_zero() {
            return;
        }
        if name == IDENTITY_FIELD {
            return;
        }

        match field.value().to_field_bson() {
            Ok(value) => {
                self.fields.insert(name.into_owned(), value);
            }
            Err(err) => {
                tracing::warn!(field = field.ident(), error = %err, "skipping field that cannot be written as BSON");
            }
        }
    }
}

/// Builds the `$set` update for `data`.
///
/// Never fails: values that expose no fields, absent optionals and records where nothing
/// qualifies all yield an empty document.
pub fn build_update_set<T: UpdateSet + ?Sized>(data: &T) -> Document {
    let mut builder = UpdateSetBuilder::new();
    data.visit_fields(&mut builder);
    builder.build()
}

/// Sets `$set.updated_at` on an update document, creating the `$set` operator if needed.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidDocument`] if the update already has a `$set` entry
/// that is not a document.
pub fn stamp_updated_at(update: &mut Document, now: DateTime) -> DocumentStoreResult<()> {
    if !update.contains_key(SET_OPERATOR) {
        update.insert(SET_OPERATOR, Document::new());
    }

    match update.get_mut(SET_OPERATOR) {
        Some(Bson::Document(set)) => {
            set.insert(UPDATED_AT_FIELD, now);
            Ok(())
        }
        _ => Err(DocumentStoreError::InvalidDocument(format!(
            "{SET_OPERATOR} must be a document"
        ))),
    }
}
