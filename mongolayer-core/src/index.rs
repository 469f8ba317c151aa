//! Declarative index definitions.
//!
//! An [`IndexDefinition`] describes the key pattern and options of one index without
//! depending on the driver. Documents list theirs in [`Document::indexes`] and the
//! `mongolayer-mongodb` crate turns them into driver index models.
//!
//! [`Document::indexes`]: crate::document::Document::indexes

use std::time::Duration;

use bson::{Bson, Document};

use crate::query::SortDirection;

/// Key and options of a single index.
///
/// ```ignore
/// use mongolayer::index::IndexDefinition;
/// use mongolayer::query::SortDirection;
///
/// let index = IndexDefinition::compound([("status", SortDirection::Asc), ("created_at", SortDirection::Desc)])
///     .named("idx_status_created_at");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndexDefinition {
    /// Ordered key pattern, e.g. `{ "status": 1, "created_at": -1 }`.
    pub keys: Document,
    pub name: Option<String>,
    pub unique: bool,
    pub sparse: bool,
    /// TTL for indexes on date fields.
    pub expire_after: Option<Duration>,
    pub partial_filter: Option<Document>,
}

impl IndexDefinition {
    /// Creates a definition from a raw key pattern.
    pub fn new(keys: Document) -> Self {
        Self { keys, ..Default::default() }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::compound([(field, SortDirection::Asc)])
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::compound([(field, SortDirection::Desc)])
    }

    /// A text index over every given field.
    pub fn text<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            fields
                .into_iter()
                .map(|field| (field.into(), Bson::String("text".to_string())))
                .collect(),
        )
    }

    /// A compound index. Keys keep the order they are given in.
    pub fn compound<S: Into<String>>(fields: impl IntoIterator<Item = (S, SortDirection)>) -> Self {
        Self::new(
            fields
                .into_iter()
                .map(|(field, direction)| (field.into(), Bson::Int32(direction.as_i32())))
                .collect(),
        )
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = true;
        self
    }

    /// Documents expire `ttl` after the indexed date.
    pub fn expire_after(mut self, ttl: Duration) -> Self {
        self.expire_after = Some(ttl);
        self
    }

    /// Only documents matching `filter` are indexed.
    pub fn partial_filter(mut self, filter: Document) -> Self {
        self.partial_filter = Some(filter);
        self
    }
}

/// The `created_at` and `updated_at` descending indexes every stored document benefits from.
pub fn base_document_indexes() -> Vec<IndexDefinition> {
    vec![
        IndexDefinition::descending("created_at").named("idx_created_at_desc"),
        IndexDefinition::descending("updated_at").named("idx_updated_at_desc"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_field_indexes() {
        assert_eq!(IndexDefinition::ascending("username").keys, doc! { "username": 1 });
        assert_eq!(IndexDefinition::descending("created_at").keys, doc! { "created_at": -1 });
    }

    #[test]
    fn compound_keeps_key_order() {
        let index = IndexDefinition::compound([
            ("status", SortDirection::Asc),
            ("created_at", SortDirection::Desc),
        ]);
        let keys: Vec<&String> = index.keys.keys().collect();

        assert_eq!(keys, vec!["status", "created_at"]);
    }

    #[test]
    fn text_index() {
        assert_eq!(
            IndexDefinition::text(["title", "content"]).keys,
            doc! { "title": "text", "content": "text" },
        );
    }

    #[test]
    fn options() {
        let index = IndexDefinition::ascending("email")
            .named("idx_email_unique")
            .unique()
            .sparse()
            .expire_after(Duration::from_secs(3600))
            .partial_filter(doc! { "status": "active" });

        assert_eq!(index.name.as_deref(), Some("idx_email_unique"));
        assert!(index.unique);
        assert!(index.sparse);
        assert_eq!(index.expire_after, Some(Duration::from_secs(3600)));
        assert_eq!(index.partial_filter, Some(doc! { "status": "active" }));
    }

    #[test]
    fn base_indexes() {
        let names: Vec<Option<String>> = base_document_indexes().into_iter().map(|index| index.name).collect();
        assert_eq!(names, vec![Some("idx_created_at_desc".to_string()), Some("idx_updated_at_desc".to_string())]);
    }
}
