use std::time::Duration;

use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{Collection, IndexModel, options::IndexOptions};

use mongolayer_core::{
    error::DocumentStoreResult,
    index::IndexDefinition,
    query::SortDirection,
};

use crate::{client::MongoClient, error::map_driver_error};

/// Index administration for one collection.
#[derive(Debug, Clone)]
pub struct IndexManager {
    collection: Collection<Document>,
}

impl IndexManager {
    pub fn new(client: &MongoClient, collection_name: &str) -> Self {
        Self { collection: client.collection(collection_name) }
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Creates one index and returns its name.
    pub async fn create_index(&self, index: IndexDefinition) -> DocumentStoreResult<String> {
        let name = self
            .collection
            .create_index(to_index_model(index))
            .await
            .map_err(map_driver_error)?
            .index_name;

        tracing::info!(collection = %self.collection_name(), index = %name, "created index");

        Ok(name)
    }

    /// Creates several indexes in one command and returns their names.
    pub async fn create_indexes(&self, indexes: Vec<IndexDefinition>) -> DocumentStoreResult<Vec<String>> {
        if indexes.is_empty() {
            return Ok(Vec::new());
        }

        let names = self
            .collection
            .create_indexes(indexes.into_iter().map(to_index_model))
            .await
            .map_err(map_driver_error)?
            .index_names;

        tracing::info!(collection = %self.collection_name(), indexes = ?names, "created indexes");

        Ok(names)
    }

    pub async fn drop_index(&self, name: &str) -> DocumentStoreResult<()> {
        self.collection
            .drop_index(name)
            .await
            .map_err(map_driver_error)?;

        tracing::info!(collection = %self.collection_name(), index = %name, "dropped index");

        Ok(())
    }

    /// Drops every index except the one on `_id`.
    pub async fn drop_all_indexes(&self) -> DocumentStoreResult<()> {
        self.collection
            .drop_indexes()
            .await
            .map_err(map_driver_error)?;

        tracing::info!(collection = %self.collection_name(), "dropped all indexes");

        Ok(())
    }

    pub async fn list_indexes(&self) -> DocumentStoreResult<Vec<IndexModel>> {
        self.collection
            .list_indexes()
            .await
            .map_err(map_driver_error)?
            .try_collect()
            .await
            .map_err(map_driver_error)
    }

    pub async fn list_index_names(&self) -> DocumentStoreResult<Vec<String>> {
        self.collection
            .list_index_names()
            .await
            .map_err(map_driver_error)
    }

    /// Creates a text index over `fields`.
    pub async fn create_text_index(&self, fields: &[&str]) -> DocumentStoreResult<String> {
        self.create_index(IndexDefinition::text(fields.iter().copied())).await
    }

    pub async fn create_compound_index(&self, fields: &[(&str, SortDirection)]) -> DocumentStoreResult<String> {
        self.create_index(IndexDefinition::compound(fields.iter().copied())).await
    }

    pub async fn create_unique_index(&self, field: &str) -> DocumentStoreResult<String> {
        self.create_index(IndexDefinition::ascending(field).unique()).await
    }

    pub async fn create_sparse_index(&self, field: &str) -> DocumentStoreResult<String> {
        self.create_index(IndexDefinition::ascending(field).sparse()).await
    }

    /// Creates a TTL index: documents expire `expire_after` past the date in `field`.
    pub async fn create_ttl_index(&self, field: &str, expire_after: Duration) -> DocumentStoreResult<String> {
        self.create_index(IndexDefinition::ascending(field).expire_after(expire_after)).await
    }

    /// Creates an index over only the documents matching `filter`.
    pub async fn create_partial_index(&self, field: &str, filter: Document) -> DocumentStoreResult<String> {
        self.create_index(IndexDefinition::ascending(field).partial_filter(filter)).await
    }

    pub async fn index_exists(&self, name: &str) -> DocumentStoreResult<bool> {
        Ok(self.list_index_names().await?.iter().any(|index| index == name))
    }

    /// Usage statistics from the `$indexStats` aggregation stage.
    pub async fn index_stats(&self) -> DocumentStoreResult<Vec<Document>> {
        self.collection
            .aggregate(vec![doc! { "$indexStats": {} }])
            .await
            .map_err(map_driver_error)?
            .try_collect()
            .await
            .map_err(map_driver_error)
    }
}

/// Converts a driver-free definition into a driver index model.
pub fn to_index_model(index: IndexDefinition) -> IndexModel {
    let options = IndexOptions::builder()
        .name(index.name)
        .unique(index.unique.then_some(true))
        .sparse(index.sparse.then_some(true))
        .expire_after(index.expire_after)
        .partial_filter_expression(index.partial_filter)
        .build();

    IndexModel::builder()
        .keys(index.keys)
        .options(options)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_index_has_no_options_set() {
        let model = to_index_model(IndexDefinition::descending("created_at"));
        let options = model.options.unwrap();

        assert_eq!(model.keys, doc! { "created_at": -1 });
        assert_eq!(options.name, None);
        assert_eq!(options.unique, None);
        assert_eq!(options.sparse, None);
        assert_eq!(options.expire_after, None);
        assert_eq!(options.partial_filter_expression, None);
    }

    #[test]
    fn options_are_carried_over() {
        let model = to_index_model(
            IndexDefinition::ascending("email")
                .named("idx_email_unique")
                .unique()
                .sparse()
                .expire_after(Duration::from_secs(60))
                .partial_filter(doc! { "status": "active" }),
        );
        let options = model.options.unwrap();

        assert_eq!(options.name.as_deref(), Some("idx_email_unique"));
        assert_eq!(options.unique, Some(true));
        assert_eq!(options.sparse, Some(true));
        assert_eq!(options.expire_after, Some(Duration::from_secs(60)));
        assert_eq!(options.partial_filter_expression, Some(doc! { "status": "active" }));
    }

    #[test]
    fn text_index_model() {
        let model = to_index_model(IndexDefinition::text(["title", "content"]).named("idx_text_search"));
        assert_eq!(model.keys, doc! { "title": "text", "content": "text" });
    }
}
