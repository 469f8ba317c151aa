use bson::Document;

use mongolayer_core::{
    document::Document as StoredDocument,
    error::DocumentStoreResult,
    index::base_document_indexes,
};

use crate::{client::MongoClient, index::IndexManager};

/// Creates the indexes declared by document types.
#[derive(Debug, Clone)]
pub struct DocumentIndexes {
    client: MongoClient,
}

impl DocumentIndexes {
    pub fn new(client: &MongoClient) -> Self {
        Self { client: client.clone() }
    }

    /// Creates every index in [`StoredDocument::indexes`] on the collection of `T`.
    pub async fn ensure_indexes<T: StoredDocument>(&self) -> DocumentStoreResult<Vec<String>> {
        IndexManager::new(&self.client, T::collection_name())
            .create_indexes(T::indexes())
            .await
    }

    /// Creates the `created_at` and `updated_at` indexes on `collection_name`.
    pub async fn ensure_base_document_indexes(&self, collection_name: &str) -> DocumentStoreResult<Vec<String>> {
        IndexManager::new(&self.client, collection_name)
            .create_indexes(base_document_indexes())
            .await
    }

    /// Drops all non-`_id` indexes of each collection, stopping at the first failure.
    pub async fn drop_all_document_indexes(&self, collection_names: &[&str]) -> DocumentStoreResult<()> {
        for name in collection_names {
            IndexManager::new(&self.client, name).drop_all_indexes().await?;
        }

        Ok(())
    }

    pub async fn index_usage_stats(&self, collection_name: &str) -> DocumentStoreResult<Vec<Document>> {
        IndexManager::new(&self.client, collection_name).index_stats().await
    }
}
