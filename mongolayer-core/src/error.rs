//! Error types and result types for repository, index and transaction helpers.
//!
//! Use [`DocumentStoreResult<T>`] as the return type for fallible operations. Driver errors
//! are converted into [`DocumentStoreError`] at the boundary of the `mongolayer-mongodb`
//! crate so that this crate stays free of the driver dependency.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when talking to a document store through
/// this layer.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during client initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// No document matched the filter in the given collection.
    #[error("Document not found in collection {0}")]
    DocumentNotFound(String),
    /// A string could not be parsed as an `ObjectId`.
    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),
    /// The document or update has an invalid structure.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error reported by the underlying driver.
    #[error("Backend error: {0}")]
    Backend(String),
    /// A driver error labelled as transient inside a transaction. The whole transaction
    /// may be retried.
    #[error("Transient transaction error: {0}")]
    TransientTransaction(String),
    /// The transaction could not be started, committed or retried.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl DocumentStoreError {
    /// Returns `true` if retrying the surrounding transaction may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DocumentStoreError::TransientTransaction(_))
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
