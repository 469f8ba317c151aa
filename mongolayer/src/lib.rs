//! A thin typed convenience layer over the MongoDB driver.
//!
//! This crate is the entry point for users of mongolayer. It re-exports the driver-free
//! building blocks of `mongolayer-core`, the derive macros and, behind the `mongodb`
//! feature, the driver pass-through.
//!
//! # Features
//!
//! - **Partial updates** - `#[derive(UpdateSet)]` turns a typed patch into a `$set` document
//! - **Document model** - Id and timestamps managed by lifecycle hooks
//! - **Composable filters** - Expressions translated to MongoDB filter documents
//! - **Indexes, pagination and transactions** - Thin helpers over the driver
//!
//! # Quick Start
//!
//! ```ignore
//! use mongolayer::{prelude::*, mongodb::{MongoClient, Repository}};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! pub struct User {
//!     #[serde(flatten)]
//!     pub base: BaseDocument,
//!     pub username: String,
//!     pub status: String,
//! }
//!
//! impl Document for User {
//!     fn collection_name() -> &'static str { "users" }
//!     fn base(&self) -> &BaseDocument { &self.base }
//!     fn base_mut(&mut self) -> &mut BaseDocument { &mut self.base }
//! }
//!
//! #[derive(UpdateSet)]
//! pub struct StatusPatch {
//!     #[bson = "status,omitempty"]
//!     pub status: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let client = MongoClient::connect(ClientConfig::default()).await?;
//!     let users = Repository::<User>::new(&client);
//!
//!     let mut user = User { username: "alice".into(), ..Default::default() };
//!     let id = users.insert_one(&mut user).await?;
//!
//!     users
//!         .update_fields_by_id(id, &StatusPatch { status: "active".into() })
//!         .await?;
//!
//!     let active = users
//!         .query(&Query::builder().filter(Filter::eq("status", "active")).build())
//!         .await?;
//!     println!("{active:?}");
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer;

pub mod prelude;

pub use mongolayer_core::{config, document, error, filter, index, oid, page, query, tag, update, zero};
pub use mongolayer_macros::{IsZero, UpdateSet};

// Re-export BSON types for convenience
pub use bson;

/// MongoDB driver pass-through.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use mongolayer_mongodb::{
        ClientSession, DeleteResult, DocumentIndexes, FindOptions, IndexManager, MongoClient,
        Repository, SessionRepository, TransactionManager, TransactionalRepository,
        UpdateResult, client::client_options, index::to_index_model,
    };
}
