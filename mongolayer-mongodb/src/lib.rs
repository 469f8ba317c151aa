//! MongoDB pass-through for mongolayer.
//!
//! Every operation here is a direct call into the official `mongodb` driver plus the
//! bookkeeping of the mongolayer document model: lifecycle hooks on insert and replace,
//! `updated_at` stamping on updates and partial updates built from typed records.
//!
//! To use it, enable the `mongodb` feature of the facade crate:
//!
//! ```toml
//! [dependencies]
//! mongolayer = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Components
//!
//! - [`MongoClient`] - Connection setup, database and collection handles
//! - [`Repository`] - Typed CRUD, pagination, counting and aggregation
//! - [`IndexManager`] - Index administration for one collection
//! - [`DocumentIndexes`] - Creates the indexes declared by document types
//! - [`TransactionManager`] - Sessions and retried transactions
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::{config::ClientConfig, mongodb::{MongoClient, Repository}};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MongoClient::connect(ClientConfig::from_env()).await?;
//!     let users = Repository::<User>::new(&client);
//!
//!     let count = users.count(bson::doc! {}).await?;
//!     println!("{count} users");
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer_mongodb;

pub mod client;
mod error;
pub mod index;
pub mod indexes;
pub mod repository;
pub mod transaction;

pub use client::MongoClient;
pub use index::IndexManager;
pub use indexes::DocumentIndexes;
pub use repository::{Repository, SessionRepository};
pub use transaction::{TransactionManager, TransactionalRepository};

pub use mongodb::{
    ClientSession,
    options::FindOptions,
    results::{DeleteResult, UpdateResult},
};
