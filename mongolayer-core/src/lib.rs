//! Driver-free building blocks of the mongolayer project.
//!
//! This crate provides:
//!
//! - **Partial updates** ([`update`]) - Builds `$set` update documents from typed records
//! - **Zero values** ([`zero`]) - The `IsZero` capability used by `omitempty` fields
//! - **Field tags** ([`tag`]) - Parser for the `name,omitempty` tag grammar
//! - **Documents** ([`document`]) - The base document, lifecycle hooks and conversions
//! - **Filters** ([`filter`]) - Builders for raw filter and sort documents
//! - **Queries** ([`query`]) - Composable filter expressions translated to BSON
//! - **Object ids** ([`oid`]) - Hex string conversion helpers
//! - **Pagination** ([`page`]) - Page parameters and result metadata
//! - **Indexes** ([`index`]) - Declarative index definitions
//! - **Configuration** ([`config`]) - Client connection settings
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use mongolayer::{UpdateSet, update::build_update_set};
//!
//! #[derive(UpdateSet)]
//! pub struct ProfilePatch {
//!     #[bson = "username"]
//!     pub username: String,
//!     #[bson = "profile.bio,omitempty"]
//!     pub bio: String,
//! }
//!
//! let update = build_update_set(&ProfilePatch { username: "alice".into(), bio: String::new() });
//! // { "$set": { "username": "alice" } }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mongolayer_core;

pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod index;
pub mod oid;
pub mod page;
pub mod query;
pub mod tag;
pub mod update;
pub mod zero;
