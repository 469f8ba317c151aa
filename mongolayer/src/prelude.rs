//! Convenient re-exports of commonly used types from mongolayer.
//!
//! ```ignore
//! use mongolayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Document traits and the base document
//! - The update builder and its derive macros
//! - Query construction and filtering
//! - Pagination, index definitions and configuration
//! - Error types

pub use mongolayer_core::{
    config::ClientConfig,
    document::{BaseDocument, Document, DocumentExt},
    error::{DocumentStoreError, DocumentStoreResult},
    index::IndexDefinition,
    page::{Page, PaginationParams, PaginationResult},
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    update::{FieldRef, FieldVisitor, UpdateSet, build_update_set},
    zero::IsZero,
};
pub use mongolayer_macros::{IsZero, UpdateSet};

pub use bson::{doc, oid::ObjectId};
