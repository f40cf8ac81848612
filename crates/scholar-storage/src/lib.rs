//! # scholar-storage
//!
//! The relational store: exclusive owner of chunk rows and the structured
//! curriculum tables (courses, topics, classes, instructors, assignments).
//! All reads are parameterized. Reads go through a small round-robin
//! connection pool; writes share one connection.

pub mod pool;
pub mod rows;
pub mod schema;
pub mod store;

pub use store::SqliteStore;

use scholar_core::errors::{ScholarError, StorageError};

/// Map a sqlite error into the storage error kind.
pub(crate) fn to_storage_err(e: impl std::fmt::Display) -> ScholarError {
    StorageError::Sqlite {
        message: e.to_string(),
    }
    .into()
}
