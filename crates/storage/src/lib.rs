//! Storage Layer
//!
//! Persists recorded sums in a single-file SQLite database.

mod repository;

pub use repository::{SumRecord, SumStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot open database {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("{a} + {b} overflows a 64-bit integer")]
    Overflow { a: i64, b: i64 },
}
