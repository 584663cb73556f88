//! Typed errors for the persistence crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration {number} ({name}) depends on unapplied migration {dependency}")]
    UnsatisfiedDependency {
        number: i64,
        name: String,
        dependency: i64,
    },

    #[error("migration {number} ({name}) checksum mismatch: recorded {recorded:x}, computed {computed:x}")]
    ChecksumMismatch {
        number: i64,
        name: String,
        recorded: u64,
        computed: u64,
    },

    #[error("no rollback SQL registered for migration {0}")]
    NoRollback(i64),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<PersistenceError> for rag_core::Error {
    fn from(err: PersistenceError) -> Self {
        rag_core::Error::Persistence(err.to_string())
    }
}
