//! Retrieval error types.

use thiserror::Error;

/// Errors raised while reading or writing the knowledge store.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience alias for retrieval results.
pub type RetrievalResult<T> = Result<T, RetrievalError>;
