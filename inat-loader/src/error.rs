//! Error types for the loader.

use thiserror::Error;

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors that can occur while loading.
///
/// These never cross a thread boundary as panics; a running job converts
/// them into a terminal [`crate::LoadEvent::Error`] signal.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Could not obtain a connection for the job.
    #[error("connection failed: {0}")]
    Connection(String),
}
