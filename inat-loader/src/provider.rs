//! Connection acquisition seam.
//!
//! Every job opens and closes its own connection; no two jobs ever share
//! one. The trait keeps the loader independent of where connections come
//! from — a SQLite file in production, a closure in tests (which is also
//! where per-connection setup like custom SQL functions happens).

use crate::error::{LoadError, LoadResult};
use rusqlite::Connection;
use std::path::PathBuf;

/// Produces one private connection per load job.
pub trait ConnectionProvider: Send + Sync {
    /// Opens a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when the database cannot be opened; the job
    /// reports this as a terminal `Error` event.
    fn connect(&self) -> LoadResult<Connection>;
}

/// Opens connections to a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteFile {
    path: PathBuf,
}

impl SqliteFile {
    /// Provider for the given database file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConnectionProvider for SqliteFile {
    fn connect(&self) -> LoadResult<Connection> {
        Connection::open(&self.path)
            .map_err(|e| LoadError::Connection(format!("{}: {e}", self.path.display())))
    }
}

impl<F> ConnectionProvider for F
where
    F: Fn() -> LoadResult<Connection> + Send + Sync,
{
    fn connect(&self) -> LoadResult<Connection> {
        self()
    }
}
