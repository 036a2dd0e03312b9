//! The chunked background loader.
//!
//! A [`Loader`] runs one [`LoadJob`] on a dedicated worker thread: count
//! the rows, run the SELECT, fetch in `chunk_size` batches, convert each
//! row to a column-keyed JSON map, and emit every non-empty batch to the
//! consumer. The worker owns its connection for the job's whole lifetime.
//!
//! Failures after the first batch do not retract anything: batches already
//! emitted stay delivered, then a single terminal `Error` event follows.

use crate::error::LoadResult;
use crate::event::{EventSender, LoadEvent, RowBatch, RowMap, UNKNOWN_TOTAL};
use crate::job::{CancelToken, LoadJob};
use crate::provider::ConnectionProvider;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, warn};

/// How a job's fetch loop ended (failure is an `Err` instead).
enum Completion {
    Exhausted,
    Cancelled,
}

/// Runs one load job to completion on a worker thread.
pub struct Loader {
    job: LoadJob,
    provider: Arc<dyn ConnectionProvider>,
    events: EventSender,
    cancel: CancelToken,
}

impl Loader {
    /// A loader with its own fresh cancel token.
    #[must_use]
    pub fn new(job: LoadJob, provider: Arc<dyn ConnectionProvider>, events: EventSender) -> Self {
        Self::with_cancel(job, provider, events, CancelToken::new())
    }

    /// A loader observing an externally owned cancel token.
    #[must_use]
    pub fn with_cancel(
        job: LoadJob,
        provider: Arc<dyn ConnectionProvider>,
        events: EventSender,
        cancel: CancelToken,
    ) -> Self {
        Self {
            job,
            provider,
            events,
            cancel,
        }
    }

    /// A clone of this loader's cancel token.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Starts the job on its own named worker thread.
    pub fn spawn(self) -> JoinHandle<()> {
        std::thread::Builder::new()
            .name(format!("loader-{}", self.job.key))
            .spawn(move || self.run())
            .expect("failed to spawn loader thread")
    }

    /// Runs the job on the current thread, consuming the loader.
    ///
    /// Emits `TotalRows`, zero or more `ChunkReady`, then exactly one of
    /// `Finished`, `Cancelled`, or `Error`.
    pub fn run(self) {
        debug!(key = %self.job.key, "load job starting");
        match self.execute() {
            Ok(Completion::Exhausted) => {
                debug!(key = %self.job.key, "load job finished");
                self.emit(LoadEvent::Finished {
                    key: self.job.key.clone(),
                });
            }
            Ok(Completion::Cancelled) => {
                debug!(key = %self.job.key, "load job cancelled");
                self.emit(LoadEvent::Cancelled {
                    key: self.job.key.clone(),
                });
            }
            Err(e) => {
                error!(key = %self.job.key, error = %e, "load job failed");
                self.emit(LoadEvent::Error {
                    key: self.job.key.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn execute(&self) -> LoadResult<Completion> {
        let conn = self.provider.connect()?;

        let total = self.count_rows(&conn);
        self.emit(LoadEvent::TotalRows {
            key: self.job.key.clone(),
            total,
        });

        let sql = self.job.select_sql();
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt.query([])?;

        loop {
            if self.cancel.is_cancelled() {
                return Ok(Completion::Cancelled);
            }

            let mut batch: RowBatch = Vec::new();
            let mut fetched = 0;
            while fetched < self.job.chunk_size {
                let Some(row) = rows.next()? else { break };
                fetched += 1;
                let map = row_to_map(&columns, row)?;
                if self.job.filter.as_ref().is_none_or(|f| f.accepts(&map)) {
                    batch.push(map);
                }
            }

            if fetched == 0 {
                return Ok(Completion::Exhausted);
            }
            if !batch.is_empty() {
                self.emit(LoadEvent::ChunkReady {
                    key: self.job.key.clone(),
                    rows: batch,
                });
            }
            if fetched < self.job.chunk_size {
                return Ok(Completion::Exhausted);
            }
        }
    }

    /// Best-effort row count; the job proceeds either way.
    fn count_rows(&self, conn: &Connection) -> i64 {
        match conn.query_row(&self.job.count_sql(), [], |row| row.get::<_, i64>(0)) {
            Ok(total) => total,
            Err(e) => {
                warn!(key = %self.job.key, error = %e, "row count failed, total unknown");
                UNKNOWN_TOTAL
            }
        }
    }

    /// Fire-and-forget: a consumer that has hung up does not stop the job.
    fn emit(&self, event: LoadEvent) {
        let _ = self.events.send(event);
    }
}

/// Zips a row against the column names into a JSON map. Columns with an
/// empty name fall back to their position as the key.
fn row_to_map(columns: &[String], row: &rusqlite::Row<'_>) -> LoadResult<RowMap> {
    let mut map = RowMap::new();
    for (index, name) in columns.iter().enumerate() {
        let key = if name.is_empty() {
            index.to_string()
        } else {
            name.clone()
        };
        map.insert(key, json_value(row.get_ref(index)?));
    }
    Ok(map)
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(text) => serde_json::Value::from(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(blob) => serde_json::Value::from(BASE64.encode(blob)),
    }
}
