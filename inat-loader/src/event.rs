//! Events emitted by a running load job.
//!
//! Delivery is fire-and-forget over an unbounded channel: the worker never
//! waits for the consumer, and a consumer that has gone away never stops a
//! worker. Per job, the event sequence is always
//! `TotalRows (ChunkReady)* (Finished | Cancelled | Error)`, in result-set
//! order with no reordering.

use tokio::sync::mpsc;

/// Sentinel total when the row count could not be determined.
pub const UNKNOWN_TOTAL: i64 = -1;

/// One result row: column name → JSON value. Columns without a name are
/// keyed by their position.
pub type RowMap = serde_json::Map<String, serde_json::Value>;

/// An ordered batch of rows, at most `chunk_size` long.
pub type RowBatch = Vec<RowMap>;

/// Sending half handed to each load job.
pub type EventSender = mpsc::UnboundedSender<LoadEvent>;

/// Receiving half owned by the consumer (typically the UI event loop).
pub type EventReceiver = mpsc::UnboundedReceiver<LoadEvent>;

/// Creates the event channel connecting load jobs to their consumer.
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// A signal from a load job to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// Result-set size, emitted once before the first batch.
    /// [`UNKNOWN_TOTAL`] when counting failed; loading continues anyway.
    TotalRows {
        /// Logical stream the event belongs to.
        key: String,
        /// Number of rows, or [`UNKNOWN_TOTAL`].
        total: i64,
    },
    /// A non-empty batch of rows in result-set order.
    ChunkReady {
        /// Logical stream the event belongs to.
        key: String,
        /// The rows of this batch.
        rows: RowBatch,
    },
    /// The result set is exhausted; no further events follow.
    Finished {
        /// Logical stream the event belongs to.
        key: String,
    },
    /// The job observed its cancel token; no further events follow.
    Cancelled {
        /// Logical stream the event belongs to.
        key: String,
    },
    /// The job failed; batches emitted before the failure stay delivered.
    Error {
        /// Logical stream the event belongs to.
        key: String,
        /// Human-readable failure description.
        message: String,
    },
}

impl LoadEvent {
    /// The logical stream key this event belongs to.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::TotalRows { key, .. }
            | Self::ChunkReady { key, .. }
            | Self::Finished { key }
            | Self::Cancelled { key }
            | Self::Error { key, .. } => key,
        }
    }
}
