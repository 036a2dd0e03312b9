//! Chunked background table loading for the Inat suite.
//!
//! Large result sets must not block the UI event loop, so each logical
//! dataset ("invoices", "customers", the accounting ledger) is pulled by a
//! worker thread and delivered to the consumer in bounded batches:
//!
//! 1. Best-effort `COUNT(*)` → [`LoadEvent::TotalRows`] (−1 if unknown)
//! 2. The SELECT, fetched in `chunk_size` batches → [`LoadEvent::ChunkReady`]
//! 3. Exactly one terminal event: [`LoadEvent::Finished`],
//!    [`LoadEvent::Cancelled`], or [`LoadEvent::Error`]
//!
//! Workers never share connections and never wait for the consumer;
//! delivery is fire-and-forget over an unbounded channel. Cancellation is
//! cooperative, observed between batch fetches.

mod error;
mod event;
mod job;
mod loader;
mod pool;
mod provider;

pub use error::{LoadError, LoadResult};
pub use event::{
    EventReceiver, EventSender, LoadEvent, RowBatch, RowMap, UNKNOWN_TOTAL, channel,
};
pub use job::{
    CancelToken, DEFAULT_CHUNK_SIZE, JobSource, LEDGER_STREAM_KEY, LoadJob, RowFilter,
};
pub use loader::Loader;
pub use pool::LoaderPool;
pub use provider::{ConnectionProvider, SqliteFile};
