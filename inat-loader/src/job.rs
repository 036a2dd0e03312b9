//! Load job configuration: data source, chunking, filtering, cancellation.

use crate::event::RowMap;
use chrono::{DateTime, Datelike, NaiveDate};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Rows fetched per batch when the caller does not specify one.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Stream key of the accounting ledger. When this stream is loaded from a
/// table without an explicit query, rows are ordered by date descending so
/// the most recent postings arrive first.
pub const LEDGER_STREAM_KEY: &str = "ledger";

/// Date formats tried when extracting a year from a text column, after
/// the ISO-prefix fast path.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y%m%d"];

/// Where a job's rows come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// `SELECT * FROM <table>` (plus the ledger ordering special case).
    Table(String),
    /// An explicit SQL query, run verbatim.
    Query(String),
}

/// A client-side row predicate applied between fetch and emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowFilter {
    /// Keeps rows whose date column falls in the given calendar year.
    /// Rows whose year cannot be determined are dropped.
    YearEquals {
        /// Column holding the date.
        column: String,
        /// Calendar year to keep.
        year: i32,
    },
}

impl RowFilter {
    /// A [`RowFilter::YearEquals`] for the current calendar year.
    #[must_use]
    pub fn current_year(column: impl Into<String>) -> Self {
        Self::YearEquals {
            column: column.into(),
            year: chrono::Local::now().year(),
        }
    }

    /// True if the row passes the filter.
    #[must_use]
    pub fn accepts(&self, row: &RowMap) -> bool {
        match self {
            Self::YearEquals { column, year } => {
                extract_year(row.get(column.as_str())) == Some(*year)
            }
        }
    }
}

/// Extracts a calendar year from a row value.
///
/// Integers are read as Unix timestamps; text gets an ISO `YYYY-` prefix
/// fast path, then the fixed format list. Anything else has no year.
fn extract_year(value: Option<&serde_json::Value>) -> Option<i32> {
    match value? {
        serde_json::Value::Number(n) => {
            DateTime::from_timestamp(n.as_i64()?, 0).map(|dt| dt.year())
        }
        serde_json::Value::String(s) => year_from_text(s),
        _ => None,
    }
}

fn year_from_text(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.len() >= 5 && text.as_bytes()[4] == b'-' {
        if let Ok(year) = text[..4].parse::<i32>() {
            return Some(year);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .map(|date| date.year())
}

/// Configuration for one load job. Created per logical dataset, run exactly
/// once on a worker thread, then discarded.
#[derive(Debug, Clone)]
pub struct LoadJob {
    /// Logical stream identifier stamped onto every emitted event.
    pub key: String,
    /// Where the rows come from.
    pub source: JobSource,
    /// Upper bound on rows per emitted batch.
    pub chunk_size: usize,
    /// Optional client-side row predicate.
    pub filter: Option<RowFilter>,
}

impl LoadJob {
    /// A job that loads a whole table.
    #[must_use]
    pub fn table(key: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: JobSource::Table(table.into()),
            chunk_size: DEFAULT_CHUNK_SIZE,
            filter: None,
        }
    }

    /// A job that runs an explicit query.
    #[must_use]
    pub fn query(key: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: JobSource::Query(sql.into()),
            chunk_size: DEFAULT_CHUNK_SIZE,
            filter: None,
        }
    }

    /// Overrides the batch size (clamped to at least one row).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Attaches a row filter.
    #[must_use]
    pub fn with_filter(mut self, filter: RowFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// The SELECT statement this job runs.
    pub(crate) fn select_sql(&self) -> String {
        match &self.source {
            JobSource::Query(sql) => sql.clone(),
            JobSource::Table(table) if self.key == LEDGER_STREAM_KEY => {
                format!("SELECT * FROM \"{table}\" ORDER BY date DESC")
            }
            JobSource::Table(table) => format!("SELECT * FROM \"{table}\""),
        }
    }

    /// The COUNT statement for the total-rows signal.
    pub(crate) fn count_sql(&self) -> String {
        match &self.source {
            JobSource::Query(sql) => format!("SELECT COUNT(*) FROM ({sql})"),
            JobSource::Table(table) => format!("SELECT COUNT(*) FROM \"{table}\""),
        }
    }
}

/// Cooperative cancellation handle, checked between batch fetches.
///
/// Cancelling is a one-way latch: once set, every clone observes it, and
/// the affected jobs terminate with a `Cancelled` event after the batch
/// they are currently fetching.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`CancelToken::cancel`] has been called on any clone.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
