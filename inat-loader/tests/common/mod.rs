//! Shared test helpers for loader tests.

#![allow(dead_code)]

use inat_loader::{EventReceiver, LoadEvent};
use rusqlite::{Connection, params};
use std::path::Path;

/// Creates an `items` table with `n` rows (ids 1..=n) at the given path.
pub fn seed_items(path: &Path, n: usize) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE items (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            price REAL NOT NULL
        );",
    )
    .unwrap();
    for i in 1..=n {
        conn.execute(
            "INSERT INTO items (id, name, price) VALUES (?1, ?2, ?3)",
            params![i as i64, format!("item-{i}"), i as f64 * 1.5],
        )
        .unwrap();
    }
}

/// Creates a `postings` ledger table with the given (date, amount) rows.
pub fn seed_postings(path: &Path, rows: &[(&str, f64)]) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE postings (
            id INTEGER PRIMARY KEY,
            date TEXT NOT NULL,
            amount REAL NOT NULL
        );",
    )
    .unwrap();
    for (date, amount) in rows {
        conn.execute(
            "INSERT INTO postings (date, amount) VALUES (?1, ?2)",
            params![date, amount],
        )
        .unwrap();
    }
}

/// Drains every buffered event after the job has terminated.
pub fn drain(mut rx: EventReceiver) -> Vec<LoadEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// The `id` column of every emitted row, in emission order.
pub fn emitted_ids(events: &[LoadEvent]) -> Vec<i64> {
    events
        .iter()
        .filter_map(|e| match e {
            LoadEvent::ChunkReady { rows, .. } => Some(rows),
            _ => None,
        })
        .flatten()
        .map(|row| row.get("id").and_then(|v| v.as_i64()).unwrap())
        .collect()
}

/// The sizes of all emitted batches, in emission order.
pub fn batch_sizes(events: &[LoadEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            LoadEvent::ChunkReady { rows, .. } => Some(rows.len()),
            _ => None,
        })
        .collect()
}

/// The reported total, panicking if `TotalRows` was not the first event.
pub fn reported_total(events: &[LoadEvent]) -> i64 {
    match events.first() {
        Some(LoadEvent::TotalRows { total, .. }) => *total,
        other => panic!("expected TotalRows first, got {other:?}"),
    }
}
