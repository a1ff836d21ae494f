//! Chunked writes and paginated reads against a [`CatalogStore`]
//!
//! Writes are split into fixed-size chunks; a failing chunk is recorded in the
//! stage report and the remaining chunks still run. Reads loop over
//! successive ranges until a short page comes back, because the store
//! truncates any single read to its row cap.

use std::collections::HashMap;

use serde::Serialize;

use crate::core::report::StageReport;
use crate::store::{row_i64, row_str, CatalogStore, OnConflict, Row, StoreError, Table};

pub const DEFAULT_CHUNK_SIZE: usize = 50;
pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_DELETE_CHUNK_SIZE: usize = 100;

/// Sizes used by the batch executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Rows per write call
    pub chunk_size: usize,
    /// Rows requested per ranged read
    pub page_size: usize,
    /// Ids per `IN` filter when deleting
    pub delete_chunk_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            delete_chunk_size: DEFAULT_DELETE_CHUNK_SIZE,
        }
    }
}

/// How a chunk is written
#[derive(Debug, Clone, Copy)]
pub enum WriteMode<'a> {
    Upsert {
        conflict: &'a [&'a str],
        on_conflict: OnConflict,
    },
    Insert,
}

impl<'a> WriteMode<'a> {
    pub fn upsert(conflict: &'a [&'a str]) -> Self {
        WriteMode::Upsert {
            conflict,
            on_conflict: OnConflict::Update,
        }
    }

    /// Duplicate-tolerant write: a repeated conflict key is skipped
    pub fn insert_ignore(conflict: &'a [&'a str]) -> Self {
        WriteMode::Upsert {
            conflict,
            on_conflict: OnConflict::Ignore,
        }
    }
}

/// Serialize records into store rows, keeping each row's record index
///
/// Records that fail to serialize are reported and left out.
pub fn to_rows<T: Serialize>(step: &str, records: &[T], report: &mut StageReport) -> (Vec<usize>, Vec<Row>) {
    let mut indices = Vec::with_capacity(records.len());
    let mut rows = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        match serde_json::to_value(record) {
            Ok(serde_json::Value::Object(map)) => {
                indices.push(idx);
                rows.push(map);
            }
            Ok(other) => report.error(
                step,
                "record did not serialize to a row",
                Some(format!("row {idx}: {other}")),
            ),
            Err(e) => report.error(step, format!("cannot serialize record: {e}"), Some(format!("row {idx}"))),
        }
    }
    (indices, rows)
}

/// Write `records` to `table` in chunks of `chunk_size`
///
/// Returns the number of rows in chunks the store accepted (rows skipped as
/// duplicates in ignore mode still count). Chunk failures are recorded with
/// the offending row range and never stop the loop.
pub fn write_chunked<S, T>(
    store: &mut S,
    step: &str,
    table: Table,
    records: &[T],
    mode: WriteMode<'_>,
    chunk_size: usize,
    report: &mut StageReport,
) -> usize
where
    S: CatalogStore + ?Sized,
    T: Serialize,
{
    write_chunked_accepted(store, step, table, records, mode, chunk_size, report).len()
}

/// Like [`write_chunked`], but returns the indices into `records` of every
/// record whose chunk the store accepted
pub fn write_chunked_accepted<S, T>(
    store: &mut S,
    step: &str,
    table: Table,
    records: &[T],
    mode: WriteMode<'_>,
    chunk_size: usize,
    report: &mut StageReport,
) -> Vec<usize>
where
    S: CatalogStore + ?Sized,
    T: Serialize,
{
    let (indices, rows) = to_rows(step, records, report);
    let chunk_size = chunk_size.max(1);
    let mut accepted = Vec::with_capacity(rows.len());

    for (chunk, chunk_indices) in rows.chunks(chunk_size).zip(indices.chunks(chunk_size)) {
        let (Some(start), Some(end)) = (chunk_indices.first(), chunk_indices.last()) else {
            continue;
        };
        let result = match mode {
            WriteMode::Upsert {
                conflict,
                on_conflict,
            } => store.upsert(table, chunk, conflict, on_conflict),
            WriteMode::Insert => store.insert(table, chunk),
        };
        match result {
            Ok(_) => accepted.extend_from_slice(chunk_indices),
            Err(e) => report.error(
                step,
                format!("write to {} failed: {}", table, e),
                Some(format!("rows {start}..={end}")),
            ),
        }
    }

    tracing::debug!(step, %table, written = accepted.len(), total = rows.len(), "chunked write finished");
    accepted
}

/// Delete every row of `table` whose `column` is in `ids`, in bounded batches
pub fn delete_chunked<S>(
    store: &mut S,
    step: &str,
    table: Table,
    column: &str,
    ids: &[i64],
    chunk_size: usize,
    report: &mut StageReport,
) -> usize
where
    S: CatalogStore + ?Sized,
{
    let chunk_size = chunk_size.max(1);
    let mut deleted = 0;
    for (chunk_idx, chunk) in ids.chunks(chunk_size).enumerate() {
        match store.delete_in(table, column, chunk) {
            Ok(n) => deleted += n,
            Err(e) => {
                let start = chunk_idx * chunk_size;
                report.error(
                    step,
                    format!("delete from {} failed: {}", table, e),
                    Some(format!("{column} ids {start}..={}", start + chunk.len() - 1)),
                )
            }
        }
    }
    deleted
}

/// Read every row of `table` by requesting successive ranges of `page_size`
///
/// Stops at the first page shorter than `page_size`. `page_size` must not
/// exceed the store's own row cap, or the first truncated page ends the read.
pub fn fetch_all<S>(
    store: &S,
    table: Table,
    columns: &[&str],
    page_size: usize,
) -> Result<Vec<Row>, StoreError>
where
    S: CatalogStore + ?Sized,
{
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut from = 0;
    loop {
        let page = store.select_range(table, columns, from, from + page_size - 1)?;
        let got = page.len();
        all.extend(page);
        if got < page_size {
            break;
        }
        from += page_size;
    }
    Ok(all)
}

/// Map a text key column to the row id, e.g. `sku -> id`
pub fn fetch_id_map<S>(
    store: &S,
    table: Table,
    key: &str,
    page_size: usize,
) -> Result<HashMap<String, i64>, StoreError>
where
    S: CatalogStore + ?Sized,
{
    Ok(fetch_all(store, table, &["id", key], page_size)?
        .iter()
        .filter_map(|row| Some((row_str(row, key)?.to_string(), row_i64(row, "id")?)))
        .collect())
}
