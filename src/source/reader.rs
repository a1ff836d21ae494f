//! Source reader for the raw product export
//!
//! Rows with a wrong number of fields are kept (short rows read as blank
//! cells), invalid UTF-8 is replaced rather than rejected, and cell content
//! is never trimmed here so multi-line encoded values survive verbatim.

use std::fs;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord};
use sha2::{Digest, Sha256};

use super::columns::ColumnSchema;
use super::SourceError;

/// One data row of the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line number where the record starts (header is line 1)
    pub line: u64,
    cells: Vec<String>,
}

impl SourceRow {
    pub fn new(line: u64, cells: Vec<String>) -> Self {
        Self { line, cells }
    }

    pub fn get(&self, pos: usize) -> Option<&str> {
        self.cells.get(pos).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| c.trim().is_empty())
    }
}

/// A record the CSV parser could not recover
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    pub line: Option<u64>,
    pub message: String,
}

/// A loaded export: resolved header plus data rows
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub schema: ColumnSchema,
    pub rows: Vec<SourceRow>,
    pub malformed: Vec<MalformedRecord>,
    /// SHA-256 of the raw file bytes, hex encoded
    pub sha256: String,
}

/// Load an export from disk
pub fn read_source(path: &Path) -> Result<SourceTable, SourceError> {
    let bytes = fs::read(path).map_err(|e| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let sha256 = fingerprint(&bytes);
    let mut table = read_source_from(bytes.as_slice())?;
    table.sha256 = sha256;
    tracing::debug!(
        path = %path.display(),
        rows = table.rows.len(),
        malformed = table.malformed.len(),
        "source loaded"
    );
    Ok(table)
}

/// Load an export from any reader (the fingerprint is left empty)
pub fn read_source_from<R: Read>(input: R) -> Result<SourceTable, SourceError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);

    let header_bytes = rdr.byte_headers()?.clone();
    if header_bytes.is_empty() {
        return Err(SourceError::Empty);
    }
    let headers: StringRecord = header_bytes.iter().map(lossy).collect();
    let schema = ColumnSchema::from_headers(&headers)?;

    let mut rows = Vec::new();
    let mut malformed = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        match rdr.read_byte_record(&mut record) {
            Ok(true) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                let row = SourceRow::new(line, record.iter().map(lossy).collect());
                if !row.is_empty() {
                    rows.push(row);
                }
            }
            Ok(false) => break,
            Err(e) if e.is_io_error() => return Err(SourceError::Csv(e)),
            Err(e) => {
                let line = e.position().map(|p| p.line());
                tracing::warn!(?line, "skipping malformed record: {}", e);
                malformed.push(MalformedRecord {
                    line,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(SourceTable {
        schema,
        rows,
        malformed,
        sha256: String::new(),
    })
}

/// Hex SHA-256 of a byte slice
pub fn fingerprint(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn lossy(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}
