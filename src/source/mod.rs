//! Loading and classifying the product export

pub mod classify;
pub mod columns;
pub mod reader;

pub use classify::{classify, Classified};
pub use columns::{AttributeAxis, Column, ColumnSchema};
pub use reader::{read_source, read_source_from, SourceRow, SourceTable};

use thiserror::Error;

/// Errors that stop an export from loading at all
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("export has no header row")]
    Empty,

    #[error("export is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}
