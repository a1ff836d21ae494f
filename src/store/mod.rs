//! Backing store interface for the normalized catalogue
//!
//! The pipeline talks to the store exclusively through [`CatalogStore`]:
//! row-oriented upserts, inserts, `IN`-filtered deletes and ranged reads.
//! Rows travel as JSON objects keyed by column name, which is how the
//! entity records in [`crate::entities`] serialize.

mod schema;
mod sqlite;

pub use sqlite::{AccessRole, SqliteStore, StoreCredentials, DEFAULT_MAX_ROWS};

use serde_json::{Map, Value};
use thiserror::Error;

/// One row, keyed by column name
pub type Row = Map<String, Value>;

/// Tables of the normalized catalogue schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Categories,
    Attributes,
    AttributeTerms,
    Products,
    Variants,
    ProductCategories,
    ProductAttributes,
    VariantAttributes,
    ProductImages,
    PriceTiers,
}

impl Table {
    pub const ALL: [Table; 10] = [
        Table::Categories,
        Table::Attributes,
        Table::AttributeTerms,
        Table::Products,
        Table::Variants,
        Table::ProductCategories,
        Table::ProductAttributes,
        Table::VariantAttributes,
        Table::ProductImages,
        Table::PriceTiers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Categories => "categories",
            Table::Attributes => "attributes",
            Table::AttributeTerms => "attribute_terms",
            Table::Products => "products",
            Table::Variants => "variants",
            Table::ProductCategories => "product_categories",
            Table::ProductAttributes => "product_attributes",
            Table::VariantAttributes => "variant_attributes",
            Table::ProductImages => "product_images",
            Table::PriceTiers => "price_tiers",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an upsert treats a row whose conflict key already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
    /// Overwrite the non-key columns of the existing row
    Update,
    /// Leave the existing row untouched
    Ignore,
}

/// Errors raised by a store implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot connect to catalogue store at {location}: {reason}")]
    Connect { location: String, reason: String },

    #[error("catalogue store at {0} has no schema; supply a service key to initialize it")]
    SchemaMissing(String),

    #[error("invalid column name '{0}'")]
    InvalidColumn(String),

    #[error("row has no columns")]
    EmptyRow,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// The operations the import pipeline needs from a catalogue store
pub trait CatalogStore {
    /// Cheap round trip proving the store is reachable and initialized
    fn ping(&self) -> Result<(), StoreError>;

    /// Insert rows, resolving conflicts on `conflict_columns` per `mode`
    fn upsert(
        &mut self,
        table: Table,
        rows: &[Row],
        conflict_columns: &[&str],
        mode: OnConflict,
    ) -> Result<usize, StoreError>;

    /// Plain insert; any constraint violation fails the whole call
    fn insert(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError>;

    /// Delete rows whose `column` is one of `values`
    fn delete_in(&mut self, table: Table, column: &str, values: &[i64])
        -> Result<usize, StoreError>;

    /// Read rows `from..=to` ordered by id
    ///
    /// Implementations may silently return fewer rows than requested when the
    /// range exceeds their per-request cap.
    fn select_range(
        &self,
        table: Table,
        columns: &[&str],
        from: usize,
        to: usize,
    ) -> Result<Vec<Row>, StoreError>;

    /// Total number of rows in `table`
    fn count(&self, table: Table) -> Result<usize, StoreError>;
}

/// Reject anything that is not a plain snake_case identifier
pub(crate) fn check_column(name: &str) -> Result<&str, StoreError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidColumn(name.to_string()))
    }
}

/// Read an integer column from a row returned by the store
pub fn row_i64(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}

/// Read a text column from a row returned by the store
pub fn row_str<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_column() {
        assert!(check_column("product_id").is_ok());
        assert!(check_column("min_quantity").is_ok());
        assert!(check_column("").is_err());
        assert!(check_column("id; DROP TABLE products").is_err());
        assert!(check_column("1abc").is_err());
        assert!(check_column("Name").is_err());
    }

    #[test]
    fn test_table_names_unique() {
        let mut names: Vec<_> = Table::ALL.iter().map(|t| t.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Table::ALL.len());
    }
}
