//! SQLite-backed catalogue store
//!
//! Behaves like a hosted row store with a per-request result cap: ranged
//! reads never return more than `max_rows` rows, whatever range was asked
//! for. Each write call is atomic, so a failed batch leaves nothing behind.

use std::path::PathBuf;

use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use super::{check_column, CatalogStore, OnConflict, Row, StoreError, Table};

/// Default per-request row cap, matching common hosted row stores
pub const DEFAULT_MAX_ROWS: usize = 1000;

const SERVICE_KEY_META: &str = "service_key_sha256";

/// Which privilege level a connection was opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRole {
    /// Elevated: may create the database and migrate its schema
    Service,
    /// Built-in low-privilege default: read/write on an existing schema only
    Anonymous,
}

/// Connection credentials for the catalogue store
#[derive(Debug, Clone)]
pub struct StoreCredentials {
    pub database: PathBuf,
    pub service_key: Option<String>,
}

impl StoreCredentials {
    pub fn new(database: impl Into<PathBuf>, service_key: Option<String>) -> Self {
        Self {
            database: database.into(),
            service_key: service_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn role(&self) -> AccessRole {
        if self.service_key.is_some() {
            AccessRole::Service
        } else {
            AccessRole::Anonymous
        }
    }
}

/// The catalogue store backed by SQLite
pub struct SqliteStore {
    pub(super) conn: Connection,
    location: String,
    role: AccessRole,
    max_rows: usize,
}

impl SqliteStore {
    /// Open the store described by `credentials`
    ///
    /// A service key allows creating the file and applying migrations; the
    /// first key used against a fresh store is recorded (hashed) and every
    /// later service connection must present the same key. Without a key the
    /// store must already exist and be initialized.
    pub fn connect(credentials: &StoreCredentials, max_rows: usize) -> Result<Self, StoreError> {
        let location = credentials.database.display().to_string();
        let role = credentials.role();

        let conn = match role {
            AccessRole::Service => Connection::open(&credentials.database),
            AccessRole::Anonymous => Connection::open_with_flags(
                &credentials.database,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            ),
        }
        .map_err(|e| StoreError::Connect {
            location: location.clone(),
            reason: e.to_string(),
        })?;

        // WAL keeps readers unblocked while an import runs
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let mut store = Self {
            conn,
            location,
            role,
            max_rows: max_rows.max(1),
        };

        if let (AccessRole::Service, Some(key)) = (role, credentials.service_key.as_deref()) {
            store.apply_migrations()?;
            store.verify_service_key(key)?;
        }

        Ok(store)
    }

    /// A fresh, fully initialized in-memory store (dry runs and tests)
    pub fn in_memory(max_rows: usize) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut store = Self {
            conn,
            location: ":memory:".to_string(),
            role: AccessRole::Service,
            max_rows: max_rows.max(1),
        };
        store.apply_migrations()?;
        Ok(store)
    }

    pub fn role(&self) -> AccessRole {
        self.role
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    fn verify_service_key(&self, key: &str) -> Result<(), StoreError> {
        let digest = format!("{:x}", Sha256::digest(key.as_bytes()));
        match self.meta_value(SERVICE_KEY_META)? {
            Some(recorded) if recorded != digest => Err(StoreError::Connect {
                location: self.location.clone(),
                reason: "service key rejected".to_string(),
            }),
            Some(_) => Ok(()),
            None => self.set_meta_value(SERVICE_KEY_META, &digest),
        }
    }

    /// Column list shared by every row of a batch, in first-row order
    fn batch_columns(rows: &[Row]) -> Result<Vec<String>, StoreError> {
        let mut columns: Vec<String> = Vec::new();
        for row in rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(check_column(key)?.to_string());
                }
            }
        }
        if columns.is_empty() {
            return Err(StoreError::EmptyRow);
        }
        Ok(columns)
    }

    fn write_rows(&mut self, sql: &str, columns: &[String], rows: &[Row]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(sql)?;
            for row in rows {
                let values = columns
                    .iter()
                    .map(|c| json_to_sql(row.get(c).unwrap_or(&Value::Null)));
                written += stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(written)
    }
}

impl CatalogStore for SqliteStore {
    fn ping(&self) -> Result<(), StoreError> {
        match self.schema_version()? {
            Some(_) => {
                self.conn
                    .query_row("SELECT COUNT(*) FROM products LIMIT 1", [], |row| {
                        row.get::<_, i64>(0)
                    })?;
                Ok(())
            }
            None => Err(StoreError::SchemaMissing(self.location.clone())),
        }
    }

    fn upsert(
        &mut self,
        table: Table,
        rows: &[Row],
        conflict_columns: &[&str],
        mode: OnConflict,
    ) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let columns = Self::batch_columns(rows)?;
        let conflict: Vec<&str> = conflict_columns
            .iter()
            .map(|c| check_column(c))
            .collect::<Result<_, _>>()?;

        let placeholders = vec!["?"; columns.len()].join(", ");
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT({})",
            table,
            columns.join(", "),
            placeholders,
            conflict.join(", ")
        );
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !conflict.contains(&c.as_str()))
            .map(|c| format!("{c} = excluded.{c}"))
            .collect();
        if mode == OnConflict::Ignore || updates.is_empty() {
            sql.push_str(" DO NOTHING");
        } else {
            sql.push_str(" DO UPDATE SET ");
            sql.push_str(&updates.join(", "));
        }

        self.write_rows(&sql, &columns, rows)
    }

    fn insert(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let columns = Self::batch_columns(rows)?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        self.write_rows(&sql, &columns, rows)
    }

    fn delete_in(
        &mut self,
        table: Table,
        column: &str,
        values: &[i64],
    ) -> Result<usize, StoreError> {
        if values.is_empty() {
            return Ok(0);
        }
        let column = check_column(column)?;
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            table,
            column,
            vec!["?"; values.len()].join(", ")
        );
        Ok(self.conn.execute(&sql, params_from_iter(values.iter()))?)
    }

    fn select_range(
        &self,
        table: Table,
        columns: &[&str],
        from: usize,
        to: usize,
    ) -> Result<Vec<Row>, StoreError> {
        if to < from {
            return Ok(Vec::new());
        }
        let columns: Vec<&str> = columns
            .iter()
            .map(|c| check_column(c))
            .collect::<Result<_, _>>()?;
        let limit = (to - from + 1).min(self.max_rows);

        let sql = format!(
            "SELECT {} FROM {} ORDER BY id LIMIT ?1 OFFSET ?2",
            columns.join(", "),
            table
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([limit as i64, from as i64], |row| {
            let mut out = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                out.insert(name.to_string(), sql_to_json(row.get_ref(idx)?));
            }
            Ok(out)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn count(&self, table: Table) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?;
        Ok(n as usize)
    }
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::Number(i.into()),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
    }
}
