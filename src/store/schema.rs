//! Database schema initialization

use rusqlite::{params, OptionalExtension};
use rust_embed::Embed;

use super::sqlite::SqliteStore;
use super::StoreError;

#[derive(Embed)]
#[folder = "sql/"]
struct EmbeddedMigrations;

/// Migration files sorted by their numeric prefix (`001_catalogue.sql` -> 1)
fn migrations() -> Vec<(i32, String)> {
    let mut found: Vec<(i32, String)> = EmbeddedMigrations::iter()
        .filter_map(|name| {
            let version = name.split('_').next()?.parse::<i32>().ok()?;
            let file = EmbeddedMigrations::get(name.as_ref())?;
            let sql = std::str::from_utf8(&file.data).ok()?.to_string();
            Some((version, sql))
        })
        .collect();
    found.sort_by_key(|(version, _)| *version);
    found
}

impl SqliteStore {
    /// Apply every embedded migration newer than the recorded schema version
    pub(super) fn apply_migrations(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);",
        )?;
        let current = self.schema_version()?.unwrap_or(0);

        for (version, sql) in migrations() {
            if version <= current {
                continue;
            }
            let tx = self.conn.transaction()?;
            tx.execute_batch(&sql)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![version],
            )?;
            tx.commit()?;
            tracing::debug!(version, "applied catalogue migration");
        }
        Ok(())
    }

    /// Highest applied migration, `None` when the store was never initialized
    pub(super) fn schema_version(&self) -> Result<Option<i32>, StoreError> {
        let has_table: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if has_table.is_none() {
            return Ok(None);
        }
        let version: Option<i32> =
            self.conn
                .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                    row.get(0)
                })?;
        Ok(version)
    }

    pub(super) fn meta_value(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM store_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(super) fn set_meta_value(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO store_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded_in_order() {
        let list = migrations();
        assert!(!list.is_empty());
        assert_eq!(list[0].0, 1);
        assert!(list[0].1.contains("CREATE TABLE IF NOT EXISTS products"));
        assert!(list.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
