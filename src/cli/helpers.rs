//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use miette::Result;
use std::path::PathBuf;

use crate::core::Config;
use crate::store::{CatalogStore, SqliteStore, StoreCredentials};

/// Load layered configuration, then apply command-line overrides on top
pub fn load_config(overrides: Config) -> Result<Config> {
    let mut config = Config::load().map_err(|e| miette::miette!("{}", e))?;
    config.merge(overrides);
    Ok(config)
}

/// Database path from the merged configuration
pub fn require_database(config: &Config) -> Result<PathBuf> {
    config.database().map(PathBuf::from).ok_or_else(|| {
        miette::miette!(
            help = "pass --database <PATH>, set CATLOAD_DATABASE, or add `database:` to catload.yaml",
            "no catalogue database configured"
        )
    })
}

/// Open the store and prove it is reachable
///
/// Any failure here is the fatal connectivity condition: nothing has been
/// written yet and the command must exit non-zero.
pub fn connect_checked(credentials: &StoreCredentials, max_rows: usize) -> Result<SqliteStore> {
    let store = SqliteStore::connect(credentials, max_rows)
        .map_err(|e| miette::miette!("connectivity check failed: {}", e))?;
    store
        .ping()
        .map_err(|e| miette::miette!("connectivity check failed: {}", e))?;
    tracing::debug!(location = store.location(), role = ?store.role(), "store reachable");
    Ok(store)
}

/// Truncate a string to `max_chars` characters, adding "..." if truncated
///
/// Useful for console lines that echo report messages.
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// "1 warning" / "3 warnings"
pub fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{} {}", n, noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("été été été", 6), "été...");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "warning"), "1 warning");
        assert_eq!(plural(0, "error"), "0 errors");
    }

    #[test]
    fn test_require_database() {
        assert!(require_database(&Config::default()).is_err());
        let config = Config {
            database: Some(PathBuf::from("catalogue.db")),
            ..Config::default()
        };
        assert_eq!(require_database(&config).unwrap(), PathBuf::from("catalogue.db"));
    }
}
