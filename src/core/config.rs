//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::batch::{BatchOptions, DEFAULT_CHUNK_SIZE, DEFAULT_DELETE_CHUNK_SIZE, DEFAULT_PAGE_SIZE};
use crate::store::DEFAULT_MAX_ROWS;

/// Project-level config file, looked up in the working directory
pub const PROJECT_CONFIG_FILE: &str = "catload.yaml";

/// Default location of the run report
pub const DEFAULT_REPORT_PATH: &str = "import-report.json";

pub const ENV_DATABASE: &str = "CATLOAD_DATABASE";
pub const ENV_SERVICE_KEY: &str = "CATLOAD_SERVICE_KEY";
pub const ENV_REPORT: &str = "CATLOAD_REPORT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {message}")]
    Parse { path: String, message: String },
}

/// catload configuration with layered hierarchy
///
/// Every field is optional in a file; unset fields fall through to the next
/// lower layer and finally to the built-in defaults.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the catalogue database
    pub database: Option<PathBuf>,

    /// Elevated credential allowing schema creation and migration
    pub service_key: Option<String>,

    /// Where the run report is written
    pub report_path: Option<PathBuf>,

    /// Rows per write call
    pub chunk_size: Option<usize>,

    /// Rows requested per ranged read
    pub page_size: Option<usize>,

    /// Ids per batched delete
    pub delete_chunk_size: Option<usize>,

    /// Per-request row cap enforced by the store
    pub max_rows: Option<usize>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_layers(
            Self::global_config_path().as_deref(),
            Some(Path::new(PROJECT_CONFIG_FILE)),
        )?;
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge the global and project files (missing files are skipped)
    pub fn load_layers(global: Option<&Path>, project: Option<&Path>) -> Result<Self, ConfigError> {
        // 1. Built-in defaults (resolved by the accessors)
        let mut config = Config::default();

        // 2. Global user config (~/.config/catload/config.yaml)
        // 3. Project config (./catload.yaml)
        for path in [global, project].into_iter().flatten() {
            if let Some(layer) = Self::read_file(path)? {
                tracing::debug!(path = %path.display(), "loaded config layer");
                config.merge(layer);
            }
        }

        Ok(config)
    }

    /// Apply environment overrides through `lookup` (tests pass a map)
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(database) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            self.database = Some(PathBuf::from(database));
        }
        if let Some(key) = lookup(ENV_SERVICE_KEY).filter(|v| !v.is_empty()) {
            self.service_key = Some(key);
        }
        if let Some(report) = lookup(ENV_REPORT).filter(|v| !v.is_empty()) {
            self.report_path = Some(PathBuf::from(report));
        }
    }

    fn read_file(path: &Path) -> Result<Option<Config>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_yml::from_str::<Config>(&contents)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "catload")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.service_key.is_some() {
            self.service_key = other.service_key;
        }
        if other.report_path.is_some() {
            self.report_path = other.report_path;
        }
        if other.chunk_size.is_some() {
            self.chunk_size = other.chunk_size;
        }
        if other.page_size.is_some() {
            self.page_size = other.page_size;
        }
        if other.delete_chunk_size.is_some() {
            self.delete_chunk_size = other.delete_chunk_size;
        }
        if other.max_rows.is_some() {
            self.max_rows = other.max_rows;
        }
    }

    pub fn database(&self) -> Option<&Path> {
        self.database.as_deref()
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH))
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_ROWS)
    }

    /// Batch sizes, zero values replaced by defaults
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            chunk_size: self.chunk_size.filter(|n| *n > 0).unwrap_or(DEFAULT_CHUNK_SIZE),
            page_size: self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE),
            delete_chunk_size: self
                .delete_chunk_size
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_DELETE_CHUNK_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.report_path(), PathBuf::from("import-report.json"));
        assert_eq!(config.max_rows(), 1000);
        assert_eq!(config.batch_options(), BatchOptions::default());
        assert_eq!(config.database(), None);
    }

    #[test]
    fn test_project_layer_overrides_global() {
        let dir = tempdir().unwrap();
        let global = dir.path().join("global.yaml");
        let project = dir.path().join("catload.yaml");
        std::fs::write(&global, "database: /srv/global.db\nchunk_size: 10\nmax_rows: 500\n").unwrap();
        std::fs::write(&project, "database: ./local.db\npage_size: 200\n").unwrap();

        let config = Config::load_layers(Some(&global), Some(&project)).unwrap();
        assert_eq!(config.database(), Some(Path::new("./local.db")));
        assert_eq!(config.max_rows(), 500);
        let batch = config.batch_options();
        assert_eq!(batch.chunk_size, 10);
        assert_eq!(batch.page_size, 200);
        assert_eq!(batch.delete_chunk_size, 100);
    }

    #[test]
    fn test_missing_and_empty_layers_are_skipped() {
        let dir = tempdir().unwrap();
        let empty = dir.path().join("empty.yaml");
        std::fs::write(&empty, "\n").unwrap();
        let config = Config::load_layers(Some(&dir.path().join("nope.yaml")), Some(&empty)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_layer_is_an_error() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("catload.yaml");
        std::fs::write(&bad, "chunk_size: lots\n").unwrap();
        let err = Config::load_layers(None, Some(&bad)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        std::fs::write(&bad, "databse: typo.db\n").unwrap();
        assert!(Config::load_layers(None, Some(&bad)).is_err());
    }

    #[test]
    fn test_env_overrides_files() {
        let mut config = Config {
            database: Some(PathBuf::from("file.db")),
            ..Config::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DATABASE, "env.db"),
            (ENV_SERVICE_KEY, "s3cret"),
            (ENV_REPORT, ""),
        ]);
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database(), Some(Path::new("env.db")));
        assert_eq!(config.service_key.as_deref(), Some("s3cret"));
        assert_eq!(config.report_path(), PathBuf::from(DEFAULT_REPORT_PATH));
    }

    #[test]
    fn test_zero_sizes_fall_back_to_defaults() {
        let config = Config {
            chunk_size: Some(0),
            max_rows: Some(0),
            ..Config::default()
        };
        assert_eq!(config.batch_options().chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_rows(), DEFAULT_MAX_ROWS);
    }
}
