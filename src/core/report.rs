//! Run report and per-stage accumulators
//!
//! Each pipeline stage builds its own [`StageReport`] and hands it back to the
//! orchestrator, which merges it into the [`RunReport`]. Nothing is shared
//! between stages except through those return values.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// An error recorded during a run (never fatal on its own)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportError {
    pub step: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A warning recorded during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWarning {
    pub step: String,
    pub message: String,
}

/// Accumulator returned by a single pipeline stage
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    pub counts: BTreeMap<String, usize>,
    pub errors: Vec<ReportError>,
    pub warnings: Vec<ReportWarning>,
}

impl StageReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` to the row count of `step`
    pub fn count(&mut self, step: &str, n: usize) {
        *self.counts.entry(step.to_string()).or_insert(0) += n;
    }

    pub fn error(&mut self, step: &str, message: impl Into<String>, detail: Option<String>) {
        let message = message.into();
        tracing::error!(step, detail = detail.as_deref().unwrap_or(""), "{}", message);
        self.errors.push(ReportError {
            step: step.to_string(),
            message,
            detail,
        });
    }

    pub fn warn(&mut self, step: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(step, "{}", message);
        self.warnings.push(ReportWarning {
            step: step.to_string(),
            message,
        });
    }

    pub fn count_of(&self, step: &str) -> usize {
        self.counts.get(step).copied().unwrap_or(0)
    }
}

/// The persisted artifact describing one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub source: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_sha256: Option<String>,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed_seconds: f64,
    pub skipped_rows: usize,
    pub counts: BTreeMap<String, usize>,
    pub errors: Vec<ReportError>,
    pub warnings: Vec<ReportWarning>,
}

impl RunReport {
    pub fn start(source: &Path, dry_run: bool) -> Self {
        Self {
            run_id: Ulid::new().to_string(),
            source: source.to_path_buf(),
            source_sha256: None,
            dry_run,
            started_at: Utc::now(),
            finished_at: None,
            elapsed_seconds: 0.0,
            skipped_rows: 0,
            counts: BTreeMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn merge(&mut self, stage: StageReport) {
        for (step, n) in stage.counts {
            *self.counts.entry(step).or_insert(0) += n;
        }
        self.errors.extend(stage.errors);
        self.warnings.extend(stage.warnings);
    }

    /// Stamp the finish time and elapsed seconds
    pub fn finish(&mut self) {
        let now = Utc::now();
        self.elapsed_seconds = (now - self.started_at).num_milliseconds() as f64 / 1000.0;
        self.finished_at = Some(now);
    }

    pub fn count_of(&self, step: &str) -> usize {
        self.counts.get(step).copied().unwrap_or(0)
    }

    /// Write the report as pretty JSON, creating parent directories as needed
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
    }
}
