//! Core module - configuration, reporting, batching and shared utilities

pub mod batch;
pub mod config;
pub mod logging;
pub mod report;
pub mod slug;

pub use batch::BatchOptions;
pub use config::{Config, ConfigError};
pub use report::{ReportError, ReportWarning, RunReport, StageReport};
pub use slug::{slugify, SlugRegistry};
