//! Command implementations

pub mod completions;
pub mod counts;
pub mod import;
pub mod template;
