//! Field decoders for the compound-encoded cells of a catalogue export
//!
//! Every decoder is pure. Structural failures come back as [`FieldError`];
//! callers treat the cell's contribution as empty and record a warning.

pub mod attribute;
pub mod category_path;
pub mod images;
pub mod price_tiers;
pub mod scalar;

use thiserror::Error;

/// A compound cell that failed its decoder's structural expectations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("price tier table is not valid JSON: {0}")]
    TierTableJson(String),

    #[error("price tier table is a JSON {0}, expected an array")]
    TierTableShape(&'static str),
}
