//! catload: catalogue loader
//!
//! Normalizes a wide, denormalized product export (one row per product or
//! variant) into a relational catalogue: categories, attributes and terms,
//! products, variants, pivot tables, images and graduated-price tiers.
//! Re-running on the same export leaves the catalogue unchanged.

pub mod cli;
pub mod core;
pub mod decode;
pub mod entities;
pub mod pipeline;
pub mod source;
pub mod store;
