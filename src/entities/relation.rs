//! Join entities linking products and variants to categories and attributes
//!
//! All three are written duplicate-tolerantly on their natural pair.

use serde::{Deserialize, Serialize};

/// (product, category) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductCategory {
    pub product_id: i64,
    pub category_id: i64,
}

/// (product, attribute) pair with the product's terms on that axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub product_id: i64,
    pub attribute_id: i64,
    pub term_slugs: Vec<String>,
    pub is_visible: bool,
    /// The axis is used to distinguish variants
    pub is_variation: bool,
    pub default_term: Option<String>,
    pub position: i64,
}

/// (variant, attribute) pair carrying the variant's single value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAttribute {
    pub variant_id: i64,
    pub attribute_id: i64,
    pub term_slug: String,
}

/// Natural keys used as conflict targets
pub const PRODUCT_CATEGORY_KEY: &[&str] = &["product_id", "category_id"];
pub const PRODUCT_ATTRIBUTE_KEY: &[&str] = &["product_id", "attribute_id"];
pub const VARIANT_ATTRIBUTE_KEY: &[&str] = &["variant_id", "attribute_id"];
