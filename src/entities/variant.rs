//! Variant entity - a purchasable form of a product, upserted on its SKU

use serde::{Deserialize, Serialize};

/// Name given to the synthetic variant of a simple product
pub const DEFAULT_VARIANT_NAME: &str = "Default";

/// SKU of the synthetic variant of a simple product
pub fn default_variant_sku(product_sku: &str) -> String {
    format!("{}-default", product_sku)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub sku: String,
    pub product_id: i64,
    pub name: String,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub min_order_quantity: Option<i64>,
    pub position: i64,
    pub is_default: bool,
}
