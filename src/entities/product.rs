//! Product entity - a top-level catalogue item, upserted on its SKU

use serde::{Deserialize, Serialize};

/// Product type tag from the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
    Variable,
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductType::Simple => write!(f, "simple"),
            ProductType::Variable => write!(f, "variable"),
        }
    }
}

impl std::str::FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Ok(ProductType::Simple),
            "variable" => Ok(ProductType::Variable),
            _ => Err(format!(
                "Invalid product type: {}. Use 'simple' or 'variable'",
                s
            )),
        }
    }
}

/// How graduated-pricing tiers express their value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    /// Each tier carries an absolute unit price
    #[default]
    Fixed,
    /// Each tier carries a discount percentage off the base price
    Percentage,
}

impl PricingMode {
    /// Lenient parse used for export cells; anything unrecognized is `Fixed`
    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "percentage" || s == "percent" || s == "%" => PricingMode::Percentage,
            _ => PricingMode::Fixed,
        }
    }
}

impl std::fmt::Display for PricingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingMode::Fixed => write!(f, "fixed"),
            PricingMode::Percentage => write!(f, "percentage"),
        }
    }
}

/// A product row as written to the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub product_type: ProductType,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub manage_stock: bool,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub position: i64,
    pub supplier_name: Option<String>,
    pub supplier_ref: Option<String>,
    pub eco_fee: Option<f64>,

    // Graduated pricing configuration
    pub pbq_enabled: bool,
    pub pbq_pricing_mode: PricingMode,
    pub pbq_min_quantity: Option<i64>,
    pub pbq_max_quantity: Option<i64>,

    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_parse() {
        assert_eq!("simple".parse::<ProductType>().unwrap(), ProductType::Simple);
        assert_eq!(" Variable ".parse::<ProductType>().unwrap(), ProductType::Variable);
        assert!("grouped".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_pricing_mode_from_cell() {
        assert_eq!(PricingMode::from_cell(Some("percentage")), PricingMode::Percentage);
        assert_eq!(PricingMode::from_cell(Some(" Percent ")), PricingMode::Percentage);
        assert_eq!(PricingMode::from_cell(Some("fixed")), PricingMode::Fixed);
        assert_eq!(PricingMode::from_cell(None), PricingMode::Fixed);
    }

    #[test]
    fn test_product_type_serializes_lowercase() {
        let json = serde_json::to_value(ProductType::Variable).unwrap();
        assert_eq!(json, serde_json::json!("variable"));
    }
}
