//! Owned collections without a natural key: images and price tiers
//!
//! Both are owned by exactly one product or variant. The [`Owner`] type makes
//! the two foreign keys mutually exclusive, and [`TierValue`] does the same
//! for a tier's price and discount columns.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// The entity an image or price tier belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Product(i64),
    Variant(i64),
}

impl Owner {
    pub fn product_id(&self) -> Option<i64> {
        match self {
            Owner::Product(id) => Some(*id),
            Owner::Variant(_) => None,
        }
    }

    pub fn variant_id(&self) -> Option<i64> {
        match self {
            Owner::Variant(id) => Some(*id),
            Owner::Product(_) => None,
        }
    }
}

impl Serialize for Owner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Owner", 2)?;
        s.serialize_field("product_id", &self.product_id())?;
        s.serialize_field("variant_id", &self.variant_id())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductImage {
    #[serde(flatten)]
    pub owner: Owner,
    pub url: String,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub position: i64,
    pub is_featured: bool,
}

/// A tier's value: absolute unit price or percentage off, never both
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TierValue {
    Price(f64),
    DiscountPercent(f64),
}

impl Serialize for TierValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (price, discount) = match self {
            TierValue::Price(p) => (Some(*p), None),
            TierValue::DiscountPercent(d) => (None, Some(*d)),
        };
        let mut s = serializer.serialize_struct("TierValue", 2)?;
        s.serialize_field("price", &price)?;
        s.serialize_field("discount_percent", &discount)?;
        s.end()
    }
}

/// One graduated-pricing threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceTier {
    #[serde(flatten)]
    pub owner: Owner,
    pub min_quantity: i64,
    #[serde(flatten)]
    pub value: TierValue,
    pub position: i64,
}
