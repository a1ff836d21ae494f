//! Entity type definitions
//!
//! Records of the normalized catalogue, serialized one-to-one into store rows:
//!
//! **Taxonomy:** [`Category`], [`Attribute`], [`AttributeTerm`]
//!
//! **Catalogue:** [`Product`], [`Variant`]
//!
//! **Joins:** [`ProductCategory`], [`ProductAttribute`], [`VariantAttribute`]
//!
//! **Owned collections:** [`ProductImage`], [`PriceTier`]

pub mod attribute;
pub mod category;
pub mod media;
pub mod product;
pub mod relation;
pub mod variant;

pub use attribute::{Attribute, AttributeTerm};
pub use category::Category;
pub use media::{Owner, PriceTier, ProductImage, TierValue};
pub use product::{PricingMode, Product, ProductType};
pub use relation::{ProductAttribute, ProductCategory, VariantAttribute};
pub use variant::Variant;
