//! Pivot builders: product-category, product-attribute, variant-attribute
//!
//! All pivot writes ignore rows whose pair already exists.

use std::collections::HashMap;

use crate::core::batch::{write_chunked, BatchOptions, WriteMode};
use crate::core::report::StageReport;
use crate::core::slug::slugify;
use crate::decode::attribute::{parse_flags, split_multi};
use crate::decode::category_path;
use crate::entities::relation::{PRODUCT_ATTRIBUTE_KEY, PRODUCT_CATEGORY_KEY, VARIANT_ATTRIBUTE_KEY};
use crate::entities::{ProductAttribute, ProductCategory, VariantAttribute};
use crate::source::{Column, ColumnSchema};
use crate::store::{CatalogStore, Table};

use super::products::PersistedProduct;
use super::variants::PersistedVariant;

pub const PRODUCT_CATEGORIES_STEP: &str = "product_categories";
pub const PRODUCT_ATTRIBUTES_STEP: &str = "product_attributes";
pub const VARIANT_ATTRIBUTES_STEP: &str = "variant_attributes";

/// Link each product to every category named anywhere on its paths
pub fn link_categories<S>(
    store: &mut S,
    schema: &ColumnSchema,
    products: &[PersistedProduct<'_>],
    categories: &HashMap<String, i64>,
    options: &BatchOptions,
) -> StageReport
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    let mut links: Vec<ProductCategory> = Vec::new();

    for product in products {
        let mut linked: Vec<i64> = Vec::new();
        for slug in category_path::slugs(schema.cell(product.row, Column::Categories)) {
            // dropped categories were already reported by the resolver
            let Some(&category_id) = categories.get(&slug) else {
                continue;
            };
            if !linked.contains(&category_id) {
                linked.push(category_id);
                links.push(ProductCategory {
                    product_id: product.id,
                    category_id,
                });
            }
        }
    }

    let written = write_chunked(
        store,
        PRODUCT_CATEGORIES_STEP,
        Table::ProductCategories,
        &links,
        WriteMode::insert_ignore(PRODUCT_CATEGORY_KEY),
        options.chunk_size,
        &mut report,
    );
    report.count(PRODUCT_CATEGORIES_STEP, written);
    report
}

/// One pivot row per (product, attribute) axis carrying values
pub fn link_product_attributes<S>(
    store: &mut S,
    schema: &ColumnSchema,
    products: &[PersistedProduct<'_>],
    attributes: &HashMap<String, i64>,
    options: &BatchOptions,
) -> StageReport
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    let mut links: Vec<ProductAttribute> = Vec::new();

    for product in products {
        for (axis_idx, axis) in schema.axes().iter().enumerate() {
            let Some(&attribute_id) = attributes.get(&axis.slug) else {
                continue;
            };
            let mut term_slugs: Vec<String> = Vec::new();
            for value in split_multi(schema.axis_cell(product.row, axis.values)) {
                let slug = slugify(&value);
                if !slug.is_empty() && !term_slugs.contains(&slug) {
                    term_slugs.push(slug);
                }
            }
            if term_slugs.is_empty() {
                continue;
            }

            let flags = parse_flags(schema.axis_cell(product.row, axis.data));
            let default_term = schema
                .axis_cell(product.row, axis.default)
                .map(slugify)
                .filter(|s| !s.is_empty());
            links.push(ProductAttribute {
                product_id: product.id,
                attribute_id,
                term_slugs,
                is_visible: flags.visible,
                is_variation: flags.variation,
                default_term,
                position: flags.position.unwrap_or(axis_idx as i64),
            });
        }
    }

    let written = write_chunked(
        store,
        PRODUCT_ATTRIBUTES_STEP,
        Table::ProductAttributes,
        &links,
        WriteMode::insert_ignore(PRODUCT_ATTRIBUTE_KEY),
        options.chunk_size,
        &mut report,
    );
    report.count(PRODUCT_ATTRIBUTES_STEP, written);
    report
}

/// One pivot row per (variant, attribute) carrying the variant's own term
pub fn link_variant_attributes<S>(
    store: &mut S,
    schema: &ColumnSchema,
    variants: &[PersistedVariant<'_>],
    attributes: &HashMap<String, i64>,
    options: &BatchOptions,
) -> StageReport
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    let mut links: Vec<VariantAttribute> = Vec::new();

    for variant in variants {
        let Some(row) = variant.row else {
            continue;
        };
        for axis in schema.axes() {
            let Some(&attribute_id) = attributes.get(&axis.slug) else {
                continue;
            };
            let Some(term_slug) = schema
                .axis_cell(row, axis.variant)
                .map(slugify)
                .filter(|s| !s.is_empty())
            else {
                continue;
            };
            links.push(VariantAttribute {
                variant_id: variant.id,
                attribute_id,
                term_slug,
            });
        }
    }

    let written = write_chunked(
        store,
        VARIANT_ATTRIBUTES_STEP,
        Table::VariantAttributes,
        &links,
        WriteMode::insert_ignore(VARIANT_ATTRIBUTE_KEY),
        options.chunk_size,
        &mut report,
    );
    report.count(VARIANT_ATTRIBUTES_STEP, written);
    report
}
