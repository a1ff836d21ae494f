//! Derived collections without a natural key: images and price tiers
//!
//! Each run deletes every image and tier owned by the products and variants
//! it touched, then inserts fresh rows. Two overlapping runs against the same
//! store can interleave those steps, so a single writer is assumed.

use std::collections::HashMap;

use crate::core::batch::{delete_chunked, fetch_all, write_chunked, BatchOptions, WriteMode};
use crate::core::report::StageReport;
use crate::decode::images::parse_images;
use crate::decode::price_tiers::parse_tier_table;
use crate::entities::{Owner, PriceTier, PricingMode, ProductImage, TierValue};
use crate::source::{Column, ColumnSchema, SourceRow};
use crate::store::{row_i64, row_str, CatalogStore, Table};

use super::products::PersistedProduct;
use super::variants::PersistedVariant;

pub const IMAGES_STEP: &str = "product_images";
pub const TIERS_STEP: &str = "price_tiers";

/// Every owner touched by this run, for scoping the deletes
fn owner_ids(products: &[PersistedProduct<'_>], variants: &[PersistedVariant<'_>]) -> (Vec<i64>, Vec<i64>) {
    (
        products.iter().map(|p| p.id).collect(),
        variants.iter().map(|v| v.id).collect(),
    )
}

/// Rows that carry their own collections: parent rows and child rows
fn sources<'a>(
    products: &'a [PersistedProduct<'a>],
    variants: &'a [PersistedVariant<'a>],
) -> impl Iterator<Item = (Owner, &'a str, &'a SourceRow)> + 'a {
    let product_rows = products
        .iter()
        .map(|p| (Owner::Product(p.id), p.sku.as_str(), p.row));
    let variant_rows = variants
        .iter()
        .filter_map(|v| Some((Owner::Variant(v.id), v.sku.as_str(), v.row?)));
    product_rows.chain(variant_rows)
}

fn clear<S>(
    store: &mut S,
    step: &str,
    table: Table,
    products: &[PersistedProduct<'_>],
    variants: &[PersistedVariant<'_>],
    options: &BatchOptions,
    report: &mut StageReport,
) -> usize
where
    S: CatalogStore + ?Sized,
{
    let (product_ids, variant_ids) = owner_ids(products, variants);
    delete_chunked(store, step, table, "product_id", &product_ids, options.delete_chunk_size, report)
        + delete_chunked(store, step, table, "variant_id", &variant_ids, options.delete_chunk_size, report)
}

/// Replace the images of every product and variant of this run
pub fn rebuild_images<S>(
    store: &mut S,
    schema: &ColumnSchema,
    products: &[PersistedProduct<'_>],
    variants: &[PersistedVariant<'_>],
    options: &BatchOptions,
) -> StageReport
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    let deleted = clear(store, IMAGES_STEP, Table::ProductImages, products, variants, options, &mut report);

    let images: Vec<ProductImage> = sources(products, variants)
        .flat_map(|(owner, _, row)| {
            parse_images(schema.cell(row, Column::Images))
                .into_iter()
                .map(move |image| ProductImage {
                    owner,
                    url: image.url,
                    alt: image.alt,
                    title: image.title,
                    position: image.position,
                    is_featured: image.is_featured,
                })
        })
        .collect();

    let written = write_chunked(
        store,
        IMAGES_STEP,
        Table::ProductImages,
        &images,
        WriteMode::Insert,
        options.chunk_size,
        &mut report,
    );
    tracing::debug!(deleted, written, "images rebuilt");
    report.count(IMAGES_STEP, written);
    report
}

/// Pricing mode of every product in the store, by id
fn pricing_modes<S>(store: &S, options: &BatchOptions) -> Result<HashMap<i64, PricingMode>, crate::store::StoreError>
where
    S: CatalogStore + ?Sized,
{
    Ok(fetch_all(store, Table::Products, &["id", "pbq_pricing_mode"], options.page_size)?
        .iter()
        .filter_map(|row| {
            let id = row_i64(row, "id")?;
            Some((id, PricingMode::from_cell(row_str(row, "pbq_pricing_mode"))))
        })
        .collect())
}

/// Replace the price tiers of every product and variant of this run
///
/// Variant tiers follow their owning product's pricing mode.
pub fn rebuild_price_tiers<S>(
    store: &mut S,
    schema: &ColumnSchema,
    products: &[PersistedProduct<'_>],
    variants: &[PersistedVariant<'_>],
    options: &BatchOptions,
) -> StageReport
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();

    let mut modes: HashMap<i64, PricingMode> = match pricing_modes(store, options) {
        Ok(modes) => modes,
        Err(e) => {
            report.error(TIERS_STEP, format!("cannot read product pricing modes: {e}"), None);
            HashMap::new()
        }
    };
    // this run's values win over whatever the read-back returned
    modes.extend(products.iter().map(|p| (p.id, p.pricing_mode)));
    let variant_products: HashMap<i64, i64> = variants.iter().map(|v| (v.id, v.product_id)).collect();

    let deleted = clear(store, TIERS_STEP, Table::PriceTiers, products, variants, options, &mut report);

    let mut tiers: Vec<PriceTier> = Vec::new();
    for (owner, sku, row) in sources(products, variants) {
        let table = match parse_tier_table(schema.cell(row, Column::PbqDiscountTable)) {
            Ok(table) => table,
            Err(e) => {
                report.warn(TIERS_STEP, format!("price tiers of '{sku}' ignored: {e}"));
                continue;
            }
        };
        for problem in &table.unparsable {
            report.warn(TIERS_STEP, format!("price tier of '{sku}' dropped: {problem}"));
        }
        if table.entries.is_empty() {
            continue;
        }

        let product_id = match owner {
            Owner::Product(id) => id,
            Owner::Variant(id) => variant_products.get(&id).copied().unwrap_or_default(),
        };
        let mode = modes.get(&product_id).copied().unwrap_or_default();
        tiers.extend(table.entries.into_iter().map(|entry| PriceTier {
            owner,
            min_quantity: entry.min_quantity,
            value: match mode {
                PricingMode::Fixed => TierValue::Price(entry.value),
                PricingMode::Percentage => TierValue::DiscountPercent(entry.value),
            },
            position: entry.position,
        }));
    }

    let written = write_chunked(
        store,
        TIERS_STEP,
        Table::PriceTiers,
        &tiers,
        WriteMode::Insert,
        options.chunk_size,
        &mut report,
    );
    tracing::debug!(deleted, written, "price tiers rebuilt");
    report.count(TIERS_STEP, written);
    report
}
