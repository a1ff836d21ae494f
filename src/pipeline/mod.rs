//! Import pipeline orchestrator
//!
//! Stages run strictly in dependency order, each one returning its own
//! [`StageReport`] that is merged into the [`RunReport`] before the next
//! stage starts. Only the caller decides what is fatal; nothing in here
//! aborts a run.

pub mod attributes;
pub mod categories;
pub mod collections;
pub mod pivots;
pub mod products;
pub mod variants;

use crate::core::batch::BatchOptions;
use crate::core::report::{RunReport, StageReport};
use crate::source::{classify, SourceRow, SourceTable};
use crate::store::CatalogStore;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Categories,
    Attributes,
    Products,
    ProductCategories,
    ProductAttributes,
    Variants,
    VariantAttributes,
    Images,
    PriceTiers,
}

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::Classify,
        Stage::Categories,
        Stage::Attributes,
        Stage::Products,
        Stage::ProductCategories,
        Stage::ProductAttributes,
        Stage::Variants,
        Stage::VariantAttributes,
        Stage::Images,
        Stage::PriceTiers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Classify => "Classifying rows",
            Stage::Categories => "Resolving categories",
            Stage::Attributes => "Building attribute dictionary",
            Stage::Products => "Upserting products",
            Stage::ProductCategories => "Linking product categories",
            Stage::ProductAttributes => "Linking product attributes",
            Stage::Variants => "Upserting variants",
            Stage::VariantAttributes => "Linking variant attributes",
            Stage::Images => "Rebuilding images",
            Stage::PriceTiers => "Rebuilding price tiers",
        }
    }

    /// Report count key summarizing the stage
    pub fn count_key(&self) -> &'static str {
        match self {
            Stage::Classify => "rows_read",
            Stage::Categories => categories::STEP,
            Stage::Attributes => attributes::STEP,
            Stage::Products => products::STEP,
            Stage::ProductCategories => pivots::PRODUCT_CATEGORIES_STEP,
            Stage::ProductAttributes => pivots::PRODUCT_ATTRIBUTES_STEP,
            Stage::Variants => variants::STEP,
            Stage::VariantAttributes => pivots::VARIANT_ATTRIBUTES_STEP,
            Stage::Images => collections::IMAGES_STEP,
            Stage::PriceTiers => collections::TIERS_STEP,
        }
    }
}

/// Run every stage against `store`, merging stage reports into `report`
///
/// `on_stage` is called after each stage with that stage's own findings.
pub fn run<S, F>(
    store: &mut S,
    source: &SourceTable,
    options: &BatchOptions,
    report: &mut RunReport,
    mut on_stage: F,
) where
    S: CatalogStore + ?Sized,
    F: FnMut(Stage, &StageReport),
{
    let schema = &source.schema;
    let mut finish = |stage: Stage, stage_report: StageReport, report: &mut RunReport| {
        on_stage(stage, &stage_report);
        report.merge(stage_report);
    };

    let classified = classify(source);
    let mut stage = StageReport::new();
    stage.count("rows_read", source.rows.len() + source.malformed.len());
    stage.count("parents", classified.parents.len());
    stage.count("children", classified.children.len());
    stage.count("unclassifiable", classified.unclassifiable);
    for bad in &source.malformed {
        stage.warn(
            "source",
            match bad.line {
                Some(line) => format!("malformed record near line {line} skipped: {}", bad.message),
                None => format!("malformed record skipped: {}", bad.message),
            },
        );
    }
    report.skipped_rows = classified.rejected() + source.malformed.len();
    finish(Stage::Classify, stage, report);

    let planned = categories::plan(schema, &classified.parents);
    let (category_ids, stage) = categories::resolve(store, &planned, options);
    finish(Stage::Categories, stage, report);

    let every_row: Vec<&SourceRow> = classified
        .parents
        .iter()
        .chain(classified.children.iter())
        .copied()
        .collect();
    let dictionary = attributes::build_dictionary(schema, &every_row);
    let (attribute_ids, stage) = attributes::persist(store, &dictionary, options);
    finish(Stage::Attributes, stage, report);

    let (product_index, stage) = products::upsert_products(store, schema, &classified.parents, options);
    finish(Stage::Products, stage, report);

    let stage = pivots::link_categories(store, schema, &product_index.persisted, &category_ids, options);
    finish(Stage::ProductCategories, stage, report);

    let stage =
        pivots::link_product_attributes(store, schema, &product_index.persisted, &attribute_ids, options);
    finish(Stage::ProductAttributes, stage, report);

    let (persisted_variants, stage) =
        variants::upsert_variants(store, schema, &product_index, &classified.children, options);
    finish(Stage::Variants, stage, report);

    let stage =
        pivots::link_variant_attributes(store, schema, &persisted_variants, &attribute_ids, options);
    finish(Stage::VariantAttributes, stage, report);

    let stage = collections::rebuild_images(
        store,
        schema,
        &product_index.persisted,
        &persisted_variants,
        options,
    );
    finish(Stage::Images, stage, report);

    let stage = collections::rebuild_price_tiers(
        store,
        schema,
        &product_index.persisted,
        &persisted_variants,
        options,
    );
    finish(Stage::PriceTiers, stage, report);
}
