//! Product upserter

use std::collections::{HashMap, HashSet};

use crate::core::batch::{fetch_all, fetch_id_map, write_chunked_accepted, BatchOptions, WriteMode};
use crate::core::report::StageReport;
use crate::core::slug::{slugify, SlugRegistry};
use crate::decode::attribute::split_multi;
use crate::decode::scalar;
use crate::entities::{PricingMode, Product, ProductType};
use crate::source::{Column, ColumnSchema, SourceRow};
use crate::store::{row_str, CatalogStore, Table};

pub const STEP: &str = "products";

/// Slug used when neither a slug, a title nor a sku produce one
const FALLBACK_SLUG: &str = "product";

/// A product of this run that made it into the store
#[derive(Debug, Clone)]
pub struct PersistedProduct<'a> {
    pub id: i64,
    pub sku: String,
    pub product_type: ProductType,
    pub pricing_mode: PricingMode,
    pub row: &'a SourceRow,
}

/// Products written by this run plus the sku -> id map of the whole store
#[derive(Debug, Default)]
pub struct ProductIndex<'a> {
    pub persisted: Vec<PersistedProduct<'a>>,
    pub ids_by_sku: HashMap<String, i64>,
}

/// Map one parent row to a product record (slug not yet deduplicated)
pub fn map_row(schema: &ColumnSchema, row: &SourceRow) -> Option<Product> {
    let sku = schema.cell(row, Column::Sku)?.to_string();
    let product_type = schema.cell(row, Column::ProductType)?.parse().ok()?;
    let name = scalar::text(schema.cell(row, Column::Title)).unwrap_or_else(|| sku.clone());

    Some(Product {
        slug: String::new(),
        name,
        product_type,
        description: scalar::description(schema.raw(row, Column::Content)),
        short_description: scalar::description(schema.raw(row, Column::Excerpt)),
        regular_price: scalar::decimal(schema.cell(row, Column::RegularPrice)),
        sale_price: scalar::decimal(schema.cell(row, Column::SalePrice)),
        stock_quantity: scalar::integer(schema.cell(row, Column::Stock)),
        manage_stock: scalar::boolean(schema.cell(row, Column::ManageStock)),
        weight: scalar::decimal(schema.cell(row, Column::Weight)),
        length: scalar::decimal(schema.cell(row, Column::Length)),
        width: scalar::decimal(schema.cell(row, Column::Width)),
        height: scalar::decimal(schema.cell(row, Column::Height)),
        position: scalar::integer(schema.cell(row, Column::MenuOrder)).unwrap_or(0),
        supplier_name: scalar::text(schema.cell(row, Column::SupplierName)),
        supplier_ref: scalar::text(schema.cell(row, Column::SupplierRef)),
        eco_fee: scalar::decimal(schema.cell(row, Column::EcoFee)),
        pbq_enabled: scalar::boolean(schema.cell(row, Column::PbqEnabled)),
        pbq_pricing_mode: PricingMode::from_cell(schema.cell(row, Column::PbqPricingType)),
        pbq_min_quantity: scalar::integer(schema.cell(row, Column::PbqMinQuantity)),
        pbq_max_quantity: scalar::integer(schema.cell(row, Column::PbqMaxQuantity)),
        seo_title: scalar::text(schema.cell(row, Column::SeoTitle)),
        seo_description: scalar::text(schema.cell(row, Column::SeoDescription)),
        tags: split_multi(schema.cell(row, Column::Tags)),
        sku,
    })
}

/// Base slug for a product: provided slug, else title, else sku
fn base_slug(schema: &ColumnSchema, row: &SourceRow, product: &Product) -> String {
    [
        schema.cell(row, Column::Slug),
        schema.cell(row, Column::Title),
        Some(product.sku.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(slugify)
    .find(|s| !s.is_empty())
    .unwrap_or_else(|| FALLBACK_SLUG.to_string())
}

/// Whether `stored` is `base` or one of its `-N` suffixed forms
fn derives_from(stored: &str, base: &str) -> bool {
    match stored.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('-')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit())),
        None => false,
    }
}

/// Upsert every parent row as a product keyed on sku, then read back ids
pub fn upsert_products<'a, S>(
    store: &mut S,
    schema: &ColumnSchema,
    parents: &[&'a SourceRow],
    options: &BatchOptions,
) -> (ProductIndex<'a>, StageReport)
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();

    let mut seen: HashSet<String> = HashSet::new();
    let mut mapped: Vec<(Product, &'a SourceRow)> = Vec::new();
    for row in parents {
        let Some(product) = map_row(schema, row) else {
            continue;
        };
        if !seen.insert(product.sku.clone()) {
            report.warn(
                STEP,
                format!("duplicate product sku '{}' on line {}; keeping the first row", product.sku, row.line),
            );
            continue;
        }
        mapped.push((product, row));
    }

    // Slugs held by products outside this run stay theirs; a sku of this run
    // keeps its stored slug while that slug still derives from its base
    let mut registry = SlugRegistry::new();
    let mut stored_slugs: HashMap<String, String> = HashMap::new();
    match fetch_all(store, Table::Products, &["sku", "slug"], options.page_size) {
        Ok(rows) => {
            for existing in &rows {
                if let (Some(sku), Some(slug)) = (row_str(existing, "sku"), row_str(existing, "slug")) {
                    if seen.contains(sku) {
                        stored_slugs.insert(sku.to_string(), slug.to_string());
                    } else {
                        registry.claim(slug);
                    }
                }
            }
        }
        Err(e) => report.error(STEP, format!("cannot read existing product slugs: {e}"), None),
    }

    let bases: Vec<String> = mapped
        .iter()
        .map(|(product, row)| base_slug(schema, row, product))
        .collect();
    for ((product, _), base) in mapped.iter_mut().zip(&bases) {
        if let Some(stored) = stored_slugs.get(&product.sku) {
            if derives_from(stored, base) {
                product.slug = registry.claim(stored);
            }
        }
    }
    for ((product, _), base) in mapped.iter_mut().zip(&bases) {
        if product.slug.is_empty() {
            product.slug = registry.claim(base);
        }
    }

    let records: Vec<&Product> = mapped.iter().map(|(p, _)| p).collect();
    let accepted = write_chunked_accepted(
        store,
        STEP,
        Table::Products,
        &records,
        WriteMode::upsert(&["sku"]),
        options.chunk_size,
        &mut report,
    );

    let ids_by_sku = match fetch_id_map(store, Table::Products, "sku", options.page_size) {
        Ok(ids) => ids,
        Err(e) => {
            report.error(STEP, format!("cannot read back product ids: {e}"), None);
            HashMap::new()
        }
    };

    // Only rows whose chunk was written are carried into later stages
    let accepted: HashSet<usize> = accepted.into_iter().collect();
    let persisted: Vec<PersistedProduct<'a>> = mapped
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| accepted.contains(idx))
        .filter_map(|(_, (product, row))| {
            let id = *ids_by_sku.get(&product.sku)?;
            Some(PersistedProduct {
                id,
                sku: product.sku,
                product_type: product.product_type,
                pricing_mode: product.pbq_pricing_mode,
                row,
            })
        })
        .collect();

    report.count(STEP, persisted.len());
    (
        ProductIndex {
            persisted,
            ids_by_sku,
        },
        report,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_source_from;
    use crate::store::{row_i64, OnConflict, Row, SqliteStore, StoreError, DEFAULT_MAX_ROWS};

    const HEADER: &str = "sku,post_status,tax:product_type,post_title,post_name,post_content,regular_price,manage_stock,tax:product_tag,meta:_pbq_pricing_type\n";

    fn run(store: &mut SqliteStore, data: &str) -> (Vec<(String, i64)>, StageReport) {
        let table = read_source_from(data.as_bytes()).unwrap();
        let rows: Vec<&SourceRow> = table.rows.iter().collect();
        let (index, report) = upsert_products(store, &table.schema, &rows, &BatchOptions::default());
        let pairs = index.persisted.iter().map(|p| (p.sku.clone(), p.id)).collect();
        (pairs, report)
    }

    #[test]
    fn test_map_row_coercions() {
        let data = format!(
            "{HEADER}A1,publish,simple,Chaise,,\"[{{\"\"id\"\":\"\"x\"\"}}]\",\"12,50\",oui,Bois | Salon,percentage\n"
        );
        let table = read_source_from(data.as_bytes()).unwrap();
        let product = map_row(&table.schema, &table.rows[0]).unwrap();
        assert_eq!(product.description, None);
        assert_eq!(product.regular_price, Some(12.5));
        assert!(product.manage_stock);
        assert_eq!(product.tags, vec!["Bois".to_string(), "Salon".to_string()]);
        assert_eq!(product.pbq_pricing_mode, PricingMode::Percentage);
        assert_eq!(product.sale_price, None);
        assert_eq!(product.supplier_name, None);
    }

    #[test]
    fn test_slug_collisions_get_suffixes() {
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let data = format!(
            "{HEADER}A1,publish,simple,Chaise,,,,,,\n\
             A2,publish,simple,Chaise,,,,,,\n\
             A3,publish,simple,Autre,chaise,,,,,\n"
        );
        let (pairs, report) = run(&mut store, &data);
        assert!(report.errors.is_empty());
        assert_eq!(pairs.len(), 3);

        let rows = fetch_all(&store, Table::Products, &["sku", "slug"], 100).unwrap();
        let slugs: Vec<&str> = rows.iter().filter_map(|r| row_str(r, "slug")).collect();
        assert_eq!(slugs, vec!["chaise", "chaise-1", "chaise-2"]);
    }

    #[test]
    fn test_rerun_keeps_ids_and_slugs() {
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let data = format!("{HEADER}A1,publish,simple,Chaise,,,,,,\nA2,publish,variable,Chaise,,,,,,\n");
        let (first, _) = run(&mut store, &data);
        let (second, report) = run(&mut store, &data);
        assert_eq!(first, second);
        assert!(report.errors.is_empty());

        let rows = fetch_all(&store, Table::Products, &["id", "slug"], 100).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(row_str(&rows[1], "slug"), Some("chaise-1"));
        assert_eq!(row_i64(&rows[0], "id"), Some(first[0].1));
    }

    #[test]
    fn test_existing_slug_of_other_sku_is_respected() {
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        run(&mut store, &format!("{HEADER}OLD,publish,simple,Chaise,,,,,,\n"));
        let (pairs, report) = run(&mut store, &format!("{HEADER}NEW,publish,simple,Chaise,,,,,,\n"));
        assert!(report.errors.is_empty());
        assert_eq!(pairs.len(), 1);

        let rows = fetch_all(&store, Table::Products, &["sku", "slug"], 100).unwrap();
        assert_eq!(row_str(&rows[1], "slug"), Some("chaise-1"));
    }

    #[test]
    fn test_reordered_rerun_keeps_slugs() {
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        run(&mut store, &format!("{HEADER}A1,publish,simple,Chaise,,,,,,\nA2,publish,simple,Chaise,,,,,,\n"));
        let (pairs, report) = run(
            &mut store,
            &format!("{HEADER}A2,publish,simple,Chaise,,,,,,\nA1,publish,simple,Chaise,,,,,,\n"),
        );
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(pairs.len(), 2);

        let rows = fetch_all(&store, Table::Products, &["sku", "slug"], 100).unwrap();
        assert_eq!(row_str(&rows[0], "slug"), Some("chaise"));
        assert_eq!(row_str(&rows[1], "slug"), Some("chaise-1"));
    }

    #[test]
    fn test_renamed_product_gets_new_slug() {
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        run(&mut store, &format!("{HEADER}A1,publish,simple,Chaise,,,,,,\nA2,publish,simple,Chaise,,,,,,\n"));
        let (_, report) = run(
            &mut store,
            &format!("{HEADER}A2,publish,simple,Chaise,,,,,,\nA1,publish,simple,Fauteuil,,,,,,\n"),
        );
        assert!(report.errors.is_empty(), "{:?}", report.errors);

        let rows = fetch_all(&store, Table::Products, &["sku", "slug"], 100).unwrap();
        assert_eq!(row_str(&rows[0], "slug"), Some("fauteuil"));
        assert_eq!(row_str(&rows[1], "slug"), Some("chaise-1"));
    }

    #[test]
    fn test_derives_from() {
        assert!(derives_from("chaise", "chaise"));
        assert!(derives_from("chaise-12", "chaise"));
        assert!(!derives_from("chaise-longue", "chaise"));
        assert!(!derives_from("chaise-", "chaise"));
        assert!(!derives_from("table", "chaise"));
    }

    /// Delegates to SQLite but rejects any product chunk carrying `sku`
    struct RejectSku {
        inner: SqliteStore,
        sku: &'static str,
    }

    impl CatalogStore for RejectSku {
        fn ping(&self) -> Result<(), StoreError> {
            self.inner.ping()
        }
        fn upsert(&mut self, table: Table, rows: &[Row], conflict: &[&str], mode: OnConflict) -> Result<usize, StoreError> {
            if rows.iter().any(|r| row_str(r, "sku") == Some(self.sku)) {
                return Err(StoreError::EmptyRow);
            }
            self.inner.upsert(table, rows, conflict, mode)
        }
        fn insert(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError> {
            self.inner.insert(table, rows)
        }
        fn delete_in(&mut self, table: Table, column: &str, values: &[i64]) -> Result<usize, StoreError> {
            self.inner.delete_in(table, column, values)
        }
        fn select_range(&self, table: Table, columns: &[&str], from: usize, to: usize) -> Result<Vec<Row>, StoreError> {
            self.inner.select_range(table, columns, from, to)
        }
        fn count(&self, table: Table) -> Result<usize, StoreError> {
            self.inner.count(table)
        }
    }

    #[test]
    fn test_failed_chunk_is_not_counted() {
        let data = format!("{HEADER}A1,publish,simple,Chaise,,,,,,\nA2,publish,simple,Table,,,,,,\n");
        let mut inner = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        run(&mut inner, &data);

        let mut store = RejectSku { inner, sku: "A2" };
        let table = read_source_from(data.as_bytes()).unwrap();
        let rows: Vec<&SourceRow> = table.rows.iter().collect();
        let options = BatchOptions {
            chunk_size: 1,
            ..BatchOptions::default()
        };
        let (index, report) = upsert_products(&mut store, &table.schema, &rows, &options);

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.count_of(STEP), 1);
        assert_eq!(index.persisted.len(), 1);
        assert_eq!(index.persisted[0].sku, "A1");
        // the stale row still resolves for parent lookups
        assert!(index.ids_by_sku.contains_key("A2"));
    }

    #[test]
    fn test_duplicate_sku_warns() {
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let data = format!("{HEADER}A1,publish,simple,Chaise,,,,,,\nA1,publish,simple,Copie,,,,,,\n");
        let (pairs, report) = run(&mut store, &data);
        assert_eq!(pairs.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("'A1'"));
    }
}
