//! Variant upserter
//!
//! Simple products get one synthetic default variant; every child row of a
//! variable product becomes a variant attached through its parent sku.

use std::collections::HashSet;

use crate::core::batch::{fetch_id_map, write_chunked_accepted, BatchOptions, WriteMode};
use crate::core::report::StageReport;
use crate::decode::scalar;
use crate::entities::variant::{default_variant_sku, DEFAULT_VARIANT_NAME};
use crate::entities::{ProductType, Variant};
use crate::source::{Column, ColumnSchema, SourceRow};
use crate::store::{CatalogStore, Table};

use super::products::ProductIndex;

pub const STEP: &str = "variants";

/// A variant of this run that made it into the store
#[derive(Debug, Clone)]
pub struct PersistedVariant<'a> {
    pub id: i64,
    pub sku: String,
    pub product_id: i64,
    /// Source child row; `None` for a synthetic default variant
    pub row: Option<&'a SourceRow>,
}

fn map_fields(schema: &ColumnSchema, row: &SourceRow, variant: &mut Variant) {
    variant.regular_price = scalar::decimal(schema.cell(row, Column::RegularPrice));
    variant.sale_price = scalar::decimal(schema.cell(row, Column::SalePrice));
    variant.stock_quantity = scalar::integer(schema.cell(row, Column::Stock));
    variant.weight = scalar::decimal(schema.cell(row, Column::Weight));
    variant.length = scalar::decimal(schema.cell(row, Column::Length));
    variant.width = scalar::decimal(schema.cell(row, Column::Width));
    variant.height = scalar::decimal(schema.cell(row, Column::Height));
    variant.min_order_quantity = scalar::integer(schema.cell(row, Column::MinimumQuantity));
}

fn blank_variant(sku: String, product_id: i64, name: String) -> Variant {
    Variant {
        sku,
        product_id,
        name,
        regular_price: None,
        sale_price: None,
        stock_quantity: None,
        weight: None,
        length: None,
        width: None,
        height: None,
        min_order_quantity: None,
        position: 0,
        is_default: false,
    }
}

/// Build and upsert variants keyed on sku, then read back ids
pub fn upsert_variants<'a, S>(
    store: &mut S,
    schema: &ColumnSchema,
    products: &ProductIndex<'a>,
    children: &[&'a SourceRow],
    options: &BatchOptions,
) -> (Vec<PersistedVariant<'a>>, StageReport)
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut planned: Vec<(Variant, Option<&'a SourceRow>)> = Vec::new();

    for product in &products.persisted {
        if product.product_type != ProductType::Simple {
            continue;
        }
        let mut variant = blank_variant(
            default_variant_sku(&product.sku),
            product.id,
            DEFAULT_VARIANT_NAME.to_string(),
        );
        map_fields(schema, product.row, &mut variant);
        variant.is_default = true;
        seen.insert(variant.sku.clone());
        planned.push((variant, None));
    }

    for (idx, row) in children.iter().enumerate() {
        let (Some(sku), Some(parent_sku)) = (
            schema.cell(row, Column::Sku),
            schema.cell(row, Column::ParentSku),
        ) else {
            continue;
        };
        let Some(&product_id) = products.ids_by_sku.get(parent_sku) else {
            report.warn(
                STEP,
                format!("variant '{sku}' dropped: parent sku '{parent_sku}' matches no product"),
            );
            continue;
        };
        if !seen.insert(sku.to_string()) {
            report.warn(
                STEP,
                format!("duplicate variant sku '{sku}' on line {}; keeping the first row", row.line),
            );
            continue;
        }

        let name = scalar::text(schema.cell(row, Column::Title)).unwrap_or_else(|| sku.to_string());
        let mut variant = blank_variant(sku.to_string(), product_id, name);
        map_fields(schema, row, &mut variant);
        variant.position = scalar::integer(schema.cell(row, Column::MenuOrder)).unwrap_or(idx as i64);
        planned.push((variant, Some(*row)));
    }

    let records: Vec<&Variant> = planned.iter().map(|(v, _)| v).collect();
    let accepted = write_chunked_accepted(
        store,
        STEP,
        Table::Variants,
        &records,
        WriteMode::upsert(&["sku"]),
        options.chunk_size,
        &mut report,
    );

    let ids = match fetch_id_map(store, Table::Variants, "sku", options.page_size) {
        Ok(ids) => ids,
        Err(e) => {
            report.error(STEP, format!("cannot read back variant ids: {e}"), None);
            return (Vec::new(), report);
        }
    };

    let accepted: HashSet<usize> = accepted.into_iter().collect();
    let persisted: Vec<PersistedVariant<'a>> = planned
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| accepted.contains(idx))
        .filter_map(|(_, (variant, row))| {
            Some(PersistedVariant {
                id: *ids.get(&variant.sku)?,
                sku: variant.sku,
                product_id: variant.product_id,
                row,
            })
        })
        .collect();

    report.count(STEP, persisted.len());
    (persisted, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::fetch_all;
    use crate::pipeline::products::upsert_products;
    use crate::source::{classify, read_source_from};
    use crate::store::{row_i64, row_str, SqliteStore, DEFAULT_MAX_ROWS};

    const DATA: &str = "\
sku,post_status,tax:product_type,post_title,parent_sku,regular_price,meta:minimum_allowed_quantity
A1,publish,simple,Chaise,,49.90,2
A2,publish,variable,Table,,,
A2-RED,publish,variation,Table rouge,A2,\"199,00\",
A2-BLUE,publish,variation,Table bleue,A2,189,
X9-GREEN,publish,variation,Fantôme,X9,10,
";

    #[test]
    fn test_default_and_child_variants() {
        let table = read_source_from(DATA.as_bytes()).unwrap();
        let classified = classify(&table);
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let options = BatchOptions::default();

        let (products, _) = upsert_products(&mut store, &table.schema, &classified.parents, &options);
        let (variants, report) =
            upsert_variants(&mut store, &table.schema, &products, &classified.children, &options);

        assert!(report.errors.is_empty());
        assert_eq!(variants.len(), 3);
        assert_eq!(report.count_of(STEP), 3);

        // orphan: exactly one warning naming the child's own sku
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("'X9-GREEN'"));

        let rows = fetch_all(
            &store,
            Table::Variants,
            &["sku", "name", "regular_price", "min_order_quantity", "is_default"],
            100,
        )
        .unwrap();
        assert_eq!(row_str(&rows[0], "sku"), Some("A1-default"));
        assert_eq!(row_str(&rows[0], "name"), Some("Default"));
        assert_eq!(rows[0]["regular_price"], serde_json::json!(49.9));
        assert_eq!(row_i64(&rows[0], "min_order_quantity"), Some(2));
        assert_eq!(row_i64(&rows[0], "is_default"), Some(1));
        assert_eq!(rows[1]["regular_price"], serde_json::json!(199.0));
        assert!(variants.iter().all(|v| v.sku != "X9-GREEN"));
    }

    #[test]
    fn test_rerun_does_not_duplicate() {
        let table = read_source_from(DATA.as_bytes()).unwrap();
        let classified = classify(&table);
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let options = BatchOptions::default();

        for _ in 0..2 {
            let (products, _) =
                upsert_products(&mut store, &table.schema, &classified.parents, &options);
            upsert_variants(&mut store, &table.schema, &products, &classified.children, &options);
        }
        assert_eq!(store.count(Table::Variants).unwrap(), 3);
    }
}
