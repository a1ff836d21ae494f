//! Typed column schema for the product export
//!
//! Headers are resolved once, when the file is loaded. Downstream code asks
//! for a [`Column`] or an [`AttributeAxis`] and never looks up a header name.

use std::collections::HashMap;

use csv::StringRecord;

use super::reader::SourceRow;
use super::SourceError;
use crate::decode::attribute::{attribute_slug, display_name};

/// Fixed columns of the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Sku,
    Status,
    ProductType,
    Title,
    ParentSku,
    Slug,
    Content,
    Excerpt,
    RegularPrice,
    SalePrice,
    Stock,
    ManageStock,
    Weight,
    Length,
    Width,
    Height,
    MenuOrder,
    Categories,
    Tags,
    Images,
    SupplierName,
    SupplierRef,
    EcoFee,
    PbqEnabled,
    PbqPricingType,
    PbqMinQuantity,
    PbqMaxQuantity,
    PbqDiscountTable,
    SeoTitle,
    SeoDescription,
    MinimumQuantity,
}

impl Column {
    pub const ALL: [Column; 31] = [
        Column::Sku,
        Column::Status,
        Column::ProductType,
        Column::Title,
        Column::ParentSku,
        Column::Slug,
        Column::Content,
        Column::Excerpt,
        Column::RegularPrice,
        Column::SalePrice,
        Column::Stock,
        Column::ManageStock,
        Column::Weight,
        Column::Length,
        Column::Width,
        Column::Height,
        Column::MenuOrder,
        Column::Categories,
        Column::Tags,
        Column::Images,
        Column::SupplierName,
        Column::SupplierRef,
        Column::EcoFee,
        Column::PbqEnabled,
        Column::PbqPricingType,
        Column::PbqMinQuantity,
        Column::PbqMaxQuantity,
        Column::PbqDiscountTable,
        Column::SeoTitle,
        Column::SeoDescription,
        Column::MinimumQuantity,
    ];

    /// Header name as written in the export (lowercase)
    pub fn header(&self) -> &'static str {
        match self {
            Column::Sku => "sku",
            Column::Status => "post_status",
            Column::ProductType => "tax:product_type",
            Column::Title => "post_title",
            Column::ParentSku => "parent_sku",
            Column::Slug => "post_name",
            Column::Content => "post_content",
            Column::Excerpt => "post_excerpt",
            Column::RegularPrice => "regular_price",
            Column::SalePrice => "sale_price",
            Column::Stock => "stock",
            Column::ManageStock => "manage_stock",
            Column::Weight => "weight",
            Column::Length => "length",
            Column::Width => "width",
            Column::Height => "height",
            Column::MenuOrder => "menu_order",
            Column::Categories => "tax:product_cat",
            Column::Tags => "tax:product_tag",
            Column::Images => "images",
            Column::SupplierName => "meta:_supplier_name",
            Column::SupplierRef => "meta:_supplier_ref",
            Column::EcoFee => "meta:_eco_fee",
            Column::PbqEnabled => "meta:_pbq_enabled",
            Column::PbqPricingType => "meta:_pbq_pricing_type",
            Column::PbqMinQuantity => "meta:_pbq_min_quantity",
            Column::PbqMaxQuantity => "meta:_pbq_max_quantity",
            Column::PbqDiscountTable => "meta:_pbq_discount_table",
            Column::SeoTitle => "meta:_seo_title",
            Column::SeoDescription => "meta:_seo_description",
            Column::MinimumQuantity => "meta:minimum_allowed_quantity",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(
            self,
            Column::Sku | Column::Status | Column::ProductType | Column::Title
        )
    }
}

/// Header prefixes of the four attribute column families
pub const ATTRIBUTE_VALUES_PREFIX: &str = "attribute:";
pub const ATTRIBUTE_DATA_PREFIX: &str = "attribute_data:";
pub const ATTRIBUTE_DEFAULT_PREFIX: &str = "attribute_default:";
pub const VARIANT_ATTRIBUTE_PREFIX: &str = "meta:attribute_";

/// The columns describing one attribute axis, e.g. `pa_couleur`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeAxis {
    /// Technical suffix shared by the column family (`pa_couleur`)
    pub technical: String,
    /// Attribute slug (`couleur`)
    pub slug: String,
    /// Display name (`Couleur`)
    pub name: String,
    pub values: Option<usize>,
    pub data: Option<usize>,
    pub default: Option<usize>,
    pub variant: Option<usize>,
}

impl AttributeAxis {
    fn new(technical: &str) -> Self {
        Self {
            technical: technical.to_string(),
            slug: attribute_slug(technical),
            name: display_name(technical),
            values: None,
            data: None,
            default: None,
            variant: None,
        }
    }
}

/// Header row resolved against the column convention
#[derive(Debug, Clone)]
pub struct ColumnSchema {
    index: HashMap<Column, usize>,
    axes: Vec<AttributeAxis>,
}

impl ColumnSchema {
    /// Resolve a header row, failing when a required column is absent
    pub fn from_headers(headers: &StringRecord) -> Result<Self, SourceError> {
        let names: Vec<String> = headers.iter().map(normalize_header).collect();

        let mut index = HashMap::new();
        for column in Column::ALL {
            if let Some(pos) = names.iter().position(|n| n == column.header()) {
                index.insert(column, pos);
            }
        }

        let missing: Vec<String> = Column::ALL
            .iter()
            .filter(|c| c.is_required() && !index.contains_key(*c))
            .map(|c| c.header().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SourceError::MissingColumns(missing));
        }

        let mut axes: Vec<AttributeAxis> = Vec::new();
        for (pos, name) in names.iter().enumerate() {
            let Some((technical, slot)) = classify_attribute_header(name) else {
                continue;
            };
            if attribute_slug(technical).is_empty() {
                tracing::warn!(header = %name, "ignoring attribute column with an empty slug");
                continue;
            }
            let axis = match axes.iter().position(|a| a.technical == technical) {
                Some(i) => &mut axes[i],
                None => {
                    axes.push(AttributeAxis::new(technical));
                    let last = axes.len() - 1;
                    &mut axes[last]
                }
            };
            let target = match slot {
                AxisSlot::Values => &mut axis.values,
                AxisSlot::Data => &mut axis.data,
                AxisSlot::Default => &mut axis.default,
                AxisSlot::Variant => &mut axis.variant,
            };
            target.get_or_insert(pos);
        }

        Ok(Self { index, axes })
    }

    pub fn axes(&self) -> &[AttributeAxis] {
        &self.axes
    }

    /// Untrimmed cell content, `None` when the column or the cell is absent
    pub fn raw<'r>(&self, row: &'r SourceRow, column: Column) -> Option<&'r str> {
        let pos = *self.index.get(&column)?;
        row.get(pos)
    }

    /// Trimmed, non-empty cell content
    pub fn cell<'r>(&self, row: &'r SourceRow, column: Column) -> Option<&'r str> {
        trimmed(self.raw(row, column))
    }

    /// Trimmed, non-empty content of an attribute column
    pub fn axis_cell<'r>(&self, row: &'r SourceRow, pos: Option<usize>) -> Option<&'r str> {
        trimmed(row.get(pos?))
    }
}

fn trimmed(cell: Option<&str>) -> Option<&str> {
    cell.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AxisSlot {
    Values,
    Data,
    Default,
    Variant,
}

fn classify_attribute_header(name: &str) -> Option<(&str, AxisSlot)> {
    let (technical, slot) = if let Some(rest) = name.strip_prefix(ATTRIBUTE_VALUES_PREFIX) {
        (rest, AxisSlot::Values)
    } else if let Some(rest) = name.strip_prefix(ATTRIBUTE_DATA_PREFIX) {
        (rest, AxisSlot::Data)
    } else if let Some(rest) = name.strip_prefix(ATTRIBUTE_DEFAULT_PREFIX) {
        (rest, AxisSlot::Default)
    } else if let Some(rest) = name.strip_prefix(VARIANT_ATTRIBUTE_PREFIX) {
        (rest, AxisSlot::Variant)
    } else {
        return None;
    };
    let technical = technical.trim();
    (!technical.is_empty()).then_some((technical, slot))
}

fn normalize_header(header: &str) -> String {
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    const BASE: [&str; 4] = ["sku", "post_status", "tax:product_type", "post_title"];

    #[test]
    fn test_missing_required_columns() {
        let err = ColumnSchema::from_headers(&headers(&["sku", "post_title"])).unwrap_err();
        match err {
            SourceError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["post_status".to_string(), "tax:product_type".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_headers_are_normalized() {
        let schema = ColumnSchema::from_headers(&headers(&[
            "\u{feff}SKU",
            " Post_Status ",
            "tax:product_type",
            "post_title",
            "Regular_Price",
        ]))
        .unwrap();
        let row = SourceRow::new(
            2,
            ["A1", "publish", "simple", "Chaise", "12"].map(String::from).to_vec(),
        );
        assert_eq!(schema.cell(&row, Column::Sku), Some("A1"));
        assert_eq!(schema.cell(&row, Column::RegularPrice), Some("12"));
        assert_eq!(schema.raw(&row, Column::Images), None);
    }

    #[test]
    fn test_attribute_axes_grouped() {
        let mut names = BASE.to_vec();
        names.extend([
            "attribute:pa_couleur",
            "attribute_data:pa_couleur",
            "meta:attribute_pa_couleur",
            "attribute:pa_taille_assise",
            "attribute_default:pa_couleur",
        ]);
        let schema = ColumnSchema::from_headers(&headers(&names)).unwrap();
        let axes = schema.axes();
        assert_eq!(axes.len(), 2);

        assert_eq!(axes[0].slug, "couleur");
        assert_eq!(axes[0].name, "Couleur");
        assert_eq!(axes[0].values, Some(4));
        assert_eq!(axes[0].data, Some(5));
        assert_eq!(axes[0].variant, Some(6));
        assert_eq!(axes[0].default, Some(8));

        assert_eq!(axes[1].slug, "taille-assise");
        assert_eq!(axes[1].name, "Taille Assise");
        assert_eq!(axes[1].variant, None);
    }

    #[test]
    fn test_cell_accessors() {
        let schema = ColumnSchema::from_headers(&headers(&BASE)).unwrap();
        let row = SourceRow::new(2, vec!["  A1 ".into(), "publish".into(), "".into()]);
        assert_eq!(schema.cell(&row, Column::Sku), Some("A1"));
        assert_eq!(schema.raw(&row, Column::Sku), Some("  A1 "));
        assert_eq!(schema.cell(&row, Column::ProductType), None);
        // short row: the title cell is missing entirely
        assert_eq!(schema.cell(&row, Column::Title), None);
        assert_eq!(schema.cell(&row, Column::Images), None);
    }
}
