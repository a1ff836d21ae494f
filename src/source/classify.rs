//! Row classifier: parents (products) and children (variants)

use super::columns::Column;
use super::reader::{SourceRow, SourceTable};
use crate::entities::ProductType;

/// Publication statuses accepted as "published"
pub const PUBLISHED_STATUSES: &[&str] = &["publish", "published"];

/// Rows partitioned by role, source order preserved
#[derive(Debug, Default)]
pub struct Classified<'a> {
    pub parents: Vec<&'a SourceRow>,
    pub children: Vec<&'a SourceRow>,
    /// Unpublished rows and rows without a sku
    pub skipped: usize,
    /// Published rows with a sku that are neither a child nor a known type
    pub unclassifiable: usize,
}

impl Classified<'_> {
    pub fn rejected(&self) -> usize {
        self.skipped + self.unclassifiable
    }
}

pub fn classify(table: &SourceTable) -> Classified<'_> {
    let schema = &table.schema;
    let mut out = Classified::default();

    for row in &table.rows {
        let published = schema
            .cell(row, Column::Status)
            .map(|s| PUBLISHED_STATUSES.contains(&s.to_lowercase().as_str()))
            .unwrap_or(false);
        let Some(sku) = schema.cell(row, Column::Sku).filter(|_| published) else {
            out.skipped += 1;
            continue;
        };

        if schema.cell(row, Column::ParentSku).is_some() {
            out.children.push(row);
            continue;
        }

        let product_type = schema
            .cell(row, Column::ProductType)
            .and_then(|t| t.parse::<ProductType>().ok());
        match product_type {
            Some(_) => out.parents.push(row),
            None => {
                tracing::debug!(line = row.line, sku, "unclassifiable row");
                out.unclassifiable += 1;
            }
        }
    }

    tracing::debug!(
        parents = out.parents.len(),
        children = out.children.len(),
        skipped = out.skipped,
        unclassifiable = out.unclassifiable,
        "rows classified"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::read_source_from;

    #[test]
    fn test_classify_partitions_rows() {
        let data = "\
sku,post_status,tax:product_type,post_title,parent_sku
A1,publish,simple,Chaise,
A2,publish,variable,Table,
A2-RED,publish,variation,Table rouge,A2
A3,draft,simple,Brouillon,
,publish,simple,Sans sku,
A4,publish,grouped,Lot,
A5,Publish,Simple,Banc,
";
        let table = read_source_from(data.as_bytes()).unwrap();
        let classified = classify(&table);

        let parent_lines: Vec<u64> = classified.parents.iter().map(|r| r.line).collect();
        assert_eq!(parent_lines, vec![2, 3, 8]);
        assert_eq!(classified.children.len(), 1);
        assert_eq!(classified.children[0].line, 4);
        assert_eq!(classified.skipped, 2);
        assert_eq!(classified.unclassifiable, 1);
        assert_eq!(classified.rejected(), 3);
    }
}
