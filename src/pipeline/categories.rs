//! Hierarchical category resolver
//!
//! Category paths are collected into a slug-keyed plan, then persisted one
//! topological level at a time: a level is written, read back, and only then
//! do its children become eligible. A node whose parent never resolves is
//! dropped with a warning, and so are its descendants.

use std::collections::{HashMap, HashSet};

use crate::core::batch::{fetch_id_map, write_chunked, BatchOptions, WriteMode};
use crate::core::report::StageReport;
use crate::decode::category_path;
use crate::entities::Category;
use crate::source::{Column, ColumnSchema, SourceRow};
use crate::store::{CatalogStore, Table};

pub const STEP: &str = "categories";

/// A category waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCategory {
    pub slug: String,
    pub name: String,
    pub parent: Option<String>,
    /// Order among siblings, by first appearance
    pub position: i64,
}

/// Collect every distinct category named by the parent rows, in first-seen
/// order. The first path that produces a slug decides its name and parent.
pub fn plan(schema: &ColumnSchema, parents: &[&SourceRow]) -> Vec<PlannedCategory> {
    let mut planned: Vec<PlannedCategory> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut siblings: HashMap<Option<String>, i64> = HashMap::new();

    for row in parents {
        for node in category_path::nodes(schema.cell(row, Column::Categories)) {
            if !seen.insert(node.slug.clone()) {
                continue;
            }
            let counter = siblings.entry(node.parent.clone()).or_insert(0);
            planned.push(PlannedCategory {
                slug: node.slug,
                name: node.name,
                parent: node.parent,
                position: *counter,
            });
            *counter += 1;
        }
    }
    planned
}

/// Persist the planned categories level by level
///
/// Returns the slug -> id map of every category resolved in this run.
pub fn resolve<S>(
    store: &mut S,
    planned: &[PlannedCategory],
    options: &BatchOptions,
) -> (HashMap<String, i64>, StageReport)
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    let mut resolved: HashMap<String, i64> = HashMap::new();
    let mut pending: Vec<&PlannedCategory> = planned.iter().collect();
    let mut level = 0usize;

    loop {
        let (ready, waiting): (Vec<&PlannedCategory>, Vec<&PlannedCategory>) =
            pending.into_iter().partition(|c| match &c.parent {
                None => true,
                Some(parent) => resolved.contains_key(parent),
            });
        pending = waiting;
        if ready.is_empty() {
            break;
        }

        let records: Vec<Category> = ready
            .iter()
            .map(|c| Category {
                name: c.name.clone(),
                slug: c.slug.clone(),
                parent_id: c.parent.as_ref().and_then(|p| resolved.get(p).copied()),
                position: c.position,
            })
            .collect();
        write_chunked(
            store,
            STEP,
            Table::Categories,
            &records,
            WriteMode::upsert(&["slug"]),
            options.chunk_size,
            &mut report,
        );

        let ids = match fetch_id_map(store, Table::Categories, "slug", options.page_size) {
            Ok(ids) => ids,
            Err(e) => {
                report.error(STEP, format!("cannot read back categories: {e}"), Some(format!("level {level}")));
                break;
            }
        };
        for category in ready {
            match ids.get(&category.slug) {
                Some(id) => {
                    resolved.insert(category.slug.clone(), *id);
                }
                None => report.warn(
                    STEP,
                    format!("category '{}' was not persisted; dropping it", category.slug),
                ),
            }
        }
        tracing::debug!(level, resolved = resolved.len(), "category level persisted");
        level += 1;
    }

    for category in pending {
        report.warn(
            STEP,
            format!(
                "category '{}' dropped: parent '{}' never resolved",
                category.slug,
                category.parent.as_deref().unwrap_or_default()
            ),
        );
    }

    report.count(STEP, resolved.len());
    (resolved, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::batch::fetch_all;
    use crate::source::read_source_from;
    use crate::store::{row_i64, row_str, SqliteStore, DEFAULT_MAX_ROWS};

    fn planned_from(csv: &str) -> Vec<PlannedCategory> {
        let table = read_source_from(csv.as_bytes()).unwrap();
        let rows: Vec<&SourceRow> = table.rows.iter().collect();
        plan(&table.schema, &rows)
    }

    const HEADER: &str = "sku,post_status,tax:product_type,post_title,tax:product_cat\n";

    #[test]
    fn test_plan_dedupes_and_orders_siblings() {
        let planned = planned_from(&format!(
            "{HEADER}A1,publish,simple,Chaise,Mobilier > Chaises\n\
             A2,publish,simple,Table,Mobilier > Tables | Mobilier > Chaises\n"
        ));
        let slugs: Vec<&str> = planned.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["mobilier", "mobilier-chaises", "mobilier-tables"]);
        assert_eq!(planned[1].position, 0);
        assert_eq!(planned[2].position, 1);
        assert_eq!(planned[2].parent.as_deref(), Some("mobilier"));
    }

    #[test]
    fn test_resolve_links_parents() {
        let planned = planned_from(&format!(
            "{HEADER}A1,publish,simple,Chaise,Mobilier > Chaises > Enfant\n"
        ));
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let (ids, report) = resolve(&mut store, &planned, &BatchOptions::default());

        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
        assert_eq!(ids.len(), 3);
        assert_eq!(report.count_of(STEP), 3);

        let rows = fetch_all(&store, Table::Categories, &["id", "slug", "parent_id"], 100).unwrap();
        let child = rows
            .iter()
            .find(|r| row_str(r, "slug") == Some("mobilier-chaises-enfant"))
            .unwrap();
        assert_eq!(row_i64(child, "parent_id"), Some(ids["mobilier-chaises"]));
    }

    #[test]
    fn test_unresolvable_parent_drops_descendants() {
        let planned = vec![
            PlannedCategory {
                slug: "orphan".into(),
                name: "Orphan".into(),
                parent: Some("ghost".into()),
                position: 0,
            },
            PlannedCategory {
                slug: "orphan-child".into(),
                name: "Child".into(),
                parent: Some("orphan".into()),
                position: 0,
            },
            PlannedCategory {
                slug: "root".into(),
                name: "Root".into(),
                parent: None,
                position: 0,
            },
        ];
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let (ids, report) = resolve(&mut store, &planned, &BatchOptions::default());

        assert_eq!(ids.len(), 1);
        assert!(ids.contains_key("root"));
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].message.contains("'orphan'"));
        assert!(report.warnings[1].message.contains("'orphan-child'"));
        assert_eq!(store.count(Table::Categories).unwrap(), 1);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let planned = planned_from(&format!(
            "{HEADER}A1,publish,simple,Chaise,Mobilier > Chaises | Jardin\n"
        ));
        let mut store = SqliteStore::in_memory(DEFAULT_MAX_ROWS).unwrap();
        let (first, _) = resolve(&mut store, &planned, &BatchOptions::default());
        let (second, report) = resolve(&mut store, &planned, &BatchOptions::default());

        assert_eq!(first, second);
        assert!(report.errors.is_empty());
        assert_eq!(store.count(Table::Categories).unwrap(), 3);
    }

    #[test]
    fn test_resolve_pages_past_row_cap() {
        let planned: Vec<PlannedCategory> = (0..7)
            .map(|i| PlannedCategory {
                slug: format!("cat-{i}"),
                name: format!("Cat {i}"),
                parent: None,
                position: i,
            })
            .collect();
        let mut store = SqliteStore::in_memory(3).unwrap();
        let options = BatchOptions {
            chunk_size: 2,
            page_size: 3,
            ..BatchOptions::default()
        };
        let (ids, report) = resolve(&mut store, &planned, &options);
        assert!(report.warnings.is_empty());
        assert_eq!(ids.len(), 7);
    }
}
