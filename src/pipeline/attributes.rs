//! Attribute/term dictionary builder

use std::collections::HashMap;

use crate::core::batch::{fetch_id_map, write_chunked, BatchOptions, WriteMode};
use crate::core::report::StageReport;
use crate::core::slug::slugify;
use crate::decode::attribute::split_multi;
use crate::entities::{Attribute, AttributeTerm};
use crate::source::{ColumnSchema, SourceRow};
use crate::store::{CatalogStore, Table};

pub const STEP: &str = "attributes";
pub const TERMS_STEP: &str = "attribute_terms";

/// One attribute with its ordered, slug-unique terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub slug: String,
    pub name: String,
    /// `(slug, display name)` in first-seen order
    pub terms: Vec<(String, String)>,
}

/// Scan every row's attribute value columns (product-level and per-variant)
/// and collect the distinct terms of each axis. Axes without any term are left
/// out.
pub fn build_dictionary(schema: &ColumnSchema, rows: &[&SourceRow]) -> Vec<DictionaryEntry> {
    let mut dictionary: Vec<DictionaryEntry> = Vec::new();
    for axis in schema.axes() {
        let mut entry = DictionaryEntry {
            slug: axis.slug.clone(),
            name: axis.name.clone(),
            terms: Vec::new(),
        };
        for row in rows {
            for pos in [axis.values, axis.variant] {
                for value in split_multi(schema.axis_cell(row, pos)) {
                    let slug = slugify(&value);
                    if slug.is_empty() || entry.terms.iter().any(|(s, _)| *s == slug) {
                        continue;
                    }
                    entry.terms.push((slug, value));
                }
            }
        }
        if entry.terms.is_empty() {
            continue;
        }
        // two column families can slugify to the same attribute
        match dictionary.iter_mut().find(|e| e.slug == entry.slug) {
            Some(existing) => {
                for term in entry.terms {
                    if !existing.terms.iter().any(|(s, _)| *s == term.0) {
                        existing.terms.push(term);
                    }
                }
            }
            None => dictionary.push(entry),
        }
    }
    dictionary
}

/// Persist attributes, then their terms under the read-back attribute ids
///
/// Existing attributes and terms are left untouched. Returns the
/// attribute slug -> id map.
pub fn persist<S>(
    store: &mut S,
    dictionary: &[DictionaryEntry],
    options: &BatchOptions,
) -> (HashMap<String, i64>, StageReport)
where
    S: CatalogStore + ?Sized,
{
    let mut report = StageReport::new();
    if dictionary.is_empty() {
        return (HashMap::new(), report);
    }

    let attributes: Vec<Attribute> = dictionary
        .iter()
        .map(|e| Attribute::select(&e.slug, &e.name))
        .collect();
    write_chunked(
        store,
        STEP,
        Table::Attributes,
        &attributes,
        WriteMode::insert_ignore(&["slug"]),
        options.chunk_size,
        &mut report,
    );

    let all_ids = match fetch_id_map(store, Table::Attributes, "slug", options.page_size) {
        Ok(ids) => ids,
        Err(e) => {
            report.error(STEP, format!("cannot read back attributes: {e}"), None);
            return (HashMap::new(), report);
        }
    };

    let mut ids = HashMap::new();
    let mut terms = Vec::new();
    for entry in dictionary {
        let Some(&attribute_id) = all_ids.get(&entry.slug) else {
            report.warn(STEP, format!("attribute '{}' was not persisted; its terms are skipped", entry.slug));
            continue;
        };
        ids.insert(entry.slug.clone(), attribute_id);
        terms.extend(entry.terms.iter().enumerate().map(|(pos, (slug, name))| AttributeTerm {
            attribute_id,
            slug: slug.clone(),
            name: name.clone(),
            position: pos as i64,
        }));
    }

    let written = write_chunked(
        store,
        TERMS_STEP,
        Table::AttributeTerms,
        &terms,
        WriteMode::insert_ignore(&["attribute_id", "slug"]),
        options.chunk_size,
        &mut report,
    );

    report.count(STEP, ids.len());
    report.count(TERMS_STEP, written);
    (ids, report)
}
