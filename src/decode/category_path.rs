//! Hierarchical category paths: `Mobilier > Chaises | Extérieur > Bancs`

use crate::core::slug::slugify;
use crate::decode::scalar::decode_html_entities;

/// Separator between independent paths in one cell
pub const PATH_SEPARATOR: char = '|';
/// Separator between levels of a single path, root first
pub const LEVEL_SEPARATOR: char = '>';

/// One level of a category path, addressed by its generated slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    pub slug: String,
    pub name: String,
    pub parent: Option<String>,
}

/// Split a category cell into paths of trimmed level names
pub fn parse_paths(cell: Option<&str>) -> Vec<Vec<String>> {
    cell.unwrap_or_default()
        .split(PATH_SEPARATOR)
        .map(|path| {
            path.split(LEVEL_SEPARATOR)
                .map(|name| decode_html_entities(name.trim()))
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|levels| !levels.is_empty())
        .collect()
}

/// Walk one path root to leaf, deriving each level's slug from its parent
///
/// A root's slug is the slug of its name; a child's is
/// `<parent slug>-<slug of name>`. Levels whose name slugifies to nothing are
/// skipped and their children attach to the previous level.
pub fn walk_path(levels: &[String]) -> Vec<CategoryNode> {
    let mut nodes: Vec<CategoryNode> = Vec::with_capacity(levels.len());
    for name in levels {
        let own = slugify(name);
        if own.is_empty() {
            continue;
        }
        let parent = nodes.last().map(|n| n.slug.clone());
        let slug = match &parent {
            Some(p) => format!("{p}-{own}"),
            None => own,
        };
        nodes.push(CategoryNode {
            slug,
            name: name.clone(),
            parent,
        });
    }
    nodes
}

/// Every node of every path in a cell, in source order (may repeat)
pub fn nodes(cell: Option<&str>) -> Vec<CategoryNode> {
    parse_paths(cell).iter().flat_map(|p| walk_path(p)).collect()
}

/// Distinct slugs of every level named in a cell, in first-seen order
pub fn slugs(cell: Option<&str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for node in nodes(cell) {
        if !seen.contains(&node.slug) {
            seen.push(node.slug);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_paths() {
        let paths = parse_paths(Some(" Mobilier > Chaises | Extérieur>Bancs|  "));
        assert_eq!(
            paths,
            vec![
                vec!["Mobilier".to_string(), "Chaises".to_string()],
                vec!["Extérieur".to_string(), "Bancs".to_string()],
            ]
        );
        assert!(parse_paths(None).is_empty());
    }

    #[test]
    fn test_walk_path_links_parents() {
        let nodes = walk_path(&["Mobilier".to_string(), "Chaises".to_string()]);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].slug, "mobilier");
        assert_eq!(nodes[0].parent, None);
        assert_eq!(nodes[1].slug, "mobilier-chaises");
        assert_eq!(nodes[1].parent.as_deref(), Some("mobilier"));
        assert_eq!(nodes[1].name, "Chaises");
    }

    #[test]
    fn test_walk_path_skips_unsluggable_level() {
        let nodes = walk_path(&["Déco".to_string(), "%%".to_string(), "Vases".to_string()]);
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].slug, "deco-vases");
        assert_eq!(nodes[1].parent.as_deref(), Some("deco"));
    }

    #[test]
    fn test_entities_in_names_are_decoded() {
        let nodes = nodes(Some("Tables &amp; Chaises"));
        assert_eq!(nodes[0].name, "Tables & Chaises");
        assert_eq!(nodes[0].slug, "tables-chaises");
    }

    #[test]
    fn test_slugs_are_distinct() {
        assert_eq!(
            slugs(Some("Mobilier > Chaises | Mobilier > Tables")),
            vec!["mobilier", "mobilier-chaises", "mobilier-tables"]
        );
    }
}
