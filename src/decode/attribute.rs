//! Attribute axis decoders: multi-value cells, flag encodings and names

use crate::core::slug::slugify;
use crate::decode::scalar;

/// Prefix carried by global (taxonomy) attribute columns, e.g. `pa_couleur`
pub const TAXONOMY_PREFIX: &str = "pa_";

/// Split a `|`-delimited cell into trimmed, non-empty, first-seen-unique values
pub fn split_multi(cell: Option<&str>) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for part in cell.unwrap_or_default().split('|') {
        let part = part.trim();
        if !part.is_empty() && !values.iter().any(|v| v == part) {
            values.push(part.to_string());
        }
    }
    values
}

/// Attribute slug for a technical column suffix (`pa_couleur` -> `couleur`)
pub fn attribute_slug(technical: &str) -> String {
    slugify(strip_prefix(technical))
}

/// Human display name for a technical column suffix
/// (`pa_taille_assise` -> `Taille Assise`)
pub fn display_name(technical: &str) -> String {
    strip_prefix(technical)
        .split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_prefix(technical: &str) -> &str {
    let trimmed = technical.trim();
    trimmed.strip_prefix(TAXONOMY_PREFIX).unwrap_or(trimmed)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Flags attached to one attribute axis of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisFlags {
    pub position: Option<i64>,
    pub visible: bool,
    pub variation: bool,
}

impl Default for AxisFlags {
    fn default() -> Self {
        Self {
            position: None,
            visible: true,
            variation: false,
        }
    }
}

/// Decode a companion data cell
///
/// Three parts read as `position|visible|variation`, two parts as
/// `visible|variation`. Anything else leaves the defaults (visible, not a
/// variation axis).
pub fn parse_flags(cell: Option<&str>) -> AxisFlags {
    let Some(cell) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return AxisFlags::default();
    };
    let parts: Vec<&str> = cell.split('|').map(str::trim).collect();
    match parts.as_slice() {
        [position, visible, variation] => AxisFlags {
            position: scalar::integer(Some(position)),
            visible: scalar::boolean(Some(visible)),
            variation: scalar::boolean(Some(variation)),
        },
        [visible, variation] => AxisFlags {
            position: None,
            visible: scalar::boolean(Some(visible)),
            variation: scalar::boolean(Some(variation)),
        },
        _ => AxisFlags::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multi() {
        assert_eq!(
            split_multi(Some(" Rouge | Bleu ||Rouge")),
            vec!["Rouge".to_string(), "Bleu".to_string()]
        );
        assert!(split_multi(Some("  ")).is_empty());
        assert!(split_multi(None).is_empty());
    }

    #[test]
    fn test_attribute_names() {
        assert_eq!(attribute_slug("pa_couleur"), "couleur");
        assert_eq!(attribute_slug("pa_Taille_Assise"), "taille-assise");
        assert_eq!(display_name("pa_couleur"), "Couleur");
        assert_eq!(display_name("pa_taille_assise"), "Taille Assise");
        assert_eq!(display_name("pa_hauteur-max"), "Hauteur Max");
        assert_eq!(display_name("matiere"), "Matiere");
    }

    #[test]
    fn test_parse_flags_three_parts() {
        assert_eq!(
            parse_flags(Some("2|1|1")),
            AxisFlags {
                position: Some(2),
                visible: true,
                variation: true
            }
        );
    }

    #[test]
    fn test_parse_flags_two_parts() {
        assert_eq!(
            parse_flags(Some("0|1")),
            AxisFlags {
                position: None,
                visible: false,
                variation: true
            }
        );
    }

    #[test]
    fn test_parse_flags_defaults() {
        assert_eq!(parse_flags(None), AxisFlags::default());
        assert_eq!(parse_flags(Some("garbage")), AxisFlags::default());
        assert!(parse_flags(Some("")).visible);
    }
}
