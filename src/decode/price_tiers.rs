//! Graduated-price tables
//!
//! The cell holds a JSON array, often HTML-entity encoded by the exporter:
//! `[{&quot;qty&quot;:1,&quot;discount&quot;:&quot;0&quot;},{&quot;qty&quot;:10,&quot;discount&quot;:&quot;5&quot;}]`.
//! The quantity-1 / zero-discount element stands for the base price and is
//! never returned as a tier.

use serde_json::Value;

use super::scalar::{decimal, decode_html_entities};
use super::FieldError;

const QUANTITY_KEYS: &[&str] = &["qty", "quantity"];
const VALUE_KEYS: &[&str] = &["discount", "value"];

/// One usable tier, before the owner's pricing mode is applied
#[derive(Debug, Clone, PartialEq)]
pub struct TierEntry {
    pub min_quantity: i64,
    pub value: f64,
    /// Index of the element in the source array
    pub position: i64,
}

/// Decoded tier table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TierTable {
    pub entries: Vec<TierEntry>,
    /// Elements dropped because their value was not numeric or their
    /// quantity truncates below 1
    pub unparsable: Vec<String>,
}

/// Decode a tier-table cell; a blank cell is an empty table
pub fn parse_tier_table(cell: Option<&str>) -> Result<TierTable, FieldError> {
    let Some(raw) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(TierTable::default());
    };

    let decoded = decode_html_entities(raw);
    let parsed: Value =
        serde_json::from_str(&decoded).map_err(|e| FieldError::TierTableJson(e.to_string()))?;
    let elements = match parsed {
        Value::Array(elements) => elements,
        other => return Err(FieldError::TierTableShape(json_kind(&other))),
    };

    let mut table = TierTable::default();
    for (idx, element) in elements.iter().enumerate() {
        let Value::Object(fields) = element else {
            table.unparsable.push(format!("element {idx} is not an object"));
            continue;
        };

        let quantity = first_of(fields, QUANTITY_KEYS).and_then(number);
        let Some(quantity) = quantity.filter(|q| *q > 0.0) else {
            continue;
        };
        // Quantities are whole units; a fraction is truncated
        let min_quantity = quantity.trunc() as i64;
        if min_quantity < 1 {
            table
                .unparsable
                .push(format!("element {idx}: quantity {quantity} is below 1"));
            continue;
        }

        let value = match first_of(fields, VALUE_KEYS) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.trim().is_empty() => continue,
            Some(v) => match number(v) {
                Some(n) => n,
                None => {
                    table
                        .unparsable
                        .push(format!("element {idx}: value {v} is not a number"));
                    continue;
                }
            },
        };
        if value == 0.0 {
            continue;
        }

        table.entries.push(TierEntry {
            min_quantity,
            value,
            position: idx as i64,
        });
    }
    Ok(table)
}

fn first_of<'a>(fields: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| fields.get(*key))
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => decimal(Some(s)),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_row_is_not_a_tier() {
        let cell = r#"[{"qty":1,"discount":"0"},{"qty":10,"discount":"5"},{"qty":50,"discount":"12,5"}]"#;
        let table = parse_tier_table(Some(cell)).unwrap();
        assert_eq!(
            table.entries,
            vec![
                TierEntry { min_quantity: 10, value: 5.0, position: 1 },
                TierEntry { min_quantity: 50, value: 12.5, position: 2 },
            ]
        );
        assert!(table.unparsable.is_empty());
    }

    #[test]
    fn test_entity_encoded_cell() {
        let cell = "[{&quot;quantity&quot;:&quot;20&quot;,&quot;value&quot;:&quot;8.90&quot;}]";
        let table = parse_tier_table(Some(cell)).unwrap();
        assert_eq!(table.entries.len(), 1);
        assert_eq!(table.entries[0].min_quantity, 20);
        assert_eq!(table.entries[0].value, 8.9);
    }

    #[test]
    fn test_skips_non_positive_quantity_and_empty_values() {
        let cell = r#"[{"qty":0,"discount":5},{"qty":-3,"discount":5},{"qty":5,"discount":""},{"qty":5},{"qty":6,"discount":null}]"#;
        let table = parse_tier_table(Some(cell)).unwrap();
        assert!(table.entries.is_empty());
        assert!(table.unparsable.is_empty());
    }

    #[test]
    fn test_unparsable_value_is_reported() {
        let cell = r#"[{"qty":10,"discount":"cinq"},{"qty":20,"discount":"10"}]"#;
        let table = parse_tier_table(Some(cell)).unwrap();
        assert_eq!(table.entries.len(), 1);
        assert_eq!(table.entries[0].position, 1);
        assert_eq!(table.unparsable.len(), 1);
        assert!(table.unparsable[0].contains("element 0"));
    }

    #[test]
    fn test_fractional_quantity_below_one_is_reported() {
        let cell = r#"[{"qty":0.5,"discount":3},{"qty":10.7,"discount":5}]"#;
        let table = parse_tier_table(Some(cell)).unwrap();
        assert_eq!(
            table.entries,
            vec![TierEntry { min_quantity: 10, value: 5.0, position: 1 }]
        );
        assert_eq!(table.unparsable.len(), 1);
        assert!(table.unparsable[0].contains("quantity 0.5"));
    }

    #[test]
    fn test_structural_failures() {
        assert!(matches!(
            parse_tier_table(Some("[{\"qty\":")),
            Err(FieldError::TierTableJson(_))
        ));
        assert!(matches!(
            parse_tier_table(Some("{\"qty\":10}")),
            Err(FieldError::TierTableShape("object"))
        ));
        assert_eq!(parse_tier_table(Some("  ")).unwrap(), TierTable::default());
    }
}
