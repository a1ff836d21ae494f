//! Attribute and attribute-term entities

use serde::{Deserialize, Serialize};

/// Kind tag for attributes built from the export (all are term lists)
pub const SELECT_KIND: &str = "select";

/// A product attribute axis, e.g. `couleur`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub slug: String,
    pub name: String,
    pub kind: String,
}

impl Attribute {
    pub fn select(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            kind: SELECT_KIND.to_string(),
        }
    }
}

/// One allowed value of an attribute; `slug` is unique within the attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeTerm {
    pub attribute_id: i64,
    pub slug: String,
    pub name: String,
    pub position: i64,
}
