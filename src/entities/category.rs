//! Category entity - one node of the catalogue taxonomy tree

use serde::{Deserialize, Serialize};

/// A category row as written to the store
///
/// `parent_id` is `None` for roots. The resolver only ever builds a child
/// record once its parent's id has been read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
    pub position: i64,
}
