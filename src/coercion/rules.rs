use std::collections::HashSet;

const DEFAULT_BOOLEAN_COLUMNS: &[&str] = &["is_deleted", "is_all_day", "is_verified", "is_active"];
const DEFAULT_JSON_COLUMNS: &[&str] = &["column_settings", "roles", "metadata"];

/// Which result columns carry booleans, JSON documents, or homogeneous lists.
///
/// SQLite-family engines store these as integers and text; rows read back from them are
/// restored to `Bool`, `JSON` and `Array` for the named columns.
///
/// ```rust
/// use sql_adapter::prelude::*;
///
/// let rules = CoercionRules::default()
///     .with_boolean("is_won")
///     .with_array("tags");
/// assert!(rules.is_boolean("is_deleted"));
/// assert!(rules.is_array("tags"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionRules {
    booleans: HashSet<String>,
    json: HashSet<String>,
    arrays: HashSet<String>,
}

impl Default for CoercionRules {
    fn default() -> Self {
        Self {
            booleans: DEFAULT_BOOLEAN_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            json: DEFAULT_JSON_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            arrays: HashSet::new(),
        }
    }
}

impl CoercionRules {
    /// Rules that coerce nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            booleans: HashSet::new(),
            json: HashSet::new(),
            arrays: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_boolean(mut self, column: impl Into<String>) -> Self {
        self.booleans.insert(column.into());
        self
    }

    #[must_use]
    pub fn with_json(mut self, column: impl Into<String>) -> Self {
        self.json.insert(column.into());
        self
    }

    #[must_use]
    pub fn with_array(mut self, column: impl Into<String>) -> Self {
        self.arrays.insert(column.into());
        self
    }

    #[must_use]
    pub fn is_boolean(&self, column: &str) -> bool {
        self.booleans.contains(column)
    }

    #[must_use]
    pub fn is_json(&self, column: &str) -> bool {
        self.json.contains(column)
    }

    #[must_use]
    pub fn is_array(&self, column: &str) -> bool {
        self.arrays.contains(column)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.booleans.is_empty() && self.json.is_empty() && self.arrays.is_empty()
    }
}
