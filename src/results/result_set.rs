use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// The canonical result of every statement, whatever the backend.
///
/// `rows` is always present (empty for writes), `row_count` is `rows.len()` for reads
/// and the affected-row count for writes. Serializes as
/// `{"rows": [...], "rowCount": n, "lastID": id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    /// The rows returned by the query
    pub rows: Vec<CustomDbRow>,
    /// Rows returned (reads) or affected (writes)
    #[serde(rename = "rowCount")]
    pub row_count: usize,
    /// Last inserted row id, when the backend reports one for an INSERT
    #[serde(rename = "lastID", skip_serializing_if = "Option::is_none")]
    pub last_id: Option<i64>,
    #[serde(skip)]
    column_names: Option<Arc<Vec<String>>>,
    #[serde(skip)]
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl QueryResult {
    /// Create a new result with a known row capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> QueryResult {
        QueryResult {
            rows: Vec::with_capacity(capacity),
            ..QueryResult::default()
        }
    }

    /// Result of a write: no rows, `row_count` affected.
    #[must_use]
    pub fn affected(row_count: usize, last_id: Option<i64>) -> QueryResult {
        QueryResult {
            row_count,
            last_id,
            ..QueryResult::default()
        }
    }

    /// Set the column names for this result (shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row built from values in column order.
    ///
    /// Ignored until column names have been set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(cache)) = (&self.column_names, &self.column_index) {
            self.rows.push(CustomDbRow::with_cache(
                Arc::clone(column_names),
                Arc::clone(cache),
                row_values,
            ));
            self.row_count += 1;
        }
    }

    /// First row, the usual target of `RETURNING *` lookups.
    #[must_use]
    pub fn first(&self) -> Option<&CustomDbRow> {
        self.rows.first()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_share_column_lookup() {
        let mut rs = QueryResult::with_capacity(2);
        rs.set_column_names(Arc::new(vec!["id".into(), "name".into()]));
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        rs.add_row_values(vec![RowValues::Int(2), RowValues::Text("b".into())]);

        assert_eq!(rs.row_count, 2);
        assert_eq!(rs.rows[1].get("name"), Some(&RowValues::Text("b".into())));
        assert!(rs.rows[0].get("missing").is_none());
    }

    #[test]
    fn serializes_to_canonical_shape() {
        let mut rs = QueryResult::with_capacity(1);
        rs.set_column_names(Arc::new(vec!["id".into(), "ok".into()]));
        rs.add_row_values(vec![RowValues::Int(1), RowValues::Bool(true)]);
        let json = serde_json::to_value(&rs).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"rows": [{"id": 1, "ok": true}], "rowCount": 1})
        );

        let write = QueryResult::affected(3, Some(9));
        let json = serde_json::to_value(&write).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"rows": [], "rowCount": 3, "lastID": 9})
        );
    }
}
