//! Type coercion between the application's value model and SQLite-family storage.
//!
//! Booleans travel as `0`/`1`, JSON documents and homogeneous lists as serialized text.
//! Every function here is a no-op (or a pure validation) on the Postgres backend, which
//! stores these types natively.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::Value as JsonValue;

mod rules;

pub use rules::CoercionRules;

use crate::error::SqlAdapterError;
use crate::results::{CustomDbRow, QueryResult};
use crate::types::{BackendKind, RowValues};

/// Prepare a boolean for binding.
///
/// Accepts `Bool`, the integers `0`/`1`, and `Null`.
///
/// # Errors
/// Returns `SqlAdapterError::Coercion` for any other value.
pub fn to_boolean(value: &RowValues, kind: BackendKind) -> Result<RowValues, SqlAdapterError> {
    let flag = match value {
        RowValues::Null => return Ok(RowValues::Null),
        RowValues::Bool(b) => *b,
        RowValues::Int(0) => false,
        RowValues::Int(1) => true,
        other => return Err(SqlAdapterError::coercion("boolean", other)),
    };
    Ok(if kind.is_reference_dialect() {
        RowValues::Bool(flag)
    } else {
        RowValues::Int(i64::from(flag))
    })
}

/// Restore a boolean read from storage. `1`, `"1"`, `"true"`, and `true` are truthy.
#[must_use]
pub fn from_boolean(value: RowValues, kind: BackendKind) -> RowValues {
    if kind.is_reference_dialect() {
        return value;
    }
    let flag = match &value {
        RowValues::Null => return RowValues::Null,
        RowValues::Bool(b) => *b,
        RowValues::Int(i) => *i == 1,
        RowValues::Text(s) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    RowValues::Bool(flag)
}

/// Prepare a JSON document for binding.
///
/// `Text` input must already be valid JSON. Scalars are accepted as JSON scalars.
///
/// # Errors
/// Returns `SqlAdapterError::Coercion` for blobs and for text that does not parse.
pub fn to_json(value: &RowValues, kind: BackendKind) -> Result<RowValues, SqlAdapterError> {
    let document = match value {
        RowValues::Null => return Ok(RowValues::Null),
        RowValues::Text(s) => serde_json::from_str::<JsonValue>(s)
            .map_err(|_| SqlAdapterError::coercion("json", value))?,
        other => other
            .to_json_value()
            .ok_or_else(|| SqlAdapterError::coercion("json", other))?,
    };
    Ok(if kind.is_reference_dialect() {
        RowValues::JSON(document)
    } else {
        RowValues::Text(document.to_string())
    })
}

/// Restore a JSON document read from storage; unparsable text is returned as-is.
#[must_use]
pub fn from_json(value: RowValues, kind: BackendKind) -> RowValues {
    if kind.is_reference_dialect() {
        return value;
    }
    match value {
        RowValues::Text(s) => match serde_json::from_str::<JsonValue>(&s) {
            Ok(document) => RowValues::JSON(document),
            Err(_) => RowValues::Text(s),
        },
        other => other,
    }
}

/// Prepare a homogeneous list for binding. `Null` elements are ignored by the
/// homogeneity check.
///
/// Elements must survive the text encoding unchanged: timestamps, blobs, non-finite
/// floats and JSON scalars or arrays wrapped in `RowValues::JSON` are rejected, since
/// they would read back as a different variant.
///
/// # Errors
/// Returns `SqlAdapterError::Coercion` for mixed or unencodable elements and non-lists.
pub fn to_array(value: &RowValues, kind: BackendKind) -> Result<RowValues, SqlAdapterError> {
    let items = match value {
        RowValues::Null => return Ok(RowValues::Null),
        RowValues::Array(items) => items.clone(),
        RowValues::JSON(JsonValue::Array(items)) => items
            .iter()
            .cloned()
            .map(RowValues::from_json_element)
            .collect(),
        other => return Err(SqlAdapterError::coercion("array", other)),
    };
    if !is_homogeneous(&items) || !items.iter().all(encodes_as_element) {
        return Err(SqlAdapterError::coercion("array", value));
    }
    if kind.is_reference_dialect() {
        return Ok(RowValues::Array(items));
    }
    let encoded = RowValues::Array(items)
        .to_json_value()
        .ok_or_else(|| SqlAdapterError::coercion("array", value))?;
    Ok(RowValues::Text(encoded.to_string()))
}

/// Restore a list read from storage. Text that is not a JSON array becomes an empty list.
#[must_use]
pub fn from_array(value: RowValues, kind: BackendKind) -> RowValues {
    if kind.is_reference_dialect() {
        return value;
    }
    match value {
        RowValues::Null => RowValues::Null,
        array @ RowValues::Array(_) => array,
        RowValues::Text(s) => match serde_json::from_str::<JsonValue>(&s) {
            Ok(JsonValue::Array(items)) => json_items(items),
            _ => RowValues::Array(Vec::new()),
        },
        RowValues::JSON(JsonValue::Array(items)) => json_items(items),
        _ => RowValues::Array(Vec::new()),
    }
}

fn json_items(items: Vec<JsonValue>) -> RowValues {
    RowValues::Array(items.into_iter().map(RowValues::from_json_element).collect())
}

fn is_homogeneous(items: &[RowValues]) -> bool {
    let mut seen: Option<&'static str> = None;
    for item in items.iter().filter(|v| !v.is_null()) {
        match (seen, item.type_name()) {
            (None, name) => seen = Some(name),
            (Some(expected), name) if expected != name => return false,
            _ => {}
        }
    }
    true
}

/// Whether `from_json_element` restores `item` from its JSON form.
fn encodes_as_element(item: &RowValues) -> bool {
    match item {
        RowValues::Null | RowValues::Int(_) | RowValues::Text(_) | RowValues::Bool(_) => true,
        RowValues::Float(f) => f.is_finite(),
        RowValues::JSON(document) => document.is_object(),
        RowValues::Array(items) => items.iter().all(encodes_as_element),
        RowValues::Timestamp(_) | RowValues::Blob(_) => false,
    }
}

/// Coercion bound to one backend and one rule set.
///
/// [`Database`](crate::Database) owns one and applies it to every parameter list and
/// every returned row.
#[derive(Debug, Clone)]
pub struct Coercer {
    kind: BackendKind,
    rules: Arc<CoercionRules>,
}

impl Coercer {
    #[must_use]
    pub fn new(kind: BackendKind, rules: Arc<CoercionRules>) -> Self {
        Self { kind, rules }
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    #[must_use]
    pub fn rules(&self) -> &CoercionRules {
        &self.rules
    }

    /// Convert parameters into storable values: booleans to integers, JSON and lists
    /// to text. Borrowed unchanged on Postgres or when nothing needs converting.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Coercion` for malformed JSON or list parameters.
    pub fn bind_params<'a>(
        &self,
        params: &'a [RowValues],
    ) -> Result<Cow<'a, [RowValues]>, SqlAdapterError> {
        let needs_conversion = |v: &RowValues| {
            matches!(
                v,
                RowValues::Bool(_) | RowValues::JSON(_) | RowValues::Array(_)
            )
        };
        if self.kind.is_reference_dialect() || !params.iter().any(needs_conversion) {
            return Ok(Cow::Borrowed(params));
        }
        params
            .iter()
            .map(|value| match value {
                RowValues::Bool(_) => to_boolean(value, self.kind),
                RowValues::JSON(_) => to_json(value, self.kind),
                RowValues::Array(_) => to_array(value, self.kind),
                other => Ok(other.clone()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Cow::Owned)
    }

    /// Restore the flagged columns of one row in place.
    pub fn process_row(&self, row: &mut CustomDbRow) {
        if self.kind.is_reference_dialect() || self.rules.is_empty() {
            return;
        }
        let columns = Arc::clone(&row.column_names);
        for (name, slot) in columns.iter().zip(row.rows.iter_mut()) {
            let restore: Option<fn(RowValues, BackendKind) -> RowValues> =
                if self.rules.is_boolean(name) {
                    Some(from_boolean)
                } else if self.rules.is_json(name) {
                    Some(from_json)
                } else if self.rules.is_array(name) {
                    Some(from_array)
                } else {
                    None
                };
            if let Some(restore) = restore {
                let value = std::mem::replace(slot, RowValues::Null);
                *slot = restore(value, self.kind);
            }
        }
    }

    pub fn process_rows(&self, result: &mut QueryResult) {
        for row in &mut result.rows {
            self.process_row(row);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const ALL: [BackendKind; 3] = [
        BackendKind::Postgres,
        BackendKind::Libsql,
        BackendKind::Sqlite,
    ];

    #[test]
    fn boolean_round_trip() -> Result<(), SqlAdapterError> {
        for kind in ALL {
            for v in [RowValues::Bool(true), RowValues::Bool(false), RowValues::Null] {
                assert_eq!(from_boolean(to_boolean(&v, kind)?, kind), v, "{kind}");
            }
        }
        assert_eq!(
            to_boolean(&RowValues::Bool(true), BackendKind::Sqlite)?,
            RowValues::Int(1)
        );
        assert_eq!(
            to_boolean(&RowValues::Int(0), BackendKind::Postgres)?,
            RowValues::Bool(false)
        );
        Ok(())
    }

    #[test]
    fn boolean_rejects_other_values() {
        for bad in [
            RowValues::Int(2),
            RowValues::Text("yes".into()),
            RowValues::Blob(vec![1]),
        ] {
            assert!(matches!(
                to_boolean(&bad, BackendKind::Sqlite),
                Err(SqlAdapterError::Coercion { target: "boolean", .. })
            ));
        }
    }

    #[test]
    fn boolean_truthiness_on_read() {
        let k = BackendKind::Libsql;
        assert_eq!(from_boolean(RowValues::Text("1".into()), k), RowValues::Bool(true));
        assert_eq!(from_boolean(RowValues::Text("TRUE".into()), k), RowValues::Bool(true));
        assert_eq!(from_boolean(RowValues::Int(0), k), RowValues::Bool(false));
        assert_eq!(from_boolean(RowValues::Text("no".into()), k), RowValues::Bool(false));
        assert_eq!(
            from_boolean(RowValues::Int(1), BackendKind::Postgres),
            RowValues::Int(1)
        );
    }

    #[test]
    fn json_round_trip() -> Result<(), SqlAdapterError> {
        let doc = RowValues::JSON(json!({"columns": ["a", "b"], "width": 3}));
        for kind in ALL {
            assert_eq!(from_json(to_json(&doc, kind)?, kind), doc, "{kind}");
        }
        assert_eq!(
            to_json(&doc, BackendKind::Sqlite)?,
            RowValues::Text(r#"{"columns":["a","b"],"width":3}"#.into())
        );
        Ok(())
    }

    #[test]
    fn json_validates_text_and_keeps_unparsable_reads() {
        assert!(to_json(&RowValues::Text("{oops".into()), BackendKind::Sqlite).is_err());
        assert!(to_json(&RowValues::Blob(vec![0]), BackendKind::Postgres).is_err());
        assert_eq!(
            from_json(RowValues::Text("{oops".into()), BackendKind::Sqlite),
            RowValues::Text("{oops".into())
        );
    }

    #[test]
    fn array_round_trip() -> Result<(), SqlAdapterError> {
        let list = RowValues::Array(vec![
            RowValues::Text("north".into()),
            RowValues::Null,
            RowValues::Text("south".into()),
        ]);
        for kind in ALL {
            assert_eq!(from_array(to_array(&list, kind)?, kind), list, "{kind}");
        }
        assert_eq!(
            to_array(&list, BackendKind::Libsql)?,
            RowValues::Text(r#"["north",null,"south"]"#.into())
        );

        let nested = RowValues::Array(vec![RowValues::Array(vec![
            RowValues::Int(1),
            RowValues::Int(2),
        ])]);
        assert_eq!(
            from_array(to_array(&nested, BackendKind::Sqlite)?, BackendKind::Sqlite),
            nested
        );
        Ok(())
    }

    #[test]
    fn array_rejects_elements_that_read_back_differently() {
        let at = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .expect("valid timestamp");
        let stamps = RowValues::Array(vec![RowValues::Timestamp(at)]);
        for kind in ALL {
            assert!(to_array(&stamps, kind).is_err(), "{kind}");
        }
        let wrapped = RowValues::Array(vec![RowValues::JSON(json!("west"))]);
        assert!(to_array(&wrapped, BackendKind::Libsql).is_err());
        let blobs = RowValues::Array(vec![RowValues::Blob(vec![1, 2])]);
        assert!(to_array(&blobs, BackendKind::Sqlite).is_err());
    }

    #[test]
    fn array_rejects_mixed_elements() {
        let mixed = RowValues::Array(vec![RowValues::Int(1), RowValues::Text("a".into())]);
        assert!(to_array(&mixed, BackendKind::Sqlite).is_err());
        assert!(to_array(&RowValues::Int(1), BackendKind::Sqlite).is_err());
    }

    #[test]
    fn unparsable_array_reads_as_empty() {
        assert_eq!(
            from_array(RowValues::Text("not a list".into()), BackendKind::Sqlite),
            RowValues::Array(Vec::new())
        );
        assert_eq!(
            from_array(RowValues::Null, BackendKind::Sqlite),
            RowValues::Null
        );
    }

    #[test]
    fn bind_params_converts_for_sqlite_family_only() -> Result<(), SqlAdapterError> {
        let params = vec![
            RowValues::Int(1),
            RowValues::Bool(true),
            RowValues::JSON(json!({"a": 1})),
        ];
        let pg = Coercer::new(BackendKind::Postgres, Arc::new(CoercionRules::default()));
        assert!(matches!(pg.bind_params(&params)?, Cow::Borrowed(_)));

        let lite = Coercer::new(BackendKind::Sqlite, Arc::new(CoercionRules::default()));
        assert_eq!(
            &*lite.bind_params(&params)?,
            &[
                RowValues::Int(1),
                RowValues::Int(1),
                RowValues::Text(r#"{"a":1}"#.into())
            ]
        );
        Ok(())
    }

    #[test]
    fn process_row_restores_flagged_columns() {
        let coercer = Coercer::new(
            BackendKind::Sqlite,
            Arc::new(CoercionRules::default().with_array("tags")),
        );
        let mut row = CustomDbRow::new(
            Arc::new(vec![
                "id".into(),
                "is_deleted".into(),
                "metadata".into(),
                "tags".into(),
            ]),
            vec![
                RowValues::Int(1),
                RowValues::Int(0),
                RowValues::Text(r#"{"k":"v"}"#.into()),
                RowValues::Text(r#"["a"]"#.into()),
            ],
        );
        coercer.process_row(&mut row);
        assert_eq!(row.get("id"), Some(&RowValues::Int(1)));
        assert_eq!(row.get("is_deleted"), Some(&RowValues::Bool(false)));
        assert_eq!(row.get("metadata"), Some(&RowValues::JSON(json!({"k": "v"}))));
        assert_eq!(
            row.get("tags"),
            Some(&RowValues::Array(vec![RowValues::Text("a".into())]))
        );
    }
}
