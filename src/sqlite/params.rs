use rusqlite::types::Value;

use crate::coercion;
use crate::error::SqlAdapterError;
use crate::types::{BackendKind, RowValues};

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// # Errors
/// Returns `SqlAdapterError::Coercion` for lists that cannot be stored as JSON text.
pub fn row_value_to_sqlite_value(value: &RowValues) -> Result<Value, SqlAdapterError> {
    let converted = match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
        RowValues::Array(_) => match coercion::to_array(value, BackendKind::Sqlite)? {
            RowValues::Text(encoded) => Value::Text(encoded),
            _ => Value::Null,
        },
    };
    Ok(converted)
}

/// Positional `SQLite` parameters.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert adapter values into `SQLite` values.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Coercion` if a value has no `SQLite` representation.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlAdapterError> {
        params
            .iter()
            .map(row_value_to_sqlite_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Params)
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_adapter_values() -> Result<(), SqlAdapterError> {
        let ts = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .ok_or_else(|| SqlAdapterError::caller("bad date"))?;
        let params = Params::convert(&[
            RowValues::Bool(true),
            RowValues::Timestamp(ts),
            RowValues::Array(vec![RowValues::Int(1), RowValues::Int(2)]),
            RowValues::Null,
        ])?;
        assert_eq!(
            params.as_values(),
            &[
                Value::Integer(1),
                Value::Text("2024-03-01 09:30:00".into()),
                Value::Text("[1,2]".into()),
                Value::Null,
            ]
        );
        Ok(())
    }
}
