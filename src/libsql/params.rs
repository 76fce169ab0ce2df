use deadpool_libsql::libsql::Value;

use crate::coercion;
use crate::error::SqlAdapterError;
use crate::types::{BackendKind, RowValues};

/// Container for libsql parameters
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// Convert from a slice of `RowValues` to libsql parameters
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Coercion` for lists that cannot be stored as JSON text.
    pub fn convert(params: &[RowValues]) -> Result<Params, SqlAdapterError> {
        let mut libsql_params = Vec::with_capacity(params.len());

        for param in params {
            let libsql_value = match param {
                RowValues::Int(i) => Value::Integer(*i),
                RowValues::Float(f) => Value::Real(*f),
                RowValues::Text(s) => Value::Text(s.clone()),
                RowValues::Bool(b) => Value::Integer(i64::from(*b)),
                RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
                RowValues::Null => Value::Null,
                RowValues::JSON(jval) => Value::Text(jval.to_string()),
                RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
                RowValues::Array(_) => match coercion::to_array(param, BackendKind::Libsql)? {
                    RowValues::Text(encoded) => Value::Text(encoded),
                    _ => Value::Null,
                },
            };
            libsql_params.push(libsql_value);
        }

        Ok(Params(libsql_params))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to owned vector for use with libsql API
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}
