use std::sync::Arc;

use deadpool_libsql::libsql::{Connection, Rows, Value};

use crate::backend::RawOutcome;
use crate::error::{DriverError, SqlAdapterError};
use crate::executor::{StatementInfo, StatementKind};
use crate::results::QueryResult;
use crate::types::RowValues;

use super::params::Params;

/// Build a result set from a libsql query execution
///
/// # Errors
/// Returns the driver error if a row cannot be fetched or read.
pub async fn build_result_set(mut rows: Rows) -> Result<QueryResult, DriverError> {
    let column_count = rows.column_count();
    let column_names: Vec<String> = (0..column_count)
        .map(|i| {
            rows.column_name(i)
                .map_or_else(|| format!("column_{i}"), str::to_string)
        })
        .collect();
    let col_count = column_names.len();

    let mut result_set = QueryResult::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    while let Some(row) = rows.next().await? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..column_count {
            row_values.push(libsql_extract_value(row.get_value(i)?));
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

fn libsql_extract_value(value: Value) -> RowValues {
    match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(bytes) => RowValues::Blob(bytes),
    }
}

/// Execute one statement on a libsql connection.
///
/// Zero parameters use the bare-string call, otherwise the positional value list.
/// Row-producing statements are queried; parameterless statements that are neither
/// reads nor writes run as a batch; everything else reports changes and, for inserts,
/// the last rowid.
///
/// # Errors
/// Returns `SqlAdapterError::Execution` carrying the SQL and parameters on driver errors.
pub async fn execute_on(
    conn: &Connection,
    sql: &str,
    info: &StatementInfo,
    params: &[RowValues],
) -> Result<RawOutcome, SqlAdapterError> {
    let values = Params::convert(params)?;
    let wrap = |e: DriverError| SqlAdapterError::execution(sql, params, e);

    if info.produces_rows() {
        let rows = if values.is_empty() {
            conn.query(sql, ()).await
        } else {
            conn.query(sql, values.into_vec()).await
        }
        .map_err(|e| wrap(e.into()))?;
        return build_result_set(rows).await.map(RawOutcome::Rows).map_err(wrap);
    }

    if matches!(info.kind, StatementKind::Other) && values.is_empty() {
        conn.execute_batch(sql).await.map_err(|e| wrap(e.into()))?;
        return Ok(RawOutcome::Empty);
    }

    let changed = if values.is_empty() {
        conn.execute(sql, ()).await
    } else {
        conn.execute(sql, values.into_vec()).await
    }
    .map_err(|e| wrap(e.into()))?;
    Ok(RawOutcome::Changes {
        rows_affected: changed,
        last_insert_id: (info.is_insert() && changed > 0).then(|| conn.last_insert_rowid()),
    })
}
