use std::sync::Arc;

use rusqlite::types::Value;
use rusqlite::{Connection, Statement, params_from_iter};

use crate::backend::RawOutcome;
use crate::executor::{StatementInfo, StatementKind};
use crate::results::QueryResult;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns `rusqlite::Error` if the column cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, rusqlite::Error> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a prepared statement and collect every row.
///
/// # Errors
/// Returns `rusqlite::Error` if execution or row extraction fails.
pub fn build_result_set(
    stmt: &mut Statement<'_>,
    params: &[Value],
) -> Result<QueryResult, rusqlite::Error> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut result_set = QueryResult::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows_iter = stmt.query(params_from_iter(params.iter()))?;
    while let Some(row) = rows_iter.next()? {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Execute one statement synchronously.
///
/// Parameterless statements that are neither reads nor writes (DDL scripts, pragmas
/// with side effects, transaction control) run as a batch so multi-statement scripts
/// work. Everything else is prepared: statements with result columns return their
/// rows, the rest report changes and, for inserts, the last rowid.
///
/// # Errors
/// Returns `rusqlite::Error` from preparation or execution.
pub fn execute_statement(
    conn: &Connection,
    sql: &str,
    info: &StatementInfo,
    params: &[Value],
) -> Result<RawOutcome, rusqlite::Error> {
    if matches!(info.kind, StatementKind::Other) && params.is_empty() {
        conn.execute_batch(sql)?;
        return Ok(RawOutcome::Empty);
    }

    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() > 0 {
        return build_result_set(&mut stmt, params).map(RawOutcome::Rows);
    }
    let changed = stmt.execute(params_from_iter(params.iter()))?;
    Ok(RawOutcome::Changes {
        rows_affected: changed as u64,
        last_insert_id: (info.is_insert() && changed > 0).then(|| conn.last_insert_rowid()),
    })
}
