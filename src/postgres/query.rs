use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use deadpool_postgres::Object;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio_postgres::types::FromSql;
use tokio_postgres::{Row, Statement};

use crate::backend::RawOutcome;
use crate::error::{DriverError, SqlAdapterError};
use crate::executor::{StatementInfo, StatementKind};
use crate::results::QueryResult;
use crate::types::RowValues;

use super::params::Params;

fn opt<'a, T, F>(row: &'a Row, idx: usize, wrap: F) -> Result<RowValues, tokio_postgres::Error>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> RowValues,
{
    let val: Option<T> = row.try_get(idx)?;
    Ok(val.map_or(RowValues::Null, wrap))
}

fn array<'a, T, F>(row: &'a Row, idx: usize, wrap: F) -> Result<RowValues, tokio_postgres::Error>
where
    T: FromSql<'a>,
    F: Fn(T) -> RowValues,
{
    let val: Option<Vec<Option<T>>> = row.try_get(idx)?;
    Ok(val.map_or(RowValues::Null, |items| {
        RowValues::Array(
            items
                .into_iter()
                .map(|item| item.map_or(RowValues::Null, &wrap))
                .collect(),
        )
    }))
}

fn numeric(d: Decimal) -> RowValues {
    d.to_f64().map_or(RowValues::Text(d.to_string()), RowValues::Float)
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// `timestamptz` is normalized to UTC, `numeric` becomes `Float`, `uuid`/`date` become
/// `Text`, and one-dimensional arrays of common element types become `Array`.
///
/// # Errors
/// Returns the driver error if the column cannot be decoded.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, tokio_postgres::Error> {
    let type_info = row.columns()[idx].type_();

    match type_info.name() {
        "int2" => opt(row, idx, |v: i16| RowValues::Int(i64::from(v))),
        "int4" => opt(row, idx, |v: i32| RowValues::Int(i64::from(v))),
        "int8" => opt(row, idx, RowValues::Int),
        "float4" => opt(row, idx, |v: f32| RowValues::Float(f64::from(v))),
        "float8" => opt(row, idx, RowValues::Float),
        "numeric" => opt(row, idx, numeric),
        "bool" => opt(row, idx, RowValues::Bool),
        "timestamp" => opt(row, idx, RowValues::Timestamp),
        "timestamptz" => opt(row, idx, |v: DateTime<Utc>| RowValues::Timestamp(v.naive_utc())),
        "date" => opt(row, idx, |v: NaiveDate| RowValues::Text(v.to_string())),
        "json" | "jsonb" => opt(row, idx, RowValues::JSON),
        "bytea" => opt(row, idx, RowValues::Blob),
        "uuid" => opt(row, idx, |v: uuid::Uuid| RowValues::Text(v.to_string())),
        "_text" | "_varchar" => array(row, idx, RowValues::Text),
        "_int2" => array(row, idx, |v: i16| RowValues::Int(i64::from(v))),
        "_int4" => array(row, idx, |v: i32| RowValues::Int(i64::from(v))),
        "_int8" => array(row, idx, RowValues::Int),
        "_bool" => array(row, idx, RowValues::Bool),
        "_float8" => array(row, idx, RowValues::Float),
        "_numeric" => array(row, idx, numeric),
        "_uuid" => array(row, idx, |v: uuid::Uuid| RowValues::Text(v.to_string())),
        "_jsonb" | "_json" => array(row, idx, RowValues::JSON),
        _ => opt(row, idx, RowValues::Text),
    }
}

/// Build a result set using statement metadata for column names.
///
/// # Errors
/// Returns errors from row value extraction.
pub fn build_result_set_from_statement(
    stmt: &Statement,
    rows: &[Row],
) -> Result<QueryResult, tokio_postgres::Error> {
    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    let column_count = column_names.len();

    let mut result_set = QueryResult::with_capacity(rows.len());
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let mut row_values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Execute one statement on a pooled client.
///
/// Parameterless statements that are neither reads nor writes run through the simple
/// query protocol so multi-statement scripts work. Everything else goes through the
/// client's statement cache: statements that return columns are queried, the rest
/// executed for their affected-row count.
///
/// # Errors
/// Returns `SqlAdapterError::Execution` carrying the SQL and parameters on driver errors.
pub async fn execute_on(
    client: &Object,
    sql: &str,
    info: &StatementInfo,
    params: &[RowValues],
) -> Result<RawOutcome, SqlAdapterError> {
    let wrap = |e: tokio_postgres::Error| SqlAdapterError::execution(sql, params, DriverError::from(e));

    if matches!(info.kind, StatementKind::Other) && params.is_empty() {
        client.batch_execute(sql).await.map_err(wrap)?;
        return Ok(RawOutcome::Empty);
    }

    let stmt = client.prepare_cached(sql).await.map_err(wrap)?;
    let converted = Params::convert(params);

    if info.produces_rows() || !stmt.columns().is_empty() {
        let rows = client.query(&stmt, converted.as_refs()).await.map_err(wrap)?;
        let result_set = build_result_set_from_statement(&stmt, &rows).map_err(wrap)?;
        return Ok(RawOutcome::Rows(result_set));
    }

    let rows_affected = client
        .execute(&stmt, converted.as_refs())
        .await
        .map_err(wrap)?;
    Ok(RawOutcome::Changes {
        rows_affected,
        last_insert_id: None,
    })
}

