use crate::error::SqlAdapterError;
use crate::results::CustomDbRow;
use crate::types::RowValues;

use super::Executor;

pub(super) async fn insert_with_returning<E: Executor + ?Sized>(
    exec: &E,
    sql: &str,
    params: &[RowValues],
    table: &str,
) -> Result<Option<CustomDbRow>, SqlAdapterError> {
    check_table(table)?;
    let result = exec.query(sql, params).await?;
    if exec.kind().is_reference_dialect() {
        return Ok(result.rows.into_iter().next());
    }
    let Some(rowid) = result.last_id else {
        return Ok(None);
    };
    let select = format!("SELECT * FROM {table} WHERE rowid = $1");
    let fetched = exec.query(&select, &[RowValues::Int(rowid)]).await?;
    Ok(fetched.rows.into_iter().next())
}

pub(super) async fn update_with_returning<E: Executor + ?Sized>(
    exec: &E,
    sql: &str,
    params: &[RowValues],
    table: &str,
    where_clause: &str,
    where_params: &[RowValues],
) -> Result<Option<CustomDbRow>, SqlAdapterError> {
    check_table(table)?;
    let result = exec.query(sql, params).await?;
    if exec.kind().is_reference_dialect() {
        return Ok(result.rows.into_iter().next());
    }
    let select = format!("SELECT * FROM {table} WHERE {where_clause}");
    let fetched = exec.query(&select, where_params).await?;
    Ok(fetched.rows.into_iter().next())
}

fn check_table(table: &str) -> Result<(), SqlAdapterError> {
    let valid = !table.is_empty()
        && table
            .split('.')
            .all(|part| {
                part.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
    if valid {
        Ok(())
    } else {
        Err(SqlAdapterError::caller(format!("invalid table name: {table:?}")))
    }
}
