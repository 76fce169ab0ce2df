//! Statement dispatch: classification, result normalization, and the shared
//! [`Executor`] contract implemented by both `Database` and `Transaction`.

use std::borrow::Cow;

use async_trait::async_trait;

mod normalize;
mod returning;
mod statement;

pub use normalize::normalize;
pub use statement::{StatementInfo, StatementKind, WriteKind};

use crate::backend::RawOutcome;
use crate::coercion::Coercer;
use crate::error::{SqlAdapterError, truncate_sql};
use crate::results::{CustomDbRow, QueryResult};
use crate::translation;
use crate::types::{BackendKind, RowValues};

/// Anything that runs canonical SQL: a [`Database`](crate::Database) or an open
/// [`Transaction`](crate::Transaction).
///
/// ```rust,no_run
/// use sql_adapter::prelude::*;
///
/// async fn archive<E: Executor + ?Sized>(db: &E, id: i64) -> Result<usize, SqlAdapterError> {
///     let res = db
///         .query("UPDATE opportunities SET is_deleted = ? WHERE id = ?", &[
///             RowValues::Bool(true),
///             RowValues::Int(id),
///         ])
///         .await?;
///     Ok(res.row_count)
/// }
/// ```
#[async_trait]
pub trait Executor: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Translate, bind, execute and normalize one statement.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Execution` on driver failure, `Coercion` for malformed
    /// parameters, and `Closed`/`TransactionInProgress` when the handle cannot run
    /// statements right now.
    async fn query(&self, sql: &str, params: &[RowValues])
    -> Result<QueryResult, SqlAdapterError>;

    /// Run an `INSERT ... RETURNING *` and return the inserted row.
    ///
    /// Postgres returns the row directly. SQLite-family backends run the insert without
    /// the clause, then read the row back by its rowid from `table`. Returns `None` when
    /// no row was inserted (`INSERT OR IGNORE`, `ON CONFLICT DO NOTHING`).
    ///
    /// # Errors
    /// Propagates statement errors; `table` must be a plain (optionally
    /// schema-qualified) identifier.
    async fn insert_with_returning(
        &self,
        sql: &str,
        params: &[RowValues],
        table: &str,
    ) -> Result<Option<CustomDbRow>, SqlAdapterError> {
        returning::insert_with_returning(self, sql, params, table).await
    }

    /// Run an `UPDATE ... RETURNING *` and return the first updated row.
    ///
    /// SQLite-family backends re-select with `SELECT * FROM <table> WHERE <where_clause>`
    /// bound to `where_params`. Only atomic when run on a transaction.
    ///
    /// # Errors
    /// Propagates statement errors; `table` must be a plain identifier.
    async fn update_with_returning(
        &self,
        sql: &str,
        params: &[RowValues],
        table: &str,
        where_clause: &str,
        where_params: &[RowValues],
    ) -> Result<Option<CustomDbRow>, SqlAdapterError> {
        returning::update_with_returning(self, sql, params, table, where_clause, where_params)
            .await
    }
}

/// A statement ready for a backend: translated, classified, parameters coerced.
pub(crate) struct PreparedStatement<'a> {
    pub(crate) sql: Cow<'a, str>,
    pub(crate) info: StatementInfo,
    pub(crate) params: Cow<'a, [RowValues]>,
}

pub(crate) fn prepare<'a>(
    coercer: &Coercer,
    sql: &'a str,
    params: &'a [RowValues],
) -> Result<PreparedStatement<'a>, SqlAdapterError> {
    let sql = translation::translate(sql, coercer.kind());
    let info = StatementInfo::classify(&sql);
    let params = coercer.bind_params(params)?;
    tracing::debug!(
        backend = %coercer.kind(),
        kind = ?info.kind,
        sql = %truncate_sql(&sql),
        params = params.len(),
        "executing statement"
    );
    Ok(PreparedStatement { sql, info, params })
}

pub(crate) fn finish(coercer: &Coercer, info: &StatementInfo, outcome: RawOutcome) -> QueryResult {
    let mut result = normalize(info, outcome);
    coercer.process_rows(&mut result);
    result
}
