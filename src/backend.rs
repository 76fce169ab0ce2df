use std::borrow::Cow;

use async_trait::async_trait;

use crate::error::SqlAdapterError;
use crate::executor::StatementInfo;
use crate::results::QueryResult;
use crate::translation;
use crate::types::{BackendKind, RowValues};

/// What a driver produced for one statement, before normalization.
#[derive(Debug)]
pub enum RawOutcome {
    /// A row set (reads, or writes with `RETURNING`).
    Rows(QueryResult),
    /// A mutation with its affected-row count and, where the engine tracks one,
    /// the last inserted rowid.
    Changes {
        rows_affected: u64,
        last_insert_id: Option<i64>,
    },
    /// The statement ran and produced nothing (batch/DDL execution).
    Empty,
}

/// The native driver handle behind a [`Database`](crate::Database).
///
/// Escape hatch for driver features the adapter does not expose. Statements run through
/// it bypass translation and coercion.
#[derive(Clone)]
#[non_exhaustive]
pub enum NativeHandle {
    #[cfg(feature = "postgres")]
    Postgres(deadpool_postgres::Pool),
    #[cfg(feature = "libsql")]
    Libsql(deadpool_libsql::Pool),
    #[cfg(feature = "sqlite")]
    Sqlite(crate::sqlite::SharedSqliteConnection),
}

impl std::fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            #[cfg(feature = "postgres")]
            NativeHandle::Postgres(_) => "Postgres",
            #[cfg(feature = "libsql")]
            NativeHandle::Libsql(_) => "Libsql",
            #[cfg(feature = "sqlite")]
            NativeHandle::Sqlite(_) => "Sqlite",
        };
        f.debug_tuple("NativeHandle").field(&name).finish()
    }
}

/// One storage engine. Selected once at connect time and stored as `Box<dyn Backend>`.
///
/// `sql` handed to [`Backend::execute`] is already translated and `params` already
/// coerced for this backend.
#[async_trait]
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn translate<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        translation::translate(sql, self.kind())
    }

    async fn execute(
        &self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError>;

    /// Acquire the transaction's connection and issue `BEGIN`.
    async fn begin(&self) -> Result<Box<dyn TransactionBackend>, SqlAdapterError>;

    async fn close(&self) -> Result<(), SqlAdapterError>;

    fn native(&self) -> NativeHandle;
}

/// An open transaction bound to one connection.
///
/// Implementations roll back from `Drop` when neither `commit` nor `rollback` completed.
#[async_trait]
pub trait TransactionBackend: Send {
    async fn execute(
        &mut self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError>;

    async fn commit(&mut self) -> Result<(), SqlAdapterError>;

    async fn rollback(&mut self) -> Result<(), SqlAdapterError>;
}
