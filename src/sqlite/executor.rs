use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backend::{Backend, NativeHandle, RawOutcome, TransactionBackend};
use crate::error::{DriverError, SqlAdapterError};
use crate::executor::StatementInfo;
use crate::types::{BackendKind, RowValues};

use super::connection::{SharedSqliteConnection, run_batch, run_blocking};
use super::params::Params;
use super::query::execute_statement;
use super::transaction::SqliteTx;

/// Embedded `SQLite` database.
///
/// `rusqlite::Connection` is not `Sync`, so the connection lives behind a mutex and
/// every call hops onto the blocking pool. `tx_gate` is held for the whole life of a
/// transaction; statements from outside the transaction wait on it.
pub struct SqliteBackend {
    conn: SharedSqliteConnection,
    tx_gate: Arc<Mutex<()>>,
}

impl SqliteBackend {
    pub(crate) fn from_connection(conn: SharedSqliteConnection) -> Self {
        Self {
            conn,
            tx_gate: Arc::new(Mutex::new(())),
        }
    }
}

/// Run one statement on `conn`.
pub(crate) async fn run_statement(
    conn: SharedSqliteConnection,
    sql: &str,
    info: &StatementInfo,
    params: &[RowValues],
) -> Result<RawOutcome, SqlAdapterError> {
    let values = Params::convert(params)?;
    let sql_owned = sql.to_owned();
    let info_owned = *info;
    run_blocking(conn, move |guard| {
        execute_statement(guard, &sql_owned, &info_owned, values.as_values())
    })
    .await
    .map_err(|e| SqlAdapterError::execution(sql, params, e))
}

#[async_trait]
impl Backend for SqliteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
    }

    async fn execute(
        &self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError> {
        let _gate = self.tx_gate.lock().await;
        run_statement(Arc::clone(&self.conn), sql, info, params).await
    }

    async fn begin(&self) -> Result<Box<dyn TransactionBackend>, SqlAdapterError> {
        let gate = Arc::clone(&self.tx_gate).lock_owned().await;
        run_batch(Arc::clone(&self.conn), "BEGIN TRANSACTION")
            .await
            .map_err(|e| SqlAdapterError::execution("BEGIN TRANSACTION", &[], e))?;
        Ok(Box::new(SqliteTx::new(Arc::clone(&self.conn), gate)))
    }

    async fn close(&self) -> Result<(), SqlAdapterError> {
        // waits out any open transaction
        let _gate = self.tx_gate.lock().await;
        run_blocking(Arc::clone(&self.conn), |guard| {
            guard.execute_batch("PRAGMA optimize;")
        })
        .await
        .map_err(|e: DriverError| SqlAdapterError::execution("PRAGMA optimize", &[], e))
    }

    fn native(&self) -> NativeHandle {
        NativeHandle::Sqlite(Arc::clone(&self.conn))
    }
}
