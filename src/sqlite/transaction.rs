use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;

use crate::backend::{RawOutcome, TransactionBackend};
use crate::error::SqlAdapterError;
use crate::executor::StatementInfo;
use crate::types::RowValues;

use super::connection::{SharedSqliteConnection, run_batch};
use super::executor::run_statement;

/// Open `SQLite` transaction. Holds the backend's transaction gate until it finishes.
pub struct SqliteTx {
    conn: SharedSqliteConnection,
    gate: Option<OwnedMutexGuard<()>>,
}

impl SqliteTx {
    pub(crate) fn new(conn: SharedSqliteConnection, gate: OwnedMutexGuard<()>) -> Self {
        Self {
            conn,
            gate: Some(gate),
        }
    }

    fn ensure_active(&self) -> Result<(), SqlAdapterError> {
        if self.gate.is_some() {
            Ok(())
        } else {
            Err(SqlAdapterError::caller("SQLite transaction already completed"))
        }
    }
}

#[async_trait]
impl TransactionBackend for SqliteTx {
    async fn execute(
        &mut self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError> {
        self.ensure_active()?;
        run_statement(std::sync::Arc::clone(&self.conn), sql, info, params).await
    }

    async fn commit(&mut self) -> Result<(), SqlAdapterError> {
        self.ensure_active()?;
        run_batch(std::sync::Arc::clone(&self.conn), "COMMIT")
            .await
            .map_err(|e| SqlAdapterError::execution("COMMIT", &[], e))?;
        self.gate = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SqlAdapterError> {
        self.ensure_active()?;
        let result = run_batch(std::sync::Arc::clone(&self.conn), "ROLLBACK").await;
        self.gate = None;
        result.map_err(|e| SqlAdapterError::execution("ROLLBACK", &[], e))
    }
}

impl Drop for SqliteTx {
    fn drop(&mut self) {
        let Some(gate) = self.gate.take() else {
            return;
        };
        let conn = std::sync::Arc::clone(&self.conn);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                let _gate = gate;
                tracing::warn!("SQLite transaction dropped while open; rolling back");
                if let Err(e) = run_batch(conn, "ROLLBACK").await {
                    tracing::error!(error = %e, "SQLite rollback after drop failed");
                }
            });
            return;
        }
        // Roll back inline; the gate stays closed until this returns.
        tracing::warn!("SQLite transaction dropped outside a runtime; rolling back inline");
        if let Err(e) = conn.blocking_lock().execute_batch("ROLLBACK") {
            tracing::error!(error = %e, "SQLite rollback after drop failed");
        }
        drop(gate);
    }
}
