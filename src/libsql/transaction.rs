use async_trait::async_trait;
use deadpool_libsql::Object;

use crate::backend::{RawOutcome, TransactionBackend};
use crate::error::SqlAdapterError;
use crate::executor::StatementInfo;
use crate::types::RowValues;

use super::query::execute_on;

/// Transaction on the pool's only connection, using explicit BEGIN/COMMIT.
///
/// Holding the checked-out `Object` keeps every other caller waiting in the pool until
/// the transaction ends.
pub struct LibsqlTx {
    conn: Option<Object>,
}

impl LibsqlTx {
    pub(crate) fn new(conn: Object) -> Self {
        Self { conn: Some(conn) }
    }

    fn conn(&self) -> Result<&Object, SqlAdapterError> {
        self.conn
            .as_ref()
            .ok_or_else(|| SqlAdapterError::caller("libsql transaction already completed"))
    }

    async fn finish(&mut self, sql: &'static str) -> Result<(), SqlAdapterError> {
        self.conn()?
            .execute(sql, ())
            .await
            .map_err(|e| SqlAdapterError::execution(sql, &[], e.into()))?;
        self.conn = None;
        Ok(())
    }
}

#[async_trait]
impl TransactionBackend for LibsqlTx {
    async fn execute(
        &mut self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError> {
        execute_on(self.conn()?, sql, info, params).await
    }

    async fn commit(&mut self) -> Result<(), SqlAdapterError> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> Result<(), SqlAdapterError> {
        let result = self.finish("ROLLBACK").await;
        // the connection goes back to the pool even when ROLLBACK fails
        self.conn = None;
        result
    }
}

impl Drop for LibsqlTx {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tracing::warn!("libsql transaction dropped while open; rolling back");
                if let Err(e) = conn.execute("ROLLBACK", ()).await {
                    tracing::error!(error = %e, "libsql rollback after drop failed");
                }
            });
            return;
        }
        // Detached from the pool, the connection closes with its transaction still open.
        tracing::error!("libsql transaction dropped outside a runtime; discarding connection");
        drop(Object::take(conn));
    }
}
