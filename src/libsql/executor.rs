use async_trait::async_trait;
use deadpool_libsql::Pool;

use crate::backend::{Backend, NativeHandle, RawOutcome, TransactionBackend};
use crate::error::SqlAdapterError;
use crate::executor::StatementInfo;
use crate::types::{BackendKind, RowValues};

use super::query::execute_on;
use super::transaction::LibsqlTx;

/// libSQL database behind a one-connection `deadpool_libsql` pool.
pub struct LibsqlBackend {
    pool: Pool,
}

impl LibsqlBackend {
    pub(crate) fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn checkout(&self, sql: &str) -> Result<deadpool_libsql::Object, SqlAdapterError> {
        self.pool
            .get()
            .await
            .map_err(|e| SqlAdapterError::execution(sql, &[], e.into()))
    }
}

#[async_trait]
impl Backend for LibsqlBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Libsql
    }

    async fn execute(
        &self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError> {
        let conn = self.checkout(sql).await?;
        execute_on(&conn, sql, info, params).await
    }

    async fn begin(&self) -> Result<Box<dyn TransactionBackend>, SqlAdapterError> {
        let conn = self.checkout("BEGIN TRANSACTION").await?;
        conn.execute("BEGIN TRANSACTION", ())
            .await
            .map_err(|e| SqlAdapterError::execution("BEGIN TRANSACTION", &[], e.into()))?;
        Ok(Box::new(LibsqlTx::new(conn)))
    }

    async fn close(&self) -> Result<(), SqlAdapterError> {
        self.pool.close();
        Ok(())
    }

    fn native(&self) -> NativeHandle {
        NativeHandle::Libsql(self.pool.clone())
    }
}
