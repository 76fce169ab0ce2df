use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};

use crate::backend::{Backend, NativeHandle, RawOutcome, TransactionBackend};
use crate::error::SqlAdapterError;
use crate::executor::StatementInfo;
use crate::types::{BackendKind, RowValues};

use super::query::execute_on;
use super::transaction::PostgresTx;

/// PostgreSQL over a `deadpool_postgres` pool. Statements outside a transaction may
/// run on any pooled client, in parallel.
pub struct PostgresBackend {
    pool: Pool,
}

impl PostgresBackend {
    pub(crate) fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn checkout(&self, sql: &str) -> Result<Object, SqlAdapterError> {
        self.pool
            .get()
            .await
            .map_err(|e| SqlAdapterError::execution(sql, &[], e.into()))
    }
}

#[async_trait]
impl Backend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Postgres
    }

    async fn execute(
        &self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError> {
        let client = self.checkout(sql).await?;
        execute_on(&client, sql, info, params).await
    }

    async fn begin(&self) -> Result<Box<dyn TransactionBackend>, SqlAdapterError> {
        let client = self.checkout("BEGIN").await?;
        client
            .batch_execute("BEGIN")
            .await
            .map_err(|e| SqlAdapterError::execution("BEGIN", &[], e.into()))?;
        Ok(Box::new(PostgresTx::new(client)))
    }

    async fn close(&self) -> Result<(), SqlAdapterError> {
        self.pool.close();
        Ok(())
    }

    fn native(&self) -> NativeHandle {
        NativeHandle::Postgres(self.pool.clone())
    }
}
