use async_trait::async_trait;
use deadpool_postgres::Object;

use crate::backend::{RawOutcome, TransactionBackend};
use crate::error::SqlAdapterError;
use crate::executor::StatementInfo;
use crate::types::RowValues;

use super::query::execute_on;

/// Transaction on one exclusively checked-out client.
///
/// The client returns to the pool when the transaction is dropped; an unfinished
/// transaction is rolled back first.
pub struct PostgresTx {
    client: Option<Object>,
}

impl PostgresTx {
    pub(crate) fn new(client: Object) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> Result<&Object, SqlAdapterError> {
        self.client
            .as_ref()
            .ok_or_else(|| SqlAdapterError::caller("Postgres transaction already completed"))
    }

    async fn run(&self, sql: &'static str) -> Result<(), SqlAdapterError> {
        self.client()?
            .batch_execute(sql)
            .await
            .map_err(|e| SqlAdapterError::execution(sql, &[], e.into()))
    }
}

#[async_trait]
impl TransactionBackend for PostgresTx {
    async fn execute(
        &mut self,
        sql: &str,
        info: &StatementInfo,
        params: &[RowValues],
    ) -> Result<RawOutcome, SqlAdapterError> {
        execute_on(self.client()?, sql, info, params).await
    }

    async fn commit(&mut self) -> Result<(), SqlAdapterError> {
        self.run("COMMIT").await?;
        self.client = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SqlAdapterError> {
        let result = self.run("ROLLBACK").await;
        self.client = None;
        result
    }
}

impl Drop for PostgresTx {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                tracing::warn!("Postgres transaction dropped while open; rolling back");
                if let Err(e) = client.batch_execute("ROLLBACK").await {
                    tracing::error!(error = %e, "Postgres rollback after drop failed");
                }
            });
            return;
        }
        // Detached from the pool, the connection closes with its transaction still open.
        tracing::error!("Postgres transaction dropped outside a runtime; discarding connection");
        drop(Object::take(client));
    }
}
