use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::backend::TransactionBackend;
use crate::coercion::Coercer;
use crate::error::SqlAdapterError;
use crate::executor::{self, Executor};
use crate::results::QueryResult;
use crate::types::{BackendKind, RowValues};

tokio::task_local! {
    /// Id of the [`Database`](crate::Database) whose transaction the current task is in.
    static TRANSACTION_SCOPE: u64;
}

/// Whether the current task is inside a transaction opened on database `db_id`.
pub(crate) fn in_transaction(db_id: u64) -> bool {
    TRANSACTION_SCOPE
        .try_with(|active| *active == db_id)
        .unwrap_or(false)
}

pub(crate) async fn scoped<F: std::future::Future>(db_id: u64, work: F) -> F::Output {
    TRANSACTION_SCOPE.scope(db_id, work).await
}

type SharedTx = Arc<Mutex<Option<Box<dyn TransactionBackend>>>>;

/// An open transaction, handed to the closure passed to
/// [`Database::transaction`](crate::Database::transaction).
///
/// Statements run in order on the transaction's own connection. Commit and rollback are
/// driven by the closure's result; once that happens the handle is spent and further
/// statements fail with `SqlAdapterError::Closed`.
pub struct Transaction {
    inner: SharedTx,
    coercer: Coercer,
}

impl Transaction {
    /// Wrap `inner`, returning the caller's handle and the coordinator's claim on it.
    pub(crate) fn new(inner: Box<dyn TransactionBackend>, coercer: Coercer) -> (Self, SharedTx) {
        let inner = Arc::new(Mutex::new(Some(inner)));
        let claim = Arc::clone(&inner);
        (Self { inner, coercer }, claim)
    }

    #[must_use]
    pub fn coercer(&self) -> &Coercer {
        &self.coercer
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("kind", &self.coercer.kind())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for Transaction {
    fn kind(&self) -> BackendKind {
        self.coercer.kind()
    }

    async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<QueryResult, SqlAdapterError> {
        let stmt = executor::prepare(&self.coercer, sql, params)?;
        let outcome = {
            let mut guard = self.inner.lock().await;
            let inner = guard.as_mut().ok_or(SqlAdapterError::Closed)?;
            inner.execute(&stmt.sql, &stmt.info, &stmt.params).await?
        };
        Ok(executor::finish(&self.coercer, &stmt.info, outcome))
    }
}

/// Take the backend transaction back from the caller's handle.
pub(crate) async fn reclaim(claim: &SharedTx) -> Option<Box<dyn TransactionBackend>> {
    claim.lock().await.take()
}

/// Roll back after a failed body or commit. Returns whether the rollback succeeded.
pub(crate) async fn rollback_after_failure(
    inner: &mut dyn TransactionBackend,
    cause: &SqlAdapterError,
) -> bool {
    match inner.rollback().await {
        Ok(()) => true,
        Err(rollback_err) => {
            tracing::error!(error = %rollback_err, cause = %cause, "rollback failed");
            false
        }
    }
}
