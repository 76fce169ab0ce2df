use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;

use crate::backend::{Backend, NativeHandle};
use crate::coercion::Coercer;
use crate::config::AdapterOptions;
use crate::descriptor::ConnectionDescriptor;
use crate::error::SqlAdapterError;
use crate::executor::{self, Executor};
use crate::results::QueryResult;
use crate::transaction::{self, Transaction, rollback_after_failure};
use crate::types::{BackendKind, RowValues};

static NEXT_DATABASE_ID: AtomicU64 = AtomicU64::new(1);

/// A connected database: one backend chosen from the connection descriptor.
///
/// Callers write Postgres-dialect SQL; the handle translates it, coerces parameters and
/// result rows for the backend, and normalizes every outcome to a [`QueryResult`].
///
/// ```rust,no_run
/// use sql_adapter::prelude::*;
///
/// # async fn demo() -> Result<(), SqlAdapterError> {
/// let db = Database::open("./data/dashboard.db").await?;
/// db.query(
///     "CREATE TABLE IF NOT EXISTS users (id SERIAL PRIMARY KEY, name TEXT, is_active BOOLEAN)",
///     &[],
/// )
/// .await?;
/// let user = db
///     .insert_with_returning(
///         "INSERT INTO users (name, is_active) VALUES ($1, $2) RETURNING *",
///         &[RowValues::Text("alice".into()), RowValues::Bool(true)],
///         "users",
///     )
///     .await?;
/// assert_eq!(user.and_then(|u| u.get("is_active").cloned()), Some(RowValues::Bool(true)));
/// db.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Database {
    backend: Box<dyn Backend>,
    coercer: Coercer,
    closed: AtomicBool,
    id: u64,
}

impl Database {
    /// Classify `options.descriptor`, open the backend and verify it answers.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Initialization` for an unrecognized descriptor, a
    /// backend compiled out of this build, or a failed connection/probe, and
    /// `SqlAdapterError::Config` for invalid options.
    pub async fn connect(options: AdapterOptions) -> Result<Database, SqlAdapterError> {
        let descriptor = ConnectionDescriptor::parse(&options.descriptor)?;
        let backend = open_backend(&descriptor, &options).await?;
        let kind = backend.kind();
        tracing::info!(backend = %kind, target = %descriptor, "database connected");
        Ok(Database {
            backend,
            coercer: Coercer::new(kind, options.coercion_rules.clone()),
            closed: AtomicBool::new(false),
            id: NEXT_DATABASE_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    /// Connect with default options.
    ///
    /// # Errors
    /// See [`Database::connect`].
    pub async fn open(descriptor: &str) -> Result<Database, SqlAdapterError> {
        Database::connect(AdapterOptions::new(descriptor)).await
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// The underlying pool or connection. Statements issued through it bypass
    /// translation and coercion.
    #[must_use]
    pub fn native(&self) -> NativeHandle {
        self.backend.native()
    }

    #[must_use]
    pub fn coercer(&self) -> &Coercer {
        &self.coercer
    }

    /// Rewrite canonical SQL into this backend's dialect.
    #[must_use]
    pub fn convert_sql(&self, sql: &str) -> String {
        match self.backend.translate(sql) {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => s,
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Run `work` inside one transaction.
    ///
    /// Commits when `work` returns `Ok`; otherwise rolls back and returns
    /// `SqlAdapterError::Transaction` wrapping the failure. Statements for this database
    /// issued from inside `work` must go through the provided [`Transaction`]; using the
    /// outer handle, or opening another transaction, fails with `TransactionInProgress`.
    ///
    /// ```rust,no_run
    /// use sql_adapter::prelude::*;
    ///
    /// # async fn demo(db: &Database) -> Result<(), SqlAdapterError> {
    /// let moved = db
    ///     .transaction(|tx| async move {
    ///         tx.query("UPDATE accounts SET balance = balance - 10 WHERE id = 1", &[])
    ///             .await?;
    ///         let res = tx
    ///             .query("UPDATE accounts SET balance = balance + 10 WHERE id = 2", &[])
    ///             .await?;
    ///         Ok(res.row_count)
    ///     })
    ///     .await?;
    /// # let _ = moved;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// `TransactionInProgress` when nested, `Closed` after [`Database::close`], the
    /// `BEGIN` failure as-is, and `Transaction { source, rolled_back }` when `work` or
    /// `COMMIT` fails.
    pub async fn transaction<T, F, Fut>(&self, work: F) -> Result<T, SqlAdapterError>
    where
        F: FnOnce(Transaction) -> Fut + Send,
        Fut: Future<Output = Result<T, SqlAdapterError>> + Send,
        T: Send,
    {
        self.ensure_usable()?;
        let (tx, claim) = Transaction::new(self.backend.begin().await?, self.coercer.clone());
        let outcome = transaction::scoped(self.id, work(tx)).await;
        let Some(mut inner) = transaction::reclaim(&claim).await else {
            return Err(SqlAdapterError::Closed);
        };

        let source = match outcome {
            Ok(value) => match inner.commit().await {
                Ok(()) => return Ok(value),
                Err(commit_err) => commit_err,
            },
            Err(work_err) => work_err,
        };
        let rolled_back = rollback_after_failure(inner.as_mut(), &source).await;
        tracing::debug!(error = %source, rolled_back, "transaction aborted");
        Err(SqlAdapterError::Transaction {
            source: Box::new(source),
            rolled_back,
        })
    }

    /// Close the backend. Later statements fail with `SqlAdapterError::Closed`; closing
    /// twice is a no-op.
    ///
    /// # Errors
    /// Propagates the backend's shutdown error.
    pub async fn close(&self) -> Result<(), SqlAdapterError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.backend.close().await?;
        tracing::info!(backend = %self.kind(), "database closed");
        Ok(())
    }

    fn ensure_usable(&self) -> Result<(), SqlAdapterError> {
        if self.is_closed() {
            return Err(SqlAdapterError::Closed);
        }
        if transaction::in_transaction(self.id) {
            return Err(SqlAdapterError::TransactionInProgress);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("kind", &self.kind())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Executor for Database {
    fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    async fn query(
        &self,
        sql: &str,
        params: &[RowValues],
    ) -> Result<QueryResult, SqlAdapterError> {
        self.ensure_usable()?;
        let stmt = executor::prepare(&self.coercer, sql, params)?;
        let outcome = self
            .backend
            .execute(&stmt.sql, &stmt.info, &stmt.params)
            .await?;
        Ok(executor::finish(&self.coercer, &stmt.info, outcome))
    }
}

#[allow(unused_variables)]
async fn open_backend(
    descriptor: &ConnectionDescriptor,
    options: &AdapterOptions,
) -> Result<Box<dyn Backend>, SqlAdapterError> {
    match descriptor {
        #[cfg(feature = "postgres")]
        ConnectionDescriptor::Postgres { url } => Ok(Box::new(
            crate::postgres::PostgresBackend::connect(url, options.pool_max_size).await?,
        )),
        #[cfg(feature = "libsql")]
        ConnectionDescriptor::LibsqlRemote { url, auth_token } => {
            let target = crate::libsql::LibsqlTarget::Remote {
                url: url.clone(),
                auth_token: options.auth_token.clone().or_else(|| auth_token.clone()),
            };
            Ok(Box::new(crate::libsql::LibsqlBackend::connect(&target).await?))
        }
        #[cfg(feature = "libsql")]
        ConnectionDescriptor::LibsqlLocal { path } => {
            let target = crate::libsql::LibsqlTarget::Local(path.clone());
            Ok(Box::new(crate::libsql::LibsqlBackend::connect(&target).await?))
        }
        #[cfg(feature = "sqlite")]
        ConnectionDescriptor::Sqlite { path } => Ok(Box::new(
            crate::sqlite::SqliteBackend::connect(path, options.busy_timeout).await?,
        )),
        #[allow(unreachable_patterns)]
        other => Err(SqlAdapterError::init(format!(
            "{} backend not enabled in this build",
            other.kind()
        ))),
    }
}
