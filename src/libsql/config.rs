use deadpool_libsql::libsql::Builder;
use deadpool_libsql::{Manager, Pool};

use crate::descriptor::LocalPath;
use crate::error::SqlAdapterError;

use super::executor::LibsqlBackend;

/// Where a libSQL database is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibsqlTarget {
    /// sqld / Turso endpoint over HTTP.
    Remote {
        url: String,
        auth_token: Option<String>,
    },
    /// Local libSQL file or in-memory database.
    Local(LocalPath),
}

impl LibsqlBackend {
    /// Build the database, a single-connection pool over it, and verify it answers.
    ///
    /// The pool holds exactly one connection: checking it out is what serializes
    /// transactions against every other caller.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Initialization` if the database cannot be opened or the
    /// connection check fails.
    pub async fn connect(target: &LibsqlTarget) -> Result<LibsqlBackend, SqlAdapterError> {
        let (db, is_file) = match target {
            LibsqlTarget::Remote { url, auth_token } => {
                let db = Builder::new_remote(url.clone(), auth_token.clone().unwrap_or_default())
                    .build()
                    .await
                    .map_err(|e| {
                        SqlAdapterError::init_with("failed to create remote libsql database", e)
                    })?;
                (db, false)
            }
            LibsqlTarget::Local(path) => {
                let resolved = path.prepare().await?;
                let location = resolved
                    .as_ref()
                    .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string());
                let db = Builder::new_local(location).build().await.map_err(|e| {
                    SqlAdapterError::init_with("failed to create local libsql database", e)
                })?;
                (db, resolved.is_some())
            }
        };

        let manager = Manager::from_libsql_database(db);
        let pool = Pool::builder(manager)
            .max_size(1)
            .build()
            .map_err(|e| {
                SqlAdapterError::init(format!("failed to create libsql pool: {e}"))
            })?;

        {
            let conn = pool
                .get()
                .await
                .map_err(|e| SqlAdapterError::init_with("failed to get libsql connection", e))?;
            if is_file {
                // journal mode is best effort on local files
                if let Err(e) = conn.execute_batch("PRAGMA journal_mode = WAL;").await {
                    tracing::debug!(error = %e, "libsql WAL pragma not applied");
                }
            }
            conn.execute_batch("PRAGMA foreign_keys = ON;")
                .await
                .map_err(|e| SqlAdapterError::init_with("failed to enable foreign keys", e))?;
            let mut probe = conn
                .query("SELECT 1", ())
                .await
                .map_err(|e| SqlAdapterError::init_with("libsql liveness probe failed", e))?;
            probe
                .next()
                .await
                .map_err(|e| SqlAdapterError::init_with("libsql liveness probe failed", e))?;
        }

        Ok(LibsqlBackend::from_pool(pool))
    }
}
