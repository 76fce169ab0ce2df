use deadpool_postgres::{Config as PgConfig, PoolConfig, Runtime};
use tokio_postgres::NoTls;

use crate::error::SqlAdapterError;

use super::executor::PostgresBackend;

impl PostgresBackend {
    /// Build a pool for `url` and check that the server answers `SELECT NOW()`.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Initialization` if the URL is rejected, the pool cannot
    /// be created, or the liveness probe fails.
    pub async fn connect(
        url: &str,
        pool_max_size: Option<usize>,
    ) -> Result<PostgresBackend, SqlAdapterError> {
        let mut pg_config = PgConfig::new();
        pg_config.url = Some(url.to_string());
        if let Some(max_size) = pool_max_size {
            if max_size == 0 {
                return Err(SqlAdapterError::Config(
                    "Postgres pool size must be at least 1".to_string(),
                ));
            }
            pg_config.pool = Some(PoolConfig::new(max_size));
        }

        let pg_pool = pg_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| SqlAdapterError::init(format!("Failed to create Postgres pool: {e}")))?;

        let client = pg_pool
            .get()
            .await
            .map_err(|e| SqlAdapterError::init_with("failed to connect to Postgres", e))?;
        client
            .query_one("SELECT NOW()", &[])
            .await
            .map_err(|e| SqlAdapterError::init_with("Postgres liveness probe failed", e))?;

        Ok(PostgresBackend::from_pool(pg_pool))
    }
}
