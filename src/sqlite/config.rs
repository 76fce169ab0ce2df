use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use crate::descriptor::LocalPath;
use crate::error::SqlAdapterError;

use super::executor::SqliteBackend;

impl SqliteBackend {
    /// Open the embedded database at `path`.
    ///
    /// File databases get their parent directory created and WAL journaling; every
    /// connection gets `busy_timeout`, `foreign_keys = ON`, and a `SELECT 1` probe.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Initialization` if the directory, the file, a pragma,
    /// or the probe fails.
    pub async fn connect(
        path: &LocalPath,
        busy_timeout: Duration,
    ) -> Result<SqliteBackend, SqlAdapterError> {
        let resolved = path.prepare().await?;
        let conn = spawn_blocking(move || open_connection(resolved.as_deref(), busy_timeout))
            .await
            .map_err(|e| SqlAdapterError::init_with("SQLite open task failed", e))?
            .map_err(|e| SqlAdapterError::init_with("failed to open SQLite database", e))?;

        Ok(SqliteBackend::from_connection(Arc::new(Mutex::new(conn))))
    }
}

fn open_connection(
    path: Option<&Path>,
    busy_timeout: Duration,
) -> Result<rusqlite::Connection, rusqlite::Error> {
    let conn = match path {
        Some(path) => rusqlite::Connection::open(path)?,
        None => rusqlite::Connection::open_in_memory()?,
    };
    conn.busy_timeout(busy_timeout)?;
    if path.is_some() {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(conn)
}
