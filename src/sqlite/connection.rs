use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use crate::error::DriverError;

/// The single embedded connection, shared by every caller of one database.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Run synchronous `rusqlite` logic on tokio's blocking pool.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, DriverError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, rusqlite::Error> + Send + 'static,
    R: Send + 'static,
{
    let result = spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await?;
    result.map_err(DriverError::from)
}

/// Run a parameterless batch (`BEGIN`, `COMMIT`, pragmas).
pub(crate) async fn run_batch(
    conn: SharedSqliteConnection,
    sql: &'static str,
) -> Result<(), DriverError> {
    run_blocking(conn, move |guard| guard.execute_batch(sql)).await
}
