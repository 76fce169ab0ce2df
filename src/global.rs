//! One process-wide [`Database`], for applications that want a shared handle without
//! threading it through every call.
//!
//! ```rust,no_run
//! use sql_adapter::global;
//! use sql_adapter::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlAdapterError> {
//! global::initialize("./data/dashboard.db").await?;
//! let db = global::get_db()?;
//! let res = db.query("SELECT COUNT(*) AS n FROM opportunities", &[]).await?;
//! # let _ = res;
//! global::close().await?;
//! # Ok(())
//! # }
//! ```

use tokio::sync::OnceCell;

use crate::config::AdapterOptions;
use crate::database::Database;
use crate::error::SqlAdapterError;
use crate::types::BackendKind;

static DATABASE: OnceCell<Database> = OnceCell::const_new();

/// Connect the process-wide database with default options.
///
/// # Errors
/// `AlreadyInitialized` on a second call, otherwise see [`Database::connect`].
pub async fn initialize(descriptor: &str) -> Result<&'static Database, SqlAdapterError> {
    initialize_with(AdapterOptions::new(descriptor)).await
}

/// Connect the process-wide database.
///
/// Concurrent calls are serialized: only one connects at a time, and callers that find
/// the handle already set return without opening anything. A failed connect leaves the
/// handle unset for the next caller.
///
/// # Errors
/// `AlreadyInitialized` on a second call, otherwise see [`Database::connect`].
pub async fn initialize_with(options: AdapterOptions) -> Result<&'static Database, SqlAdapterError> {
    let mut connected_here = false;
    let db = DATABASE
        .get_or_try_init(|| {
            connected_here = true;
            Database::connect(options)
        })
        .await?;
    if connected_here {
        Ok(db)
    } else {
        Err(SqlAdapterError::AlreadyInitialized)
    }
}

/// The process-wide database.
///
/// # Errors
/// `NotInitialized` before [`initialize`].
pub fn get_db() -> Result<&'static Database, SqlAdapterError> {
    DATABASE.get().ok_or(SqlAdapterError::NotInitialized)
}

/// Backend kind of the process-wide database.
///
/// # Errors
/// `NotInitialized` before [`initialize`].
pub fn get_db_type() -> Result<BackendKind, SqlAdapterError> {
    get_db().map(Database::kind)
}

/// Close the process-wide database. The handle stays registered; further statements
/// fail with `Closed`.
///
/// # Errors
/// `NotInitialized` before [`initialize`], or the backend's shutdown error.
pub async fn close() -> Result<(), SqlAdapterError> {
    get_db()?.close().await
}
