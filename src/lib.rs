//! One query/transaction contract over three storage engines:
//!
//! - `PostgreSQL` through `tokio-postgres`/`deadpool-postgres` (the reference dialect)
//! - libSQL / Turso through `deadpool-libsql`
//! - embedded `SQLite` through `rusqlite`
//!
//! Statements are written once in Postgres-flavored SQL. The backend is picked from the
//! connection descriptor, SQL is rewritten for the SQLite-family engines, and booleans,
//! JSON and lists are coerced both ways so every caller sees the same [`RowValues`].
//!
//! ```rust,no_run
//! use sql_adapter::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlAdapterError> {
//! let db = Database::connect(AdapterOptions::from_env()?).await?;
//! let open = db
//!     .query(
//!         "SELECT id, name FROM opportunities WHERE is_deleted = $1 ORDER BY id",
//!         &[RowValues::Bool(false)],
//!     )
//!     .await?;
//! for row in &open.rows {
//!     println!("{:?}", row.get("name"));
//! }
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(feature = "postgres", feature = "sqlite", feature = "libsql")))]
compile_error!("enable at least one backend feature: postgres, sqlite or libsql");

pub mod backend;
pub mod coercion;
pub mod config;
pub mod database;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod global;
pub mod prelude;
pub mod results;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(feature = "libsql")]
pub mod libsql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backend::{NativeHandle, RawOutcome};
pub use coercion::{Coercer, CoercionRules};
pub use config::{AdapterOptions, AdapterOptionsBuilder};
pub use database::Database;
pub use descriptor::{ConnectionDescriptor, LocalPath};
pub use error::{DriverError, SqlAdapterError};
pub use executor::Executor;
pub use results::{CustomDbRow, QueryResult};
pub use transaction::Transaction;
pub use types::{BackendKind, RowValues};
