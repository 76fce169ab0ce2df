//! Embedded-file backend over `rusqlite`.
//!
//! - `config`: opening the database file and applying connection pragmas
//! - `connection`: the shared connection handle and blocking-pool execution
//! - `params`: parameter conversion between adapter and `SQLite` values
//! - `query`: result extraction and statement execution
//! - `executor`: the [`Backend`](crate::backend::Backend) implementation
//! - `transaction`: transactions with a gate that keeps other callers out

pub mod config;
pub mod connection;
pub mod executor;
pub mod params;
pub mod query;
pub mod transaction;

pub use connection::SharedSqliteConnection;
pub use executor::SqliteBackend;
pub use params::Params;
pub use transaction::SqliteTx;
