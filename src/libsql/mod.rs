//! Cloud-streamed backend over libSQL (remote Turso/sqld endpoints, or a local libSQL
//! file for development and tests).
//!
//! Same layout as the embedded module:
//! - `config`: database/pool construction and connection setup
//! - `params`: parameter conversion between adapter and libSQL values
//! - `query`: result extraction and statement execution
//! - `executor`: the [`Backend`](crate::backend::Backend) implementation
//! - `transaction`: explicit `BEGIN TRANSACTION`/`COMMIT`/`ROLLBACK`

pub mod config;
pub mod executor;
pub mod params;
pub mod query;
pub mod transaction;

pub use config::LibsqlTarget;
pub use executor::LibsqlBackend;
pub use params::Params;
pub use query::build_result_set;
pub use transaction::LibsqlTx;
