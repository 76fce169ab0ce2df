// PostgreSQL module - the client-server backend and reference dialect
//
// This module is split into several sub-modules for better organization:
// - config: Connection configuration and pool setup
// - params: Parameter conversion between adapter values and PostgreSQL types
// - query: Result extraction and statement execution
// - executor: The Backend implementation over the pool
// - transaction: Transactions on one checked-out client

pub mod config;
pub mod executor;
pub mod params;
pub mod query;
pub mod transaction;

// Re-export the public API
pub use executor::PostgresBackend;
pub use params::Params;
pub use query::{build_result_set_from_statement, postgres_extract_value};
pub use transaction::PostgresTx;
