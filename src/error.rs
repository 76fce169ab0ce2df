use thiserror::Error;

use crate::types::RowValues;

/// Longest SQL prefix carried in an execution error.
pub(crate) const SQL_DIAGNOSTIC_LIMIT: usize = 200;

/// Errors raised by the underlying drivers and pools.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolPostgres(#[from] deadpool_postgres::PoolError),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "libsql")]
    #[error(transparent)]
    Libsql(#[from] deadpool_libsql::libsql::Error),

    #[cfg(feature = "libsql")]
    #[error(transparent)]
    PoolLibsql(#[from] deadpool_libsql::PoolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum SqlAdapterError {
    #[error("initialization error: {message}")]
    Initialization {
        message: String,
        #[source]
        source: Option<DriverError>,
    },

    #[error("execution error: {source} (sql: {sql}; params: {params})")]
    Execution {
        sql: String,
        params: String,
        #[source]
        source: DriverError,
    },

    #[error("transaction failed (rolled back: {rolled_back}): {source}")]
    Transaction {
        #[source]
        source: Box<SqlAdapterError>,
        rolled_back: bool,
    },

    #[error("cannot coerce {value} to {target}")]
    Coercion { target: &'static str, value: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database not initialized; call initialize() first")]
    NotInitialized,

    #[error("database already initialized")]
    AlreadyInitialized,

    #[error("database connection closed")]
    Closed,

    #[error("a transaction is already in progress on this task; nested transactions are not supported")]
    TransactionInProgress,

    #[error("{0}")]
    Caller(String),
}

impl SqlAdapterError {
    pub(crate) fn init(message: impl Into<String>) -> Self {
        SqlAdapterError::Initialization {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn init_with(message: impl Into<String>, source: impl Into<DriverError>) -> Self {
        SqlAdapterError::Initialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Attach the statement and its parameters to a driver failure.
    pub(crate) fn execution(sql: &str, params: &[RowValues], source: DriverError) -> Self {
        SqlAdapterError::Execution {
            sql: truncate_sql(sql),
            params: format!("{params:?}"),
            source,
        }
    }

    pub(crate) fn coercion(target: &'static str, value: &RowValues) -> Self {
        SqlAdapterError::Coercion {
            target,
            value: format!("{} {value:?}", value.type_name()),
        }
    }

    /// Error for caller-side failures raised inside a transaction's work.
    pub fn caller(message: impl Into<String>) -> Self {
        SqlAdapterError::Caller(message.into())
    }
}

pub(crate) fn truncate_sql(sql: &str) -> String {
    if sql.len() <= SQL_DIAGNOSTIC_LIMIT {
        return sql.to_string();
    }
    let mut end = SQL_DIAGNOSTIC_LIMIT;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_carries_statement_and_params() {
        let err = SqlAdapterError::execution(
            "SELECT * FROM t WHERE id = ?",
            &[RowValues::Int(7)],
            DriverError::Other("boom".into()),
        );
        let msg = err.to_string();
        assert!(msg.contains("SELECT * FROM t WHERE id = ?"));
        assert!(msg.contains("Int(7)"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn long_sql_is_truncated_on_char_boundary() {
        let sql = "é".repeat(SQL_DIAGNOSTIC_LIMIT);
        let truncated = truncate_sql(&sql);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= SQL_DIAGNOSTIC_LIMIT + 3);
    }
}
