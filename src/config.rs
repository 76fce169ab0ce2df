use std::sync::Arc;
use std::time::Duration;

use crate::coercion::CoercionRules;
use crate::database::Database;
use crate::error::SqlAdapterError;

/// Default embedded-engine wait for a locked database.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for [`Database::connect`].
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    /// Connection descriptor (see [`ConnectionDescriptor`](crate::ConnectionDescriptor)).
    pub descriptor: String,
    /// Cloud auth token; overrides an `authToken` in the descriptor.
    pub auth_token: Option<String>,
    /// Postgres pool size; the driver default when unset.
    pub pool_max_size: Option<usize>,
    /// How long the embedded engine waits on a locked database.
    pub busy_timeout: Duration,
    pub coercion_rules: Arc<CoercionRules>,
}

impl AdapterOptions {
    #[must_use]
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            auth_token: None,
            pool_max_size: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            coercion_rules: Arc::new(CoercionRules::default()),
        }
    }

    #[must_use]
    pub fn builder(descriptor: impl Into<String>) -> AdapterOptionsBuilder {
        AdapterOptionsBuilder::new(descriptor)
    }

    /// Read options from the process environment.
    ///
    /// `DATABASE_URL` is required; `DATABASE_AUTH_TOKEN`, `DATABASE_POOL_SIZE` and
    /// `DATABASE_BUSY_TIMEOUT_MS` are optional.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Config` if `DATABASE_URL` is missing or a numeric
    /// variable does not parse.
    pub fn from_env() -> Result<Self, SqlAdapterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, SqlAdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let descriptor = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| SqlAdapterError::Config("DATABASE_URL is not set".to_string()))?;
        let mut opts = AdapterOptions::new(descriptor);
        opts.auth_token = lookup("DATABASE_AUTH_TOKEN").filter(|v| !v.is_empty());
        if let Some(raw) = lookup("DATABASE_POOL_SIZE") {
            opts.pool_max_size = Some(raw.trim().parse().map_err(|e| {
                SqlAdapterError::Config(format!("DATABASE_POOL_SIZE={raw:?}: {e}"))
            })?);
        }
        if let Some(raw) = lookup("DATABASE_BUSY_TIMEOUT_MS") {
            let millis: u64 = raw.trim().parse().map_err(|e| {
                SqlAdapterError::Config(format!("DATABASE_BUSY_TIMEOUT_MS={raw:?}: {e}"))
            })?;
            opts.busy_timeout = Duration::from_millis(millis);
        }
        Ok(opts)
    }
}

/// Fluent builder for [`AdapterOptions`].
#[derive(Debug, Clone)]
pub struct AdapterOptionsBuilder {
    opts: AdapterOptions,
}

impl AdapterOptionsBuilder {
    #[must_use]
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            opts: AdapterOptions::new(descriptor),
        }
    }

    #[must_use]
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.opts.auth_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn pool_max_size(mut self, max_size: usize) -> Self {
        self.opts.pool_max_size = Some(max_size);
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn coercion_rules(mut self, rules: CoercionRules) -> Self {
        self.opts.coercion_rules = Arc::new(rules);
        self
    }

    #[must_use]
    pub fn finish(self) -> AdapterOptions {
        self.opts
    }

    /// Connect with the built options.
    ///
    /// # Errors
    /// See [`Database::connect`].
    pub async fn connect(self) -> Result<Database, SqlAdapterError> {
        Database::connect(self.finish()).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_environment_variables() -> Result<(), SqlAdapterError> {
        let opts = AdapterOptions::from_lookup(lookup(&[
            ("DATABASE_URL", "libsql://db.turso.io"),
            ("DATABASE_AUTH_TOKEN", "tok"),
            ("DATABASE_POOL_SIZE", "8"),
            ("DATABASE_BUSY_TIMEOUT_MS", "250"),
        ]))?;
        assert_eq!(opts.descriptor, "libsql://db.turso.io");
        assert_eq!(opts.auth_token.as_deref(), Some("tok"));
        assert_eq!(opts.pool_max_size, Some(8));
        assert_eq!(opts.busy_timeout, Duration::from_millis(250));
        Ok(())
    }

    #[test]
    fn database_url_is_required() {
        assert!(matches!(
            AdapterOptions::from_lookup(lookup(&[])),
            Err(SqlAdapterError::Config(_))
        ));
        assert!(matches!(
            AdapterOptions::from_lookup(lookup(&[
                ("DATABASE_URL", ":memory:"),
                ("DATABASE_POOL_SIZE", "lots"),
            ])),
            Err(SqlAdapterError::Config(_))
        ));
    }

    #[test]
    fn builder_defaults() {
        let opts = AdapterOptions::builder(":memory:")
            .busy_timeout(Duration::from_secs(1))
            .finish();
        assert_eq!(opts.busy_timeout, Duration::from_secs(1));
        assert_eq!(opts.pool_max_size, None);
        assert!(opts.coercion_rules.is_boolean("is_active"));
    }
}
