use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SqlAdapterError;
use crate::types::BackendKind;

const SQLITE_EXTENSIONS: &[&str] = &[".db", ".sqlite", ".sqlite3"];

/// Where an embedded or local libSQL database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalPath {
    Memory,
    File(PathBuf),
}

impl LocalPath {
    fn parse(raw: &str, descriptor: &str) -> Result<LocalPath, SqlAdapterError> {
        match raw {
            "" => Err(SqlAdapterError::init(format!(
                "connection descriptor {descriptor:?} has an empty path"
            ))),
            ":memory:" => Ok(LocalPath::Memory),
            path => Ok(LocalPath::File(PathBuf::from(path))),
        }
    }

    /// Resolve a relative file path against the working directory and create its parent
    /// directory. `None` for in-memory databases.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Initialization` if the working directory is unknown or
    /// the parent directory cannot be created.
    pub async fn prepare(&self) -> Result<Option<PathBuf>, SqlAdapterError> {
        let LocalPath::File(path) = self else {
            return Ok(None);
        };
        let absolute = if path.is_absolute() {
            path.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| SqlAdapterError::init_with("cannot resolve working directory", e))?
                .join(path)
        };
        if let Some(parent) = absolute.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SqlAdapterError::init_with(
                    format!("cannot create data directory {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(Some(absolute))
    }
}

/// A classified connection string. Classification is total: every input maps to exactly
/// one backend or fails.
///
/// ```rust
/// use sql_adapter::prelude::*;
///
/// let d: ConnectionDescriptor = "postgres://app@db:5432/sales".parse()?;
/// assert_eq!(d.kind(), BackendKind::Postgres);
///
/// let d: ConnectionDescriptor = "libsql://sales.turso.io?authToken=secret".parse()?;
/// assert_eq!(d.kind(), BackendKind::Libsql);
///
/// let d: ConnectionDescriptor = "./data/dashboard.db".parse()?;
/// assert_eq!(d.kind(), BackendKind::Sqlite);
///
/// assert!("mysql://localhost/sales".parse::<ConnectionDescriptor>().is_err());
/// # Ok::<(), SqlAdapterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionDescriptor {
    /// `postgres://` or `postgresql://`
    Postgres { url: String },
    /// `libsql://`, `https://`, `http://`; `authToken` is lifted out of the query string.
    LibsqlRemote {
        url: String,
        auth_token: Option<String>,
    },
    /// `libsql:file:<path>` or `libsql::memory:`
    LibsqlLocal { path: LocalPath },
    /// `sqlite://`, `sqlite:`, `file:`, `:memory:`, or a `.db`/`.sqlite`/`.sqlite3` path
    Sqlite { path: LocalPath },
}

impl ConnectionDescriptor {
    /// Classify `descriptor`.
    ///
    /// # Errors
    /// Returns `SqlAdapterError::Initialization` for empty, unsupported, or unrecognized
    /// descriptors.
    pub fn parse(descriptor: &str) -> Result<ConnectionDescriptor, SqlAdapterError> {
        let trimmed = descriptor.trim();
        let lower = trimmed.to_ascii_lowercase();
        if trimmed.is_empty() {
            return Err(SqlAdapterError::init("connection descriptor is empty"));
        }
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            return Ok(ConnectionDescriptor::Postgres {
                url: trimmed.to_string(),
            });
        }
        if lower.starts_with("sqlitecloud://") {
            return Err(SqlAdapterError::init(
                "sqlitecloud:// descriptors are not supported; use a libsql:// or https:// endpoint",
            ));
        }
        if lower == "libsql::memory:" {
            return Ok(ConnectionDescriptor::LibsqlLocal {
                path: LocalPath::Memory,
            });
        }
        if lower.starts_with("libsql:file:") {
            return Ok(ConnectionDescriptor::LibsqlLocal {
                path: LocalPath::parse(strip(trimmed, "libsql:file:"), trimmed)?,
            });
        }
        if ["libsql://", "https://", "http://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            let (url, auth_token) = split_auth_token(trimmed);
            return Ok(ConnectionDescriptor::LibsqlRemote { url, auth_token });
        }
        for prefix in ["sqlite://", "sqlite:", "file:"] {
            if lower.starts_with(prefix) {
                return Ok(ConnectionDescriptor::Sqlite {
                    path: LocalPath::parse(strip(trimmed, prefix), trimmed)?,
                });
            }
        }
        if lower == ":memory:" {
            return Ok(ConnectionDescriptor::Sqlite {
                path: LocalPath::Memory,
            });
        }
        if SQLITE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) && !lower.contains("://") {
            return Ok(ConnectionDescriptor::Sqlite {
                path: LocalPath::File(PathBuf::from(trimmed)),
            });
        }
        Err(SqlAdapterError::init(format!(
            "unrecognized connection descriptor: {}",
            redact(trimmed)
        )))
    }

    #[must_use]
    pub fn kind(&self) -> BackendKind {
        match self {
            ConnectionDescriptor::Postgres { .. } => BackendKind::Postgres,
            ConnectionDescriptor::LibsqlRemote { .. } | ConnectionDescriptor::LibsqlLocal { .. } => {
                BackendKind::Libsql
            }
            ConnectionDescriptor::Sqlite { .. } => BackendKind::Sqlite,
        }
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = SqlAdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectionDescriptor::parse(s)
    }
}

/// Credential-free rendering, safe for logs.
impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionDescriptor::Postgres { url } | ConnectionDescriptor::LibsqlRemote { url, .. } => {
                f.write_str(&redact(url))
            }
            ConnectionDescriptor::LibsqlLocal { path } => write!(f, "libsql:{}", display_path(path)),
            ConnectionDescriptor::Sqlite { path } => write!(f, "sqlite:{}", display_path(path)),
        }
    }
}

// `prefix` was matched case-insensitively; ASCII lowering keeps byte offsets.
fn strip<'a>(descriptor: &'a str, prefix: &str) -> &'a str {
    &descriptor[prefix.len()..]
}

fn display_path(path: &LocalPath) -> String {
    match path {
        LocalPath::Memory => ":memory:".to_string(),
        LocalPath::File(p) => Path::new(p).display().to_string(),
    }
}

/// Drop userinfo and the query string from a URL.
fn redact(url: &str) -> String {
    let without_query = url.split('?').next().unwrap_or(url);
    match without_query.split_once("://") {
        Some((scheme, rest)) => match rest.rsplit_once('@') {
            Some((_, host)) => format!("{scheme}://***@{host}"),
            None => format!("{scheme}://{rest}"),
        },
        None => without_query.to_string(),
    }
}

fn split_auth_token(url: &str) -> (String, Option<String>) {
    let Some((base, query)) = url.split_once('?') else {
        return (url.to_string(), None);
    };
    let mut token = None;
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| match pair.split_once('=') {
            Some((key, value)) if key == "authToken" => {
                token = Some(value.to_string());
                false
            }
            _ => !pair.is_empty(),
        })
        .collect();
    let url = if kept.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", kept.join("&"))
    };
    (url, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        let cases: &[(&str, BackendKind)] = &[
            ("postgres://u:p@localhost:5432/sales", BackendKind::Postgres),
            ("postgresql://localhost/sales", BackendKind::Postgres),
            ("POSTGRES://localhost/sales", BackendKind::Postgres),
            ("libsql://sales-org.turso.io", BackendKind::Libsql),
            ("https://sales-org.turso.io", BackendKind::Libsql),
            ("http://127.0.0.1:8080", BackendKind::Libsql),
            ("libsql:file:data/local.db", BackendKind::Libsql),
            ("libsql::memory:", BackendKind::Libsql),
            ("sqlite://data/app.db", BackendKind::Sqlite),
            ("sqlite:app.db", BackendKind::Sqlite),
            ("file:/var/lib/app/app.sqlite", BackendKind::Sqlite),
            (":memory:", BackendKind::Sqlite),
            ("./data/dashboard.sqlite3", BackendKind::Sqlite),
            ("Dashboard.DB", BackendKind::Sqlite),
        ];
        for (input, kind) in cases {
            let parsed = ConnectionDescriptor::parse(input)
                .unwrap_or_else(|e| panic!("{input}: {e}"));
            assert_eq!(parsed.kind(), *kind, "{input}");
        }
    }

    #[test]
    fn rejects_unknown_and_unsupported() {
        for input in [
            "",
            "   ",
            "mysql://localhost/sales",
            "sqlitecloud://host:8860/db?apikey=x",
            "sales",
            "sqlite://",
            "ftp://files/app.db",
        ] {
            assert!(
                matches!(
                    ConnectionDescriptor::parse(input),
                    Err(SqlAdapterError::Initialization { .. })
                ),
                "{input:?}"
            );
        }
    }

    #[test]
    fn auth_token_is_extracted() {
        let parsed =
            ConnectionDescriptor::parse("libsql://db.turso.io?tls=1&authToken=abc.def").unwrap();
        assert_eq!(
            parsed,
            ConnectionDescriptor::LibsqlRemote {
                url: "libsql://db.turso.io?tls=1".into(),
                auth_token: Some("abc.def".into()),
            }
        );
    }

    #[test]
    fn local_paths() {
        assert_eq!(
            ConnectionDescriptor::parse("sqlite://:memory:").unwrap(),
            ConnectionDescriptor::Sqlite {
                path: LocalPath::Memory
            }
        );
        assert_eq!(
            ConnectionDescriptor::parse("libsql:file:data/x.db").unwrap(),
            ConnectionDescriptor::LibsqlLocal {
                path: LocalPath::File(PathBuf::from("data/x.db"))
            }
        );
    }

    #[test]
    fn display_hides_credentials() {
        let pg = ConnectionDescriptor::parse("postgres://app:hunter2@db:5432/sales").unwrap();
        assert_eq!(pg.to_string(), "postgres://***@db:5432/sales");
        let remote = ConnectionDescriptor::parse("https://db.turso.io?authToken=tok").unwrap();
        assert_eq!(remote.to_string(), "https://db.turso.io");
    }

    #[tokio::test]
    async fn prepare_creates_parent_directory() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = LocalPath::File(dir.path().join("nested/deeper/app.db"));
        let resolved = path.prepare().await?.expect("file path");
        assert!(resolved.is_absolute());
        assert!(dir.path().join("nested/deeper").is_dir());
        assert_eq!(LocalPath::Memory.prepare().await?, None);
        Ok(())
    }
}
