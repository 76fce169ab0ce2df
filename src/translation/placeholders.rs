use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::rewrite_code_segments;

/// Target placeholder style for translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// SQLite-style placeholders like `?1` or `?` (also used by libSQL).
    Sqlite,
}

static DOLLAR_NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("valid placeholder regex"));
static QUESTION_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\?(\d*)").expect("valid placeholder regex"));

/// Translate placeholders between Postgres-style `$N` and SQLite-style `?N`/`?`.
///
/// Towards Postgres, bare `?` placeholders are numbered left to right (`$1`, `$2`, ...)
/// and `?N` keeps its number. Towards SQLite, `$N` becomes `?N`. Quoted strings,
/// comments and dollar-quoted blocks are left untouched.
///
/// Postgres' JSONB `?` operators are indistinguishable from placeholders here; write
/// those statements with `$N` placeholders and the `jsonb_exists` family instead.
///
/// Returns a borrowed `Cow` when no changes are needed.
#[must_use]
pub fn translate_placeholders(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    match target {
        PlaceholderStyle::Sqlite => rewrite_code_segments(sql, |code| {
            DOLLAR_NUMBERED.replace_all(code, "?$1")
        }),
        PlaceholderStyle::Postgres => {
            let mut next = 0usize;
            rewrite_code_segments(sql, move |code| {
                QUESTION_MARK.replace_all(code, |caps: &Captures<'_>| {
                    let digits = &caps[1];
                    if digits.is_empty() {
                        next += 1;
                        format!("${next}")
                    } else {
                        format!("${digits}")
                    }
                })
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_sqlite_to_postgres() {
        let sql = "select * from t where a = ?1 and b = ?2";
        let res = translate_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "select * from t where a = $1 and b = $2");
    }

    #[test]
    fn numbers_bare_question_marks() {
        let sql = "INSERT INTO t (a,b) VALUES (?, ?)";
        let res = translate_placeholders(sql, PlaceholderStyle::Postgres);
        assert_eq!(res, "INSERT INTO t (a,b) VALUES ($1, $2)");
    }

    #[test]
    fn translates_postgres_to_sqlite() {
        let sql = "insert into t values($1, $2)";
        let res = translate_placeholders(sql, PlaceholderStyle::Sqlite);
        assert_eq!(res, "insert into t values(?1, ?2)");
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let sql = "select '?1', $1 -- $2\n/* ?3 */ from t where a = $1";
        let res = translate_placeholders(sql, PlaceholderStyle::Sqlite);
        assert_eq!(res, "select '?1', ?1 -- $2\n/* ?3 */ from t where a = ?1");
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let sql = "$foo$ select $1 from t $foo$ where a = $1";
        let res = translate_placeholders(sql, PlaceholderStyle::Sqlite);
        assert_eq!(res, "$foo$ select $1 from t $foo$ where a = ?1");
    }

    #[test]
    fn unchanged_sql_is_borrowed() {
        let sql = "select * from t where a = $1";
        let res = translate_placeholders(sql, PlaceholderStyle::Postgres);
        assert!(matches!(res, Cow::Borrowed(_)));
    }
}
