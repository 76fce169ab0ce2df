use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, NoExpand, Regex};

use super::rewrite_code_segments;
use super::scanner::split_segments;

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rule(pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).expect("valid dialect regex"),
        replacement,
    }
}

// Order matters: array types must be folded before the scalar type names they contain.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"(?i)\s*\bRETURNING\s+\*", ""),
        // SQLite only accepts expression defaults in parentheses.
        rule(
            r"(?i)\bDEFAULT\s+(?:NOW\s*\(\s*\)|CURRENT_TIMESTAMP\b)",
            "DEFAULT (datetime('now'))",
        ),
        rule(r"(?i)\bNOW\s*\(\s*\)", "datetime('now')"),
        rule(r"(?i)\bCURRENT_TIMESTAMP\b", "datetime('now')"),
        rule(
            r"(?i)\b(?:BIG)?SERIAL\s+PRIMARY\s+KEY\b",
            "INTEGER PRIMARY KEY AUTOINCREMENT",
        ),
        rule(r"(?i)::\s*[a-z_][a-z0-9_]*(?:\s*\[\])?", ""),
        rule(
            r"(?i)\b(?:TEXT|VARCHAR|INTEGER|INT|INT4|INT8|BIGINT|SMALLINT|BOOLEAN|BOOL|UUID|REAL|NUMERIC|FLOAT8|JSONB)\s*\[\]",
            "TEXT",
        ),
        rule(r"(?i)\bBOOLEAN\b", "INTEGER"),
        rule(r"(?i)\bUUID\b", "TEXT"),
        rule(r"(?i)\bJSONB\b", "TEXT"),
    ]
});

static GENERATED_UUID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bgen_random_uuid\s*\(\s*\)").expect("valid dialect regex"));
static NUMBERED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$?](\d+)").expect("valid dialect regex"));

/// Replace `gen_random_uuid()` with a placeholder for a caller-supplied UUID.
///
/// When the statement already uses numbered placeholders, each generated one takes the
/// next free number, so UUIDs bind after the statement's own parameters in order of
/// appearance. Otherwise it is a bare positional `?`.
fn number_generated_uuids(sql: &str) -> Cow<'_, str> {
    let segments = split_segments(sql);
    let code = || segments.iter().filter(|s| s.code).map(|s| s.text);
    if !code().any(|c| GENERATED_UUID.is_match(c)) {
        return Cow::Borrowed(sql);
    }
    let highest = code()
        .flat_map(|c| NUMBERED_PLACEHOLDER.captures_iter(c))
        .filter_map(|caps| caps[1].parse::<usize>().ok())
        .max();
    let mut next = highest.unwrap_or(0);
    rewrite_code_segments(sql, move |c| {
        GENERATED_UUID.replace_all(c, |_: &Captures<'_>| {
            if highest.is_some() {
                next += 1;
                format!("?{next}")
            } else {
                "?".to_string()
            }
        })
    })
}

fn apply_rules(code: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(code);
    for rule in RULES.iter() {
        let replaced = match rule.pattern.replace_all(&out, NoExpand(rule.replacement)) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        if let Some(s) = replaced {
            out = Cow::Owned(s);
        }
    }
    out
}

/// Rewrite canonical (Postgres-flavoured) SQL into the SQLite dialect.
///
/// `gen_random_uuid()` first becomes a placeholder for a caller-supplied UUID (see
/// `number_generated_uuids`). Then, in order: strip `RETURNING *`;
/// `NOW()`/`CURRENT_TIMESTAMP` become `datetime('now')`
/// (parenthesized after `DEFAULT`);
/// `SERIAL PRIMARY KEY` becomes `INTEGER PRIMARY KEY AUTOINCREMENT`; `::type` casts are
/// dropped; array, `BOOLEAN`, `UUID`, and `JSONB` column types map to `TEXT`/`INTEGER`.
///
/// Only code segments are rewritten. Text inside quotes, comments and dollar-quoted
/// blocks is kept verbatim. Idempotent.
#[must_use]
pub fn to_sqlite_dialect(sql: &str) -> Cow<'_, str> {
    match number_generated_uuids(sql) {
        Cow::Borrowed(unchanged) => rewrite_code_segments(unchanged, apply_rules),
        Cow::Owned(numbered) => Cow::Owned(rewrite_code_segments(&numbered, apply_rules).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_returning_star() {
        assert_eq!(
            to_sqlite_dialect("INSERT INTO t (a,b) VALUES (?, ?) RETURNING *"),
            "INSERT INTO t (a,b) VALUES (?, ?)"
        );
        assert_eq!(
            to_sqlite_dialect("UPDATE t SET a = 1 WHERE id = 2 returning *;"),
            "UPDATE t SET a = 1 WHERE id = 2;"
        );
    }

    #[test]
    fn uuid_generation_becomes_placeholder() {
        assert_eq!(
            to_sqlite_dialect("INSERT INTO t (id, name) VALUES (gen_random_uuid(), ?)"),
            "INSERT INTO t (id, name) VALUES (?, ?)"
        );
        assert_eq!(
            to_sqlite_dialect("INSERT INTO users (id, email) VALUES (gen_random_uuid(), $1)"),
            "INSERT INTO users (id, email) VALUES (?2, $1)"
        );
        assert_eq!(
            to_sqlite_dialect(
                "INSERT INTO pairs (a, b, label) VALUES (gen_random_uuid(), gen_random_uuid(), $2) -- $9"
            ),
            "INSERT INTO pairs (a, b, label) VALUES (?3, ?4, $2) -- $9"
        );
    }

    #[test]
    fn timestamps_use_datetime_now() {
        assert_eq!(
            to_sqlite_dialect("UPDATE t SET seen = NOW(), at = CURRENT_TIMESTAMP"),
            "UPDATE t SET seen = datetime('now'), at = datetime('now')"
        );
        assert_eq!(
            to_sqlite_dialect("created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP"),
            "created_at TIMESTAMP DEFAULT (datetime('now'))"
        );
    }

    #[test]
    fn column_types_are_mapped() {
        let ddl = "CREATE TABLE t (id SERIAL PRIMARY KEY, uid UUID, flag BOOLEAN, \
                   meta JSONB, tags TEXT[], created TIMESTAMP DEFAULT NOW())";
        assert_eq!(
            to_sqlite_dialect(ddl),
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, uid TEXT, flag INTEGER, \
             meta TEXT, tags TEXT, created TIMESTAMP DEFAULT (datetime('now')))"
        );
    }

    #[test]
    fn casts_are_dropped() {
        assert_eq!(
            to_sqlite_dialect("SELECT id::text, '2024-01-01'::date, tags::text[] FROM t"),
            "SELECT id, '2024-01-01', tags FROM t"
        );
    }

    #[test]
    fn identifiers_containing_type_names_survive() {
        let sql = "SELECT is_boolean_flag, uuid_col, json_extract(meta, '$.a') FROM t";
        assert_eq!(to_sqlite_dialect(sql), sql);
    }

    #[test]
    fn literals_are_not_rewritten() {
        let sql = "INSERT INTO notes (body) VALUES ('see RETURNING * and NOW()') RETURNING *";
        assert_eq!(
            to_sqlite_dialect(sql),
            "INSERT INTO notes (body) VALUES ('see RETURNING * and NOW()')"
        );

        let commented = "SELECT 1 -- BOOLEAN stays\n/* UUID too */";
        assert_eq!(to_sqlite_dialect(commented), commented);
    }
}
