//! Canonical SQL to backend dialect translation.
//!
//! Statements are authored in the reference (Postgres) dialect. Postgres only gets its
//! placeholders numbered; the SQLite family (embedded and libSQL) also gets the
//! [`dialect`] rewrites.

use std::borrow::Cow;

mod dialect;
mod parsers;
mod placeholders;
mod scanner;

pub use dialect::to_sqlite_dialect;
pub use placeholders::{PlaceholderStyle, translate_placeholders};
pub use scanner::{Segment, split_segments};

use crate::types::BackendKind;

/// Placeholder style native to a backend.
#[must_use]
pub fn placeholder_style(kind: BackendKind) -> PlaceholderStyle {
    match kind {
        BackendKind::Postgres => PlaceholderStyle::Postgres,
        BackendKind::Libsql | BackendKind::Sqlite => PlaceholderStyle::Sqlite,
    }
}

/// Translate canonical SQL for `kind`. Pure and idempotent.
///
/// ```rust
/// use sql_adapter::prelude::*;
///
/// let sql = "INSERT INTO t (a, b) VALUES ($1, NOW()) RETURNING *";
/// assert_eq!(
///     translate(sql, BackendKind::Sqlite),
///     "INSERT INTO t (a, b) VALUES (?1, datetime('now'))"
/// );
/// assert_eq!(translate(sql, BackendKind::Postgres), sql);
/// ```
#[must_use]
pub fn translate(sql: &str, kind: BackendKind) -> Cow<'_, str> {
    let style = placeholder_style(kind);
    if kind.is_reference_dialect() {
        return translate_placeholders(sql, style);
    }
    match to_sqlite_dialect(sql) {
        Cow::Borrowed(unchanged) => translate_placeholders(unchanged, style),
        Cow::Owned(rewritten) => Cow::Owned(translate_placeholders(&rewritten, style).into_owned()),
    }
}

/// Apply `rewrite` to every code segment of `sql`, leaving literals and comments alone.
pub(crate) fn rewrite_code_segments<'a, F>(sql: &'a str, mut rewrite: F) -> Cow<'a, str>
where
    F: FnMut(&'a str) -> Cow<'a, str>,
{
    let segments = split_segments(sql);
    let mut out: Option<String> = None;
    let mut consumed = 0;

    for segment in segments {
        let piece = if segment.code {
            rewrite(segment.text)
        } else {
            Cow::Borrowed(segment.text)
        };
        match (&mut out, piece) {
            (Some(buf), piece) => buf.push_str(&piece),
            (None, Cow::Owned(changed)) => {
                let mut buf = String::with_capacity(sql.len() + 16);
                buf.push_str(&sql[..consumed]);
                buf.push_str(&changed);
                out = Some(buf);
            }
            (None, Cow::Borrowed(_)) => {}
        }
        consumed += segment.text.len();
    }

    match out {
        Some(buf) => Cow::Owned(buf),
        None => Cow::Borrowed(sql),
    }
}
