use crate::translation::split_segments;

/// The mutation a write statement performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Insert,
    Update,
    Delete,
}

/// Coarse statement category, taken from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`, `VALUES`, `EXPLAIN`, `SHOW`, `TABLE`, `PRAGMA`
    Read,
    /// `INSERT`/`UPDATE`/`DELETE` (and `REPLACE`, `UPSERT`, `MERGE`)
    Write(WriteKind),
    /// DDL, transaction control, anything unrecognized
    Other,
}

/// What the executor needs to know about a statement before running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementInfo {
    pub kind: StatementKind,
    /// A top-level `RETURNING` clause is present.
    pub returning: bool,
}

impl StatementInfo {
    /// Classify `sql`, ignoring comments, string literals and leading parentheses.
    ///
    /// `WITH` statements take the kind of their first top-level
    /// `SELECT`/`INSERT`/`UPDATE`/`DELETE`.
    #[must_use]
    pub fn classify(sql: &str) -> StatementInfo {
        let words = top_level_words(sql);
        let kind = match words.first().map(String::as_str) {
            Some("WITH") => words
                .iter()
                .skip(1)
                .find_map(|w| match w.as_str() {
                    "SELECT" | "INSERT" | "UPDATE" | "DELETE" | "REPLACE" => keyword_kind(w),
                    _ => None,
                })
                .unwrap_or(StatementKind::Other),
            Some(first) => keyword_kind(first).unwrap_or(StatementKind::Other),
            None => StatementKind::Other,
        };
        let returning = words.iter().any(|w| w == "RETURNING");
        StatementInfo { kind, returning }
    }

    /// Whether the driver should be asked for a row set.
    #[must_use]
    pub fn produces_rows(&self) -> bool {
        matches!(self.kind, StatementKind::Read) || self.returning
    }

    #[must_use]
    pub fn is_read(&self) -> bool {
        matches!(self.kind, StatementKind::Read)
    }

    #[must_use]
    pub fn is_write(&self) -> bool {
        matches!(self.kind, StatementKind::Write(_))
    }

    #[must_use]
    pub fn is_insert(&self) -> bool {
        matches!(self.kind, StatementKind::Write(WriteKind::Insert))
    }
}

fn keyword_kind(word: &str) -> Option<StatementKind> {
    let kind = match word {
        "SELECT" | "VALUES" | "EXPLAIN" | "SHOW" | "TABLE" | "PRAGMA" => StatementKind::Read,
        "INSERT" | "REPLACE" | "UPSERT" => StatementKind::Write(WriteKind::Insert),
        "UPDATE" | "MERGE" => StatementKind::Write(WriteKind::Update),
        "DELETE" => StatementKind::Write(WriteKind::Delete),
        _ => return None,
    };
    Some(kind)
}

/// Upper-cased words of the code segments that sit outside any parentheses.
///
/// A leading parenthesised statement (`(SELECT ...)`) is unwrapped first: parentheses
/// opened before the first word do not count towards the depth.
fn top_level_words(sql: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut depth: i32 = 0;
    let mut base: i32 = 0;
    let mut current = String::new();

    for segment in split_segments(sql).into_iter().filter(|s| s.code) {
        for ch in segment.text.chars() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                current.push(ch.to_ascii_uppercase());
                continue;
            }
            if !current.is_empty() {
                if depth == base {
                    words.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            match ch {
                '(' => {
                    depth += 1;
                    if words.is_empty() {
                        base = depth;
                    }
                }
                ')' => depth -= 1,
                _ => {}
            }
        }
        // a literal or comment ends the current word
        if !current.is_empty() {
            if depth == base {
                words.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_leading_keyword() {
        let read = StatementInfo::classify("  -- lead\n /* c */ select * from t");
        assert_eq!(read.kind, StatementKind::Read);
        assert!(read.produces_rows());

        let insert = StatementInfo::classify("INSERT INTO t (a) VALUES (1)");
        assert_eq!(insert.kind, StatementKind::Write(WriteKind::Insert));
        assert!(!insert.produces_rows());

        assert_eq!(
            StatementInfo::classify("PRAGMA foreign_keys").kind,
            StatementKind::Read
        );
        assert_eq!(
            StatementInfo::classify("CREATE TABLE t (id INTEGER)").kind,
            StatementKind::Other
        );
        assert_eq!(StatementInfo::classify("").kind, StatementKind::Other);
    }

    #[test]
    fn parenthesised_select_is_a_read() {
        let info = StatementInfo::classify("(SELECT 1) UNION (SELECT 2)");
        assert_eq!(info.kind, StatementKind::Read);
    }

    #[test]
    fn common_table_expressions_use_main_statement() {
        let info = StatementInfo::classify(
            "WITH moved AS (DELETE FROM a RETURNING *) INSERT INTO b SELECT * FROM moved",
        );
        assert_eq!(info.kind, StatementKind::Write(WriteKind::Insert));
        assert!(!info.returning);

        let read = StatementInfo::classify("WITH x AS (SELECT 1) SELECT * FROM x");
        assert_eq!(read.kind, StatementKind::Read);
    }

    #[test]
    fn detects_top_level_returning() {
        let info = StatementInfo::classify("UPDATE t SET a = 1 WHERE id = $1 RETURNING *");
        assert_eq!(info.kind, StatementKind::Write(WriteKind::Update));
        assert!(info.returning);
        assert!(info.produces_rows());

        let literal = StatementInfo::classify("INSERT INTO t (s) VALUES ('RETURNING')");
        assert!(!literal.returning);
    }
}
