use crate::backend::RawOutcome;
use crate::results::QueryResult;

use super::statement::StatementInfo;

/// Fold a backend's raw outcome into the canonical [`QueryResult`].
///
/// | outcome          | rows  | `row_count`                     | `last_id`      |
/// |------------------|-------|---------------------------------|----------------|
/// | `Rows(r)`        | r     | `r.len()`                       | none           |
/// | `Changes{n, id}` | `[]`  | n                               | id for inserts with n > 0 |
/// | `Empty`, write   | `[]`  | 1                               | none           |
/// | `Empty`, other   | `[]`  | 0                               | none           |
#[must_use]
pub fn normalize(info: &StatementInfo, outcome: RawOutcome) -> QueryResult {
    match outcome {
        RawOutcome::Rows(mut result) => {
            result.row_count = result.rows.len();
            result.last_id = None;
            result
        }
        RawOutcome::Changes {
            rows_affected,
            last_insert_id,
        } => {
            // A skipped insert leaves the connection's previous rowid behind.
            let last_id = if info.is_insert() && rows_affected > 0 {
                last_insert_id
            } else {
                None
            };
            QueryResult::affected(saturating_count(rows_affected), last_id)
        }
        RawOutcome::Empty if info.is_write() => QueryResult::affected(1, None),
        RawOutcome::Empty => QueryResult::affected(0, None),
    }
}

fn saturating_count(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::types::RowValues;

    fn rows(n: i64) -> QueryResult {
        let mut rs = QueryResult::with_capacity(n as usize);
        rs.set_column_names(Arc::new(vec!["id".into()]));
        for i in 0..n {
            rs.add_row_values(vec![RowValues::Int(i)]);
        }
        rs
    }

    #[test]
    fn reads_count_their_rows() {
        let info = StatementInfo::classify("SELECT id FROM t");
        let result = normalize(&info, RawOutcome::Rows(rows(3)));
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.row_count, 3);
        assert_eq!(result.last_id, None);
    }

    #[test]
    fn writes_report_affected_rows() {
        let update = StatementInfo::classify("UPDATE t SET a = 1");
        let result = normalize(
            &update,
            RawOutcome::Changes {
                rows_affected: 4,
                last_insert_id: Some(11),
            },
        );
        assert!(result.rows.is_empty());
        assert_eq!(result.row_count, 4);
        assert_eq!(result.last_id, None);

        let insert = StatementInfo::classify("INSERT INTO t (a) VALUES (1)");
        let result = normalize(
            &insert,
            RawOutcome::Changes {
                rows_affected: 1,
                last_insert_id: Some(11),
            },
        );
        assert_eq!(result.last_id, Some(11));

        let ignored = StatementInfo::classify("INSERT OR IGNORE INTO t (a) VALUES (1)");
        let result = normalize(
            &ignored,
            RawOutcome::Changes {
                rows_affected: 0,
                last_insert_id: Some(11),
            },
        );
        assert_eq!(result.row_count, 0);
        assert_eq!(result.last_id, None);
    }

    #[test]
    fn empty_outcomes() {
        let write = StatementInfo::classify("DELETE FROM t");
        assert_eq!(normalize(&write, RawOutcome::Empty).row_count, 1);

        let ddl = StatementInfo::classify("CREATE TABLE t (id INTEGER)");
        assert_eq!(normalize(&ddl, RawOutcome::Empty).row_count, 0);

        let returning = StatementInfo::classify("DELETE FROM t WHERE id = 9 RETURNING *");
        let result = normalize(&returning, RawOutcome::Rows(rows(0)));
        assert_eq!(result.row_count, 0);
        assert!(result.rows.is_empty());
    }
}
