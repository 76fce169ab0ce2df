use super::parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    try_start_dollar_quote,
};

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// A slice of a statement: either SQL code or an opaque literal/comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub code: bool,
}

fn push<'a>(segments: &mut Vec<Segment<'a>>, sql: &'a str, start: usize, end: usize, code: bool) {
    if end > start {
        segments.push(Segment {
            text: &sql[start..end],
            code,
        });
    }
}

/// Split `sql` into code and non-code segments (quoted strings, quoted identifiers,
/// comments, dollar-quoted bodies). Concatenating the segments yields `sql` again.
///
/// All split points fall on ASCII delimiters, so every segment is valid UTF-8.
#[must_use]
pub fn split_segments(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                let opened = match b {
                    b'\'' => Some((State::SingleQuoted, idx + 1)),
                    b'"' => Some((State::DoubleQuoted, idx + 1)),
                    _ if is_line_comment_start(bytes, idx) => Some((State::LineComment, idx + 2)),
                    _ if is_block_comment_start(bytes, idx) => {
                        Some((State::BlockComment(1), idx + 2))
                    }
                    b'$' => try_start_dollar_quote(bytes, idx)
                        .map(|(tag, end)| (State::DollarQuoted(tag), end + 1)),
                    _ => None,
                };
                if let Some((next, resume)) = opened {
                    push(&mut segments, sql, start, idx, true);
                    start = idx;
                    state = next;
                    idx = resume;
                    continue;
                }
            }
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if matches!(state, State::SingleQuoted) {
                    b'\''
                } else {
                    b'"'
                };
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 2; // escaped quote
                        continue;
                    }
                    push(&mut segments, sql, start, idx + 1, false);
                    start = idx + 1;
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    push(&mut segments, sql, start, idx + 1, false);
                    start = idx + 1;
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 2;
                    continue;
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        push(&mut segments, sql, start, idx + 2, false);
                        start = idx + 2;
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 2;
                    continue;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let end = idx + tag.len() + 2;
                    push(&mut segments, sql, start, end, false);
                    start = end;
                    state = State::Normal;
                    idx = end;
                    continue;
                }
            }
        }
        idx += 1;
    }

    push(
        &mut segments,
        sql,
        start,
        bytes.len(),
        matches!(state, State::Normal),
    );
    segments
}
