//! Byte-level recognizers behind the scanner's state transitions.

fn pair_at(bytes: &[u8], idx: usize, pair: &[u8; 2]) -> bool {
    bytes.get(idx..idx + 2) == Some(&pair[..])
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b"--")
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b"/*")
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    pair_at(bytes, idx, b"*/")
}

/// A `$tag$` opener at `start`: the tag and the index of the opener's second `$`.
///
/// A digit right after the `$` means a `$N` placeholder, never a tag.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let rest = bytes.get(start + 1..)?;
    if rest.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let len = rest.iter().position(|&b| b == b'$')?;
    let tag = &rest[..len];
    if !tag.iter().all(|&b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    let tag = std::str::from_utf8(tag).ok()?.to_owned();
    Some((tag, start + 1 + len))
}

/// Whether the `$` at `idx` starts the closing `$tag$`.
pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let close = idx + 1 + tag.len();
    bytes.get(idx + 1..close) == Some(tag.as_bytes()) && bytes.get(close) == Some(&b'$')
}
