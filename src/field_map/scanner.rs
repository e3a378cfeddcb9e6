#[derive(Clone, Copy)]
enum State {
    Normal,
    SingleQuoted,
    LineComment,
    BlockComment,
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'#'
}

fn keyword_at(bytes: &[u8], idx: usize, keyword: &[u8]) -> bool {
    let end = idx + keyword.len();
    end <= bytes.len()
        && bytes[idx..end].eq_ignore_ascii_case(keyword)
        && (idx == 0 || !is_word_byte(bytes[idx - 1]))
        && bytes.get(end).is_none_or(|b| !is_word_byte(*b))
}

/// Byte offset of the first `FROM` keyword outside parentheses, literals and comments.
pub(super) fn top_level_from(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut depth: u32 = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'-' if bytes.get(idx + 1) == Some(&b'-') => state = State::LineComment,
                b'/' if bytes.get(idx + 1) == Some(&b'*') => state = State::BlockComment,
                b'(' => depth += 1,
                b')' => depth = depth.saturating_sub(1),
                _ if depth == 0 && keyword_at(bytes, idx, b"FROM") => return Some(idx),
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if b == b'*' && bytes.get(idx + 1) == Some(&b'/') {
                    idx += 1;
                    state = State::Normal;
                }
            }
        }
        idx += 1;
    }

    None
}

/// Drop a leading `SELECT` keyword, if present.
pub(super) fn strip_select(field_list: &str) -> &str {
    let trimmed = field_list.trim_start();
    if keyword_at(trimmed.as_bytes(), 0, b"SELECT") {
        &trimmed["SELECT".len()..]
    } else {
        trimmed
    }
}
