use super::is_space;
use super::quoted::{find_closing_quote, unescape};

/// Split a bracketed list of quoted strings: `key: [ "a", "b\"c", ... ]`.
///
/// Commas inside quoted items do not split. Unquoted items are skipped, and
/// at most `max_items` items are returned. A list without a balanced `]`
/// yields no items.
pub fn parse_string_list(line: &str, max_items: usize) -> Vec<String> {
    let bytes = line.as_bytes();
    let Some(open) = memchr::memchr(b'[', bytes) else {
        return Vec::new();
    };
    let start = open + 1;
    let Some(end) = find_list_end(bytes, start) else {
        return Vec::new();
    };
    let body = &bytes[start..end];

    let mut items = Vec::new();
    let mut pos = 0;
    while pos < body.len() && items.len() < max_items {
        while pos < body.len() && is_space(body[pos]) {
            pos += 1;
        }
        if pos >= body.len() {
            break;
        }

        if body[pos] == b'"' {
            match find_closing_quote(body, pos + 1) {
                Some(close) => {
                    items.push(unescape(&body[pos + 1..close]));
                    pos = close + 1;
                }
                None => break,
            }
        }

        while pos < body.len() && body[pos] != b',' {
            pos += 1;
        }
        pos += 1;
    }

    items
}

fn find_list_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut in_quote = false;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => {
                i += 2;
                continue;
            }
            b'"' => in_quote = !in_quote,
            b']' if !in_quote => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}
