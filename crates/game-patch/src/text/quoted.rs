/// Find the closing `"` of a quoted run starting at `from` (just past the
/// opening quote). A backslash always consumes the byte after it, so `\"`
/// and `\\` never terminate the run early.
pub fn find_closing_quote(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if i + 1 < bytes.len() => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Extract and decode the first quoted value on the line.
///
/// Returns `None` when there is no opening quote or no closing quote.
pub fn parse_quoted_string(line: &str) -> Option<String> {
    let bytes = line.as_bytes();
    let start = memchr::memchr(b'"', bytes)? + 1;
    let end = find_closing_quote(bytes, start)?;
    Some(unescape(&bytes[start..end]))
}

/// Decode C escape sequences.
///
/// Supports the single-character escapes, 1-3 digit octal, 1-2 digit hex
/// (`\x` without digits is a literal `x`) and `\0` as NUL. Unknown escapes
/// yield the escaped character itself.
pub fn unescape(raw: &[u8]) -> String {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let (byte, consumed) = unescape_one(&raw[i..]);
        out.push(byte);
        i += consumed;
    }
    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

fn unescape_one(src: &[u8]) -> (u8, usize) {
    if src[0] != b'\\' {
        return (src[0], 1);
    }
    let Some(&esc) = src.get(1) else {
        return (b'\\', 1);
    };

    match esc {
        b'n' => (b'\n', 2),
        b't' => (b'\t', 2),
        b'r' => (b'\r', 2),
        b'b' => (0x08, 2),
        b'f' => (0x0C, 2),
        b'v' => (0x0B, 2),
        b'a' => (0x07, 2),
        b'\\' | b'\'' | b'"' | b'?' => (esc, 2),
        b'0' if !src.get(2).is_some_and(u8::is_ascii_digit) => (0, 2),
        b'0'..=b'7' => {
            let mut value: u32 = 0;
            let mut consumed = 1;
            while consumed < 4 {
                match src.get(consumed) {
                    Some(&d @ b'0'..=b'7') => {
                        value = value * 8 + u32::from(d - b'0');
                        consumed += 1;
                    }
                    _ => break,
                }
            }
            (value as u8, consumed)
        }
        b'x' => {
            let mut value: u32 = 0;
            let mut consumed = 2;
            while consumed < 4 {
                match src.get(consumed).and_then(|&d| (d as char).to_digit(16)) {
                    Some(d) => {
                        value = value * 16 + d;
                        consumed += 1;
                    }
                    None => break,
                }
            }
            if consumed == 2 {
                (b'x', 2)
            } else {
                (value as u8, consumed)
            }
        }
        other => (other, 2),
    }
}
