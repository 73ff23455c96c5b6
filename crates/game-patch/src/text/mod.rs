//! Text primitives for the patch definition format.
//!
//! Everything here works on a single physical line and never allocates unless
//! a decoded value is returned. The grammar is deliberately tiny:
//!
//! ```text
//! titleid: [ "BLUS00001", "BLES00001" ]
//! patch:
//!   title: "Example"
//!   app_ver: [ "01.00", "01.01" ]
//!   patches:
//!     - [ "bytes32", "0x1000", "5" ]
//! ```

mod list;
mod quoted;

pub use list::parse_string_list;
pub use quoted::{find_closing_quote, parse_quoted_string, unescape};

/// Whitespace as understood by C's `isspace` (includes vertical tab).
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

/// Strip leading and trailing whitespace, returning a view into `line`.
pub fn trim(line: &str) -> &str {
    line.trim_matches(|c: char| c.is_ascii() && is_space(c as u8))
}

/// Count leading space characters. Tabs are not indentation.
pub fn indent_level(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b' ').count()
}

/// True if the line is empty after whitespace or starts with `#`.
pub fn is_comment_or_blank(line: &str) -> bool {
    match line.bytes().find(|&b| !is_space(b)) {
        None => true,
        Some(b) => b == b'#',
    }
}

/// True if the first non-space character after the first `:` is `[`.
pub fn is_list_value(line: &str) -> bool {
    let bytes = line.as_bytes();
    let Some(colon) = memchr::memchr(b':', bytes) else {
        return false;
    };
    bytes[colon + 1..]
        .iter()
        .find(|&&b| !is_space(b))
        .is_some_and(|&b| b == b'[')
}

/// Key name of a `key: value` line, if the text before the first `:` is a
/// bare identifier.
pub fn line_key(trimmed: &str) -> Option<&str> {
    let colon = memchr::memchr(b':', trimmed.as_bytes())?;
    let key = &trimmed[..colon];
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return None;
    }
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim() {
        assert_eq!(trim("  title: \"x\"  \r\n"), "title: \"x\"");
        assert_eq!(trim("\t\x0b"), "");
        assert_eq!(trim("abc"), "abc");
    }

    #[test]
    fn test_indent_level_ignores_tabs() {
        assert_eq!(indent_level("    - [ ]"), 4);
        assert_eq!(indent_level("\t  title:"), 0);
        assert_eq!(indent_level("patch:"), 0);
    }

    #[test]
    fn test_is_comment_or_blank() {
        assert!(is_comment_or_blank(""));
        assert!(is_comment_or_blank("   \t"));
        assert!(is_comment_or_blank("  # note"));
        assert!(!is_comment_or_blank("  title: \"#\""));
    }

    #[test]
    fn test_is_list_value() {
        assert!(is_list_value("app_ver: [ \"1.00\" ]"));
        assert!(is_list_value("app_ver:[\"1.00\"]"));
        assert!(!is_list_value("app_ver: \"1.00\""));
        assert!(!is_list_value("no colon ["));
    }

    #[test]
    fn test_line_key() {
        assert_eq!(line_key("title: \"name: x\""), Some("title"));
        assert_eq!(line_key("app_ver: [ ]"), Some("app_ver"));
        assert_eq!(line_key("- [ \"append_arg\", \"name:x\" ]"), None);
        assert_eq!(line_key(": value"), None);
    }
}
