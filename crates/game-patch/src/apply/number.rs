//! Integer parsing with C `strtoll`/`strtoull` behaviour.
//!
//! The base is 16 when the text starts with `0x`/`0X`, otherwise 10. Leading
//! whitespace and a sign are accepted, parsing stops at the first character
//! that is not a digit of the base, no digits yield zero and out-of-range
//! values saturate.

use crate::text::is_space;

fn radix_for(text: &str) -> u32 {
    let b = text.as_bytes();
    if b.len() >= 2 && b[0] == b'0' && (b[1] == b'x' || b[1] == b'X') {
        16
    } else {
        10
    }
}

/// Returns `(negative, magnitude, overflowed)`.
fn scan_digits(text: &str, radix: u32) -> (bool, u64, bool) {
    let b = text.as_bytes();
    let mut i = 0;
    while i < b.len() && is_space(b[i]) {
        i += 1;
    }

    let mut negative = false;
    if let Some(&sign @ (b'+' | b'-')) = b.get(i) {
        negative = sign == b'-';
        i += 1;
    }

    if radix == 16
        && b.get(i) == Some(&b'0')
        && matches!(b.get(i + 1), Some(b'x' | b'X'))
        && b.get(i + 2).is_some_and(u8::is_ascii_hexdigit)
    {
        i += 2;
    }

    let mut value: u64 = 0;
    let mut overflowed = false;
    while let Some(d) = b.get(i).and_then(|&c| (c as char).to_digit(radix)) {
        match value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(u64::from(d)))
        {
            Some(v) => value = v,
            None => overflowed = true,
        }
        i += 1;
    }
    (negative, value, overflowed)
}

/// `strtoll(text, NULL, base)` with the prefix-derived base.
pub fn parse_signed(text: &str) -> i64 {
    let (negative, magnitude, overflowed) = scan_digits(text, radix_for(text));
    if negative {
        if overflowed || magnitude > i64::MIN.unsigned_abs() {
            i64::MIN
        } else {
            0i64.wrapping_sub_unsigned(magnitude)
        }
    } else if overflowed || magnitude > i64::MAX as u64 {
        i64::MAX
    } else {
        magnitude as i64
    }
}

/// `strtoull(text, NULL, base)` with the prefix-derived base. A minus sign
/// negates in two's complement.
pub fn parse_unsigned(text: &str) -> u64 {
    let (negative, magnitude, overflowed) = scan_digits(text, radix_for(text));
    if overflowed {
        u64::MAX
    } else if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    }
}
