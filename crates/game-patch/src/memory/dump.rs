//! Traditional hexdump formatting.
//!
//! ```text
//! 0x00001000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
//! ```

use std::fmt::Write;

const BYTES_PER_ROW: usize = 16;

/// Format `bytes` as rows of 16, labelled with absolute addresses starting at
/// `address`. The ASCII column is optional.
pub fn format_hex_dump(bytes: &[u8], address: u64, ascii: bool) -> String {
    let mut out = String::new();

    for (i, chunk) in bytes.chunks(BYTES_PER_ROW).enumerate() {
        let _ = write!(out, "0x{:08X}: ", address + (i * BYTES_PER_ROW) as u64);

        for j in 0..BYTES_PER_ROW {
            if j == 8 {
                out.push(' ');
            }
            match chunk.get(j) {
                Some(b) => {
                    let _ = write!(out, "{:02X} ", b);
                }
                None => out.push_str("   "),
            }
        }

        if ascii {
            out.push_str(" |");
            for &b in chunk {
                out.push(if (0x20..0x7F).contains(&b) { b as char } else { '.' });
            }
            for _ in chunk.len()..BYTES_PER_ROW {
                out.push(' ');
            }
            out.push('|');
        }

        out.push('\n');
    }

    out
}
