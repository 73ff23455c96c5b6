//! Signature search over a target's memory and call-site rewriting.

pub mod redirect;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

pub use redirect::{make_call, make_jump, read_call_offset, read_jump_offset, redirect_call};

/// Bytes read per scan step.
pub const SCAN_CHUNK: usize = 256;
/// Signature byte that matches anything in raw signatures.
pub const DEFAULT_WILDCARD: u8 = 0xFF;

/// Byte pattern where `None` matches any byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(Vec<Option<u8>>);

impl Signature {
    pub fn new(bytes: Vec<Option<u8>>) -> Self {
        Self(bytes)
    }

    /// Raw signature where every `wildcard` byte matches anything.
    pub fn from_masked(bytes: &[u8], wildcard: u8) -> Self {
        Self(
            bytes
                .iter()
                .map(|&b| (b != wildcard).then_some(b))
                .collect(),
        )
    }

    /// Signature made of big-endian instruction words, `0xFF` bytes wild.
    pub fn from_words(words: &[u32]) -> Self {
        let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        Self::from_masked(&bytes, DEFAULT_WILDCARD)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.0
    }

    /// `window` must be at least as long as the signature.
    pub fn matches(&self, window: &[u8]) -> bool {
        self.0
            .iter()
            .zip(window)
            .all(|(p, b)| p.is_none_or(|p| p == *b))
    }
}

impl FromStr for Signature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_signature(s).map(Signature)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_signature(&self.0))
    }
}

/// Parse `"7F E3 ?? 78"` style text. `?` and `??` are wildcards.
pub fn parse_signature(pattern: &str) -> Result<Vec<Option<u8>>> {
    let mut bytes = Vec::new();
    for token in pattern.split_whitespace() {
        if token == "??" || token == "?" {
            bytes.push(None);
            continue;
        }

        let value = u8::from_str_radix(token, 16).map_err(|e| {
            Error::InvalidPattern(format!("Invalid signature token '{}': {}", token, e))
        })?;
        bytes.push(Some(value));
    }

    if bytes.is_empty() {
        return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
    }

    Ok(bytes)
}

pub fn format_signature(bytes: &[Option<u8>]) -> String {
    bytes
        .iter()
        .map(|b| match b {
            Some(value) => format!("{:02X}", value),
            None => "??".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find `signature` in `[base, base + size)` and return the match address
/// plus `adjust`, or 0 when not found.
///
/// The region is read in [`SCAN_CHUNK`]-byte chunks and every offset where
/// the whole signature fits inside one chunk is tested, so a match straddling
/// two chunks is missed. A signature of a full chunk or more never matches.
/// Unreadable chunks are skipped.
pub fn pattern_scan<R: ReadMemory + ?Sized>(
    reader: &R,
    base: u64,
    size: u64,
    signature: &Signature,
    adjust: u64,
) -> u64 {
    let sig_len = signature.len();
    if base == 0 || size == 0 || sig_len == 0 || sig_len >= SCAN_CHUNK {
        return 0;
    }

    let end = base.saturating_add(size);
    let limit = end.saturating_sub(sig_len as u64);
    let mut seek = base;
    while seek <= limit {
        let len = (end - seek).min(SCAN_CHUNK as u64) as usize;
        match reader.read_bytes(seek, len) {
            Ok(chunk) if chunk.len() >= sig_len => {
                let found = (0..=chunk.len() - sig_len)
                    .find(|&i| signature.matches(&chunk[i..i + sig_len]));
                if let Some(i) = found {
                    let address = (seek + i as u64).wrapping_add(adjust);
                    debug!("Signature found at 0x{:X}", seek + i as u64);
                    return address;
                }
            }
            Err(e) => debug!("Skipping unreadable chunk at 0x{:X}: {}", seek, e),
            Ok(_) => {}
        }
        match seek.checked_add(SCAN_CHUNK as u64) {
            Some(next) => seek = next,
            None => break,
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BufferMemory;

    const BASE: u64 = 0x1_0000;

    fn image_with(at: usize, bytes: &[u8], size: usize) -> BufferMemory {
        let mut data = vec![0u8; size];
        data[at..at + bytes.len()].copy_from_slice(bytes);
        BufferMemory::new(BASE, data)
    }

    #[test]
    fn test_parse_signature_with_wildcards() {
        let bytes = parse_signature("7F E3 ?? 78").unwrap();
        assert_eq!(bytes, vec![Some(0x7F), Some(0xE3), None, Some(0x78)]);
        assert!(parse_signature("").is_err());
        assert!(matches!(parse_signature("ZZ"), Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_signature_text_form() {
        let sig: Signature = "80 1F ?? 08".parse().unwrap();
        assert_eq!(sig.to_string(), "80 1F ?? 08");
        assert_eq!(sig.len(), 4);
    }

    #[test]
    fn test_from_words_masks_ff() {
        let sig = Signature::from_words(&[0x801f_0008, 0xffff_ffff]);
        assert_eq!(sig.to_string(), "80 1F 00 08 ?? ?? ?? ??");
    }

    #[test]
    fn test_scan_finds_match_with_adjust() {
        let mem = image_with(0x130, &[0xDE, 0xAD, 0xBE, 0xEF], 0x400);
        let sig = Signature::from_masked(&[0xDE, 0xFF, 0xBE], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x400, &sig, 0), BASE + 0x130);
        assert_eq!(pattern_scan(&mem, BASE, 0x400, &sig, 20), BASE + 0x130 + 20);
    }

    #[test]
    fn test_scan_not_found_and_empty_inputs() {
        let mem = image_with(0, &[1, 2, 3], 0x200);
        let sig = Signature::from_masked(&[9, 9], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x200, &sig, 0), 0);
        assert_eq!(pattern_scan(&mem, 0, 0x200, &sig, 0), 0);
        assert_eq!(pattern_scan(&mem, BASE, 0, &sig, 0), 0);
        assert_eq!(pattern_scan(&mem, BASE, 0x200, &Signature::new(vec![]), 0), 0);
    }

    #[test]
    fn test_full_chunk_signature_never_matches() {
        let bytes: Vec<u8> = (0..SCAN_CHUNK).map(|i| (i % 200) as u8).collect();
        let mem = image_with(0, &bytes, 0x1000);
        let sig = Signature::from_masked(&bytes, DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x1000, &sig, 0), 0);

        let longer = Signature::new(vec![None; SCAN_CHUNK + 1]);
        assert_eq!(pattern_scan(&mem, BASE, 0x1000, &longer, 0), 0);
    }

    #[test]
    fn test_straddling_match_is_missed() {
        let mem = image_with(SCAN_CHUNK - 2, &[0xAA, 0xBB, 0xCC, 0xDD], 0x400);
        let sig = Signature::from_masked(&[0xAA, 0xBB, 0xCC, 0xDD], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x400, &sig, 0), 0);

        let tail = Signature::from_masked(&[0xCC, 0xDD], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x400, &tail, 0), BASE + SCAN_CHUNK as u64);
    }

    #[test]
    fn test_match_ending_on_last_chunk_byte() {
        let mem = image_with(SCAN_CHUNK - 2, &[0xAA, 0xBB], 0x400);
        let sig = Signature::from_masked(&[0xAA, 0xBB], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x400, &sig, 0), BASE + 0xFE);
    }

    #[test]
    fn test_region_exactly_signature_sized() {
        let mem = image_with(0, &[0x5A, 0xA5, 0x5A], 3);
        let sig = Signature::from_masked(&[0x5A, 0xA5, 0x5A], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 3, &sig, 0), BASE);
    }

    #[test]
    fn test_match_in_later_chunk() {
        let mem = image_with(0x345, &[0x11, 0x22, 0x33], 0x800);
        let sig = Signature::from_masked(&[0x11, 0x22, 0x33], DEFAULT_WILDCARD);
        assert_eq!(pattern_scan(&mem, BASE, 0x800, &sig, 0), BASE + 0x345);
    }
}
