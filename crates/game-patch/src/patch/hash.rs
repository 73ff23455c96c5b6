//! Patch identity.
//!
//! A patch variant is identified by a 32-bit FNV-1a fold over its declaration
//! number and descriptive fields. Re-parsing an unchanged file reproduces the
//! same hashes, which is what lets the state store remember toggles.

use super::Patch;

pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Fold `s` into `base` with the FNV-1a step. A zero base starts from the
/// offset basis.
pub fn stringid(s: &str, base: u32) -> u32 {
    let base = if base == 0 { FNV_OFFSET_BASIS } else { base };
    s.bytes()
        .fold(base, |h, b| FNV_PRIME.wrapping_mul(h ^ u32::from(b)))
}

/// `declaration_index * 100 + app_ver_slot`
pub fn patch_number(declaration_index: usize, app_ver_slot: usize) -> usize {
    declaration_index * 100 + app_ver_slot
}

pub fn calculate_patch_hash(
    patch_number: usize,
    titleid: &str,
    patch: &Patch,
    app_ver: Option<&str>,
) -> u32 {
    let fields = [
        titleid,
        patch.title.as_deref().unwrap_or(""),
        patch.name.as_deref().unwrap_or(""),
        patch.author.as_deref().unwrap_or(""),
        patch.version.as_deref().unwrap_or(""),
        patch.app_bin.as_deref().unwrap_or(""),
        app_ver.unwrap_or(""),
    ];

    fields
        .iter()
        .fold(stringid(&patch_number.to_string(), FNV_OFFSET_BASIS), |h, f| {
            stringid(f, h)
        })
}
