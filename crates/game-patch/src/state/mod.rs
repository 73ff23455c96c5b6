//! Persistent enable/disable flags keyed by patch hash.
//!
//! The store is a small binary file: a header `{magic, version, count}`
//! followed by `count` packed `{hash, enabled}` records. Integers are
//! big-endian. Any malformed file reads as an empty store.

mod store;

pub use store::{
    HEADER_SIZE, PatchStateStore, RECORD_SIZE, STATE_MAGIC, STATE_VERSION, decode_states,
    encode_states, read_patch_state, read_states, toggle_patch_state, write_patch_state,
};

/// Remembered flag for one patch hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchState {
    pub hash: u32,
    pub enabled: u8,
}

impl PatchState {
    pub fn new(hash: u32, enabled: bool) -> Self {
        Self {
            hash,
            enabled: u8::from(enabled),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled != 0
    }
}

/// Result of looking a hash up in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateLookup {
    Unknown,
    Disabled,
    Enabled,
}

impl StateLookup {
    /// Tri-state integer form: -1 unknown, 0 disabled, 1 enabled.
    pub fn as_raw(self) -> i32 {
        match self {
            StateLookup::Unknown => -1,
            StateLookup::Disabled => 0,
            StateLookup::Enabled => 1,
        }
    }

    pub fn is_enabled(self) -> bool {
        self == StateLookup::Enabled
    }
}

/// Linear scan for `hash`.
pub fn lookup(states: &[PatchState], hash: u32) -> StateLookup {
    match states.iter().find(|s| s.hash == hash) {
        None => StateLookup::Unknown,
        Some(s) if s.is_enabled() => StateLookup::Enabled,
        Some(_) => StateLookup::Disabled,
    }
}
