use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{PatchState, StateLookup, lookup};
use crate::error::Result;

/// `'ILNY'`
pub const STATE_MAGIC: u32 = 0x494C_4E59;
pub const STATE_VERSION: u32 = 1;
pub const HEADER_SIZE: usize = 12;
pub const RECORD_SIZE: usize = 5;

/// Serialize records behind a fresh header.
pub fn encode_states(states: &[PatchState]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + states.len() * RECORD_SIZE);
    out.extend_from_slice(&STATE_MAGIC.to_be_bytes());
    out.extend_from_slice(&STATE_VERSION.to_be_bytes());
    out.extend_from_slice(&(states.len() as u32).to_be_bytes());
    for state in states {
        out.extend_from_slice(&state.hash.to_be_bytes());
        out.push(state.enabled);
    }
    out
}

/// Parse a store image. Returns `None` for any structural problem.
pub fn decode_states(bytes: &[u8]) -> Option<Vec<PatchState>> {
    if bytes.len() < HEADER_SIZE {
        return None;
    }
    let magic = read_u32(bytes, 0)?;
    let version = read_u32(bytes, 4)?;
    let count = read_u32(bytes, 8)? as usize;
    if magic != STATE_MAGIC || version != STATE_VERSION {
        return None;
    }

    let body = &bytes[HEADER_SIZE..];
    if body.len() < count.checked_mul(RECORD_SIZE)? {
        return None;
    }

    Some(
        body.chunks_exact(RECORD_SIZE)
            .take(count)
            .map(|rec| PatchState {
                hash: u32::from_be_bytes([rec[0], rec[1], rec[2], rec[3]]),
                enabled: rec[4],
            })
            .collect(),
    )
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Load every record. A missing, unreadable or corrupt file is an empty store.
pub fn read_states<P: AsRef<Path>>(path: P) -> Vec<PatchState> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            debug!("No patch state at {}: {}", path.display(), e);
            return Vec::new();
        }
    };
    match decode_states(&bytes) {
        Some(states) => states,
        None => {
            warn!("Ignoring corrupt patch state file {}", path.display());
            Vec::new()
        }
    }
}

pub fn read_patch_state<P: AsRef<Path>>(path: P, hash: u32) -> StateLookup {
    lookup(&read_states(path), hash)
}

/// Insert or update one record and rewrite the whole file.
pub fn write_patch_state<P: AsRef<Path>>(path: P, hash: u32, enabled: bool) -> Result<()> {
    let path = path.as_ref();
    let mut states = read_states(path);
    match states.iter_mut().find(|s| s.hash == hash) {
        Some(state) => state.enabled = u8::from(enabled),
        None => states.push(PatchState::new(hash, enabled)),
    }
    fs::write(path, encode_states(&states))?;
    debug!(
        "Stored patch {:08x} as {} in {}",
        hash,
        if enabled { "enabled" } else { "disabled" },
        path.display()
    );
    Ok(())
}

/// Flip a patch: unknown and disabled become enabled, enabled becomes
/// disabled. Returns the new state.
pub fn toggle_patch_state<P: AsRef<Path>>(path: P, hash: u32) -> Result<bool> {
    let path = path.as_ref();
    let enabled = !read_patch_state(path, hash).is_enabled();
    write_patch_state(path, hash, enabled)?;
    Ok(enabled)
}

/// Store bound to one settings file.
#[derive(Debug, Clone)]
pub struct PatchStateStore {
    path: PathBuf,
}

impl PatchStateStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<PatchState> {
        read_states(&self.path)
    }

    pub fn get(&self, hash: u32) -> StateLookup {
        read_patch_state(&self.path, hash)
    }

    pub fn set(&self, hash: u32, enabled: bool) -> Result<()> {
        write_patch_state(&self.path, hash, enabled)
    }

    pub fn toggle(&self, hash: u32) -> Result<bool> {
        toggle_patch_state(&self.path, hash)
    }
}
