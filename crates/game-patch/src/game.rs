//! Identity of the game currently running.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

pub const TITLEID_LEN: usize = 16;
pub const APP_VER_LEN: usize = 8;
/// Size of the on-disk record written by the system shell for the game.
pub const GAME_INFO_SIZE: usize = TITLEID_LEN + APP_VER_LEN;

/// Title id and application version, stored as fixed NUL-padded fields.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GamePatchInfo {
    titleid: [u8; TITLEID_LEN],
    app_ver: [u8; APP_VER_LEN],
}

impl GamePatchInfo {
    /// Build from strings; values longer than the field are truncated so the
    /// last byte of each field stays NUL.
    pub fn new(titleid: &str, app_ver: &str) -> Self {
        let mut info = Self {
            titleid: [0; TITLEID_LEN],
            app_ver: [0; APP_VER_LEN],
        };
        copy_field(&mut info.titleid, titleid);
        copy_field(&mut info.app_ver, app_ver);
        info
    }

    pub fn titleid(&self) -> &str {
        field_str(&self.titleid)
    }

    pub fn app_ver(&self) -> &str {
        field_str(&self.app_ver)
    }

    /// True if `app_ver` names the running version. An unknown running
    /// version never matches.
    pub fn matches_app_ver(&self, app_ver: Option<&str>) -> bool {
        match app_ver {
            Some(v) if !self.app_ver().is_empty() => self.app_ver() == v,
            _ => false,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != GAME_INFO_SIZE {
            return Err(Error::InvalidGameInfo(format!(
                "expected {} bytes, got {}",
                GAME_INFO_SIZE,
                bytes.len()
            )));
        }
        let mut info = Self::new("", "");
        info.titleid.copy_from_slice(&bytes[..TITLEID_LEN]);
        info.app_ver.copy_from_slice(&bytes[TITLEID_LEN..]);
        Ok(info)
    }

    pub fn to_bytes(&self) -> [u8; GAME_INFO_SIZE] {
        let mut out = [0u8; GAME_INFO_SIZE];
        out[..TITLEID_LEN].copy_from_slice(&self.titleid);
        out[TITLEID_LEN..].copy_from_slice(&self.app_ver);
        out
    }
}

impl std::fmt::Debug for GamePatchInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamePatchInfo")
            .field("titleid", &self.titleid())
            .field("app_ver", &self.app_ver())
            .finish()
    }
}

fn copy_field(dst: &mut [u8], value: &str) {
    let len = value.len().min(dst.len() - 1);
    dst[..len].copy_from_slice(&value.as_bytes()[..len]);
}

fn field_str(field: &[u8]) -> &str {
    let len = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    match std::str::from_utf8(&field[..len]) {
        Ok(s) => s,
        Err(e) => std::str::from_utf8(&field[..e.valid_up_to()]).unwrap_or_default(),
    }
}

/// Load the game info record; the file must be exactly one record long.
pub fn load_game_info<P: AsRef<Path>>(path: P) -> Result<GamePatchInfo> {
    let bytes = fs::read(&path)?;
    let info = GamePatchInfo::from_bytes(&bytes)?;
    debug!(
        "Loaded game info from {}: title {} app_ver {}",
        path.as_ref().display(),
        info.titleid(),
        info.app_ver()
    );
    Ok(info)
}

pub fn save_game_info<P: AsRef<Path>>(path: P, info: &GamePatchInfo) -> Result<()> {
    fs::write(path, info.to_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fields_are_truncated() {
        let info = GamePatchInfo::new("BLUS30000_LONG_TITLE", "01.000000");
        assert_eq!(info.titleid(), "BLUS30000_LONG_");
        assert_eq!(info.app_ver(), "01.0000");
    }

    #[test]
    fn test_matches_app_ver() {
        let info = GamePatchInfo::new("BLUS30000", "01.00");
        assert!(info.matches_app_ver(Some("01.00")));
        assert!(!info.matches_app_ver(Some("01.01")));
        assert!(!info.matches_app_ver(None));

        let unknown = GamePatchInfo::new("BLUS30000", "");
        assert!(!unknown.matches_app_ver(Some("")));
    }

    #[test]
    fn test_game_info_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let info = GamePatchInfo::new("NPEB00001", "01.02");
        save_game_info(temp_file.path(), &info).unwrap();

        assert_eq!(std::fs::metadata(temp_file.path()).unwrap().len(), 24);
        let loaded = load_game_info(temp_file.path()).unwrap();
        assert_eq!(loaded, info);
    }

    #[test]
    fn test_game_info_wrong_size_rejected() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), b"short").unwrap();
        assert!(matches!(
            load_game_info(temp_file.path()),
            Err(Error::InvalidGameInfo(_))
        ));
    }
}
