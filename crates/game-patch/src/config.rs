//! On-disk layout of patch definitions, settings and work files.
//!
//! ```text
//! <definitions_dir>/<titleid>.yml    patch definitions
//! <settings_dir>/<titleid>.bin       patch state store
//! <work_dir>/game_patch_data.bin     running game info record
//! <work_dir>/notify.bin              message for the user after applying
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_DEFINITIONS_DIR: &str = "/dev_hdd0/game_patch/yml";
pub const DEFAULT_SETTINGS_DIR: &str = "/dev_hdd0/game_patch/settings";
pub const DEFAULT_WORK_DIR: &str = "/dev_hdd0/game_patch/work";

const GAME_INFO_FILE: &str = "game_patch_data.bin";
const NOTIFY_FILE: &str = "notify.bin";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PatchPaths {
    /// Directory holding `<titleid>.yml` definition files
    pub definitions_dir: PathBuf,
    /// Directory holding `<titleid>.bin` state stores
    pub settings_dir: PathBuf,
    /// Directory for the game info record and notification message
    pub work_dir: PathBuf,
}

impl Default for PatchPaths {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from(DEFAULT_DEFINITIONS_DIR),
            settings_dir: PathBuf::from(DEFAULT_SETTINGS_DIR),
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
        }
    }
}

impl PatchPaths {
    /// Create a new configuration builder
    pub fn builder() -> PatchPathsBuilder {
        PatchPathsBuilder::default()
    }

    /// All three directories under one root, using the default sub-layout.
    pub fn under<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            definitions_dir: root.join("yml"),
            settings_dir: root.join("settings"),
            work_dir: root.join("work"),
        }
    }

    pub fn definitions_file(&self, titleid: &str) -> PathBuf {
        self.definitions_dir.join(format!("{}.yml", titleid))
    }

    pub fn settings_file(&self, titleid: &str) -> PathBuf {
        self.settings_dir.join(format!("{}.bin", titleid))
    }

    pub fn game_info_file(&self) -> PathBuf {
        self.work_dir.join(GAME_INFO_FILE)
    }

    pub fn notify_file(&self) -> PathBuf {
        self.work_dir.join(NOTIFY_FILE)
    }

    /// Create every directory that does not exist yet.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [&self.definitions_dir, &self.settings_dir, &self.work_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Builder for PatchPaths
#[derive(Debug, Clone, Default)]
pub struct PatchPathsBuilder {
    definitions_dir: Option<PathBuf>,
    settings_dir: Option<PathBuf>,
    work_dir: Option<PathBuf>,
}

impl PatchPathsBuilder {
    pub fn definitions_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.definitions_dir = Some(path.into());
        self
    }

    pub fn settings_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_dir = Some(path.into());
        self
    }

    pub fn work_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.work_dir = Some(path.into());
        self
    }

    pub fn build(self) -> PatchPaths {
        let default = PatchPaths::default();
        PatchPaths {
            definitions_dir: self.definitions_dir.unwrap_or(default.definitions_dir),
            settings_dir: self.settings_dir.unwrap_or(default.settings_dir),
            work_dir: self.work_dir.unwrap_or(default.work_dir),
        }
    }
}
