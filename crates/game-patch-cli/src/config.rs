//! CLI configuration file.
//!
//! ```toml
//! binary = "EBOOT.BIN"
//!
//! [paths]
//! definitions_dir = "/dev_hdd0/game_patch/yml"
//! settings_dir = "/dev_hdd0/game_patch/settings"
//! work_dir = "/dev_hdd0/game_patch/work"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use game_patch::PatchPaths;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_BINARY: &str = "EBOOT.BIN";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub paths: PatchPaths,
    /// Name of the running binary matched against `app_bin`
    pub binary: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            paths: PatchPaths::default(),
            binary: DEFAULT_BINARY.to_string(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("game-patch").join("config.toml"))
}

impl CliConfig {
    /// Load an explicit file, or the per-user file if it exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config() {
        let config: CliConfig = toml::from_str(
            r#"
            [paths]
            settings_dir = "/tmp/settings"
            "#,
        )
        .unwrap();
        assert_eq!(config.binary, "EBOOT.BIN");
        assert_eq!(config.paths.settings_dir, PathBuf::from("/tmp/settings"));
        assert_eq!(config.paths.work_dir, PatchPaths::default().work_dir);
    }

    #[test]
    fn test_load_explicit_file() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "binary = \"GAME.SELF\"\n").unwrap();
        let config = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.binary, "GAME.SELF");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CliConfig::load(Some(&dir.path().join("none.toml"))).is_err());
    }
}
