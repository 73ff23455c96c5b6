//! Toggle command implementation.

use anyhow::{Context, Result};
use game_patch::PatchStateStore;
use owo_colors::OwoColorize;

use super::hex_utils::parse_hash;
use crate::config::CliConfig;

/// Run the toggle command
pub fn run(config: &CliConfig, titleid: &str, hash: &str) -> Result<()> {
    let hash = parse_hash(hash)?;
    let store = PatchStateStore::new(config.paths.settings_file(titleid));
    if let Some(dir) = store.path().parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let enabled = store
        .toggle(hash)
        .with_context(|| format!("Failed to update {}", store.path().display()))?;

    println!(
        "Patch 0x{:08x} is now {}",
        hash,
        if enabled {
            "enabled".green().to_string()
        } else {
            "disabled".red().to_string()
        }
    );
    Ok(())
}
