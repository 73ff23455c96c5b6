//! Game info command implementation.

use anyhow::{Context, Result};
use game_patch::{GamePatchInfo, load_game_info, save_game_info};

use crate::cli::GameInfoAction;
use crate::config::CliConfig;

/// Run the game-info command
pub fn run(config: &CliConfig, action: GameInfoAction) -> Result<()> {
    let path = config.paths.game_info_file();
    match action {
        GameInfoAction::Show => {
            let info = load_game_info(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            println!("Title ID: {}", info.titleid());
            println!("App Version: {}", info.app_ver());
        }
        GameInfoAction::Set { titleid, app_ver } => {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let info = GamePatchInfo::new(&titleid, &app_ver);
            save_game_info(&path, &info)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Recorded {} {} in {}", info.titleid(), info.app_ver(), path.display());
        }
    }
    Ok(())
}
