//! CLI command implementations.
//!
//! This module contains the implementation of each CLI command.

pub mod apply;
pub mod game_info;
pub mod hex_utils;
pub mod hexdump;
pub mod list;
pub mod redirect;
pub mod scan;
pub mod show;
pub mod state;
pub mod toggle;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use game_patch::{BufferMemory, GamePatchInfo, ReadMemory, load_game_info};

use crate::cli::{GameArgs, TargetArgs};
use crate::config::CliConfig;
use hex_utils::parse_hex_address;

/// Game identity from the arguments, falling back to the game info record.
fn resolve_game(config: &CliConfig, game: &GameArgs) -> Result<GamePatchInfo> {
    if let (Some(titleid), Some(app_ver)) = (&game.titleid, &game.app_ver) {
        return Ok(GamePatchInfo::new(titleid, app_ver));
    }

    let path = config.paths.game_info_file();
    let recorded = load_game_info(&path).with_context(|| {
        format!(
            "No --titleid/--app-ver given and no game info at {}",
            path.display()
        )
    })?;
    Ok(GamePatchInfo::new(
        game.titleid.as_deref().unwrap_or(recorded.titleid()),
        game.app_ver.as_deref().unwrap_or(recorded.app_ver()),
    ))
}

fn definitions_path(config: &CliConfig, game: &GamePatchInfo, file: Option<&Path>) -> PathBuf {
    file.map(Path::to_path_buf)
        .unwrap_or_else(|| config.paths.definitions_file(game.titleid()))
}

fn load_image(path: &Path, base: &str) -> Result<BufferMemory> {
    let data = fs::read(path).with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(BufferMemory::new(parse_hex_address(base)?, data))
}

/// Open the memory a command reads from.
fn open_reader(target: &TargetArgs) -> Result<Box<dyn ReadMemory>> {
    if let Some(path) = &target.image {
        return Ok(Box::new(load_image(path, &target.image_base)?));
    }
    match target.pid {
        Some(pid) => open_process(pid),
        None => bail!("Either --pid or --image is required"),
    }
}

#[cfg(unix)]
fn open_process(pid: u32) -> Result<Box<dyn ReadMemory>> {
    Ok(Box::new(game_patch::ProcessHandle::open(pid)?))
}

#[cfg(not(unix))]
fn open_process(pid: u32) -> Result<Box<dyn ReadMemory>> {
    bail!("Live process access is not supported on this platform (pid {})", pid)
}
