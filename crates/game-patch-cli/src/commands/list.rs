//! List command implementation.
//!
//! Prints the metadata of every patch variant in a definitions file, in the
//! order they are declared.

use std::path::Path;

use anyhow::{Context, Result};
use game_patch::{ParseEnvironment, PatchMetadata, parse_metadata};
use owo_colors::OwoColorize;

use super::{definitions_path, resolve_game};
use crate::cli::GameArgs;
use crate::config::CliConfig;

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn print_metadata(index: usize, meta: &PatchMetadata) {
    let marker = if meta.enabled {
        "enabled".green().to_string()
    } else {
        "disabled".red().to_string()
    };
    println!(
        "Patch {} (#{}) (Hash: 0x{:08x}) [{}]",
        index + 1,
        meta.patch_number,
        meta.hash,
        marker
    );
    println!("  Title: {}", meta.display_title());
    println!("  Name: {}", meta.name.as_deref().unwrap_or("N/A"));
    println!("  Author: {}", meta.author.as_deref().unwrap_or("N/A"));
    println!("  Version: {}", meta.version.as_deref().unwrap_or("N/A"));
    println!("  App Binary: {}", meta.app_bin.as_deref().unwrap_or("N/A"));
    println!("  App Version: {}", meta.app_ver.as_deref().unwrap_or("N/A"));
    println!(
        "  Matches: {}, Enabled: {}, PRX: {}",
        yes_no(meta.matches_game),
        yes_no(meta.enabled),
        yes_no(meta.is_prx)
    );
}

/// Run the list command
pub fn run(
    config: &CliConfig,
    game: &GameArgs,
    file: Option<&Path>,
    binary: Option<&str>,
    json: bool,
) -> Result<()> {
    let game = resolve_game(config, game)?;
    let path = definitions_path(config, &game, file);
    let env = ParseEnvironment::new()
        .with_settings_file(config.paths.settings_file(game.titleid()))
        .with_process_binary(binary.unwrap_or(&config.binary));

    let metadata = parse_metadata(&path, game, env)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    println!(
        "{} ({}) - {} patch variant(s) in {}",
        game.titleid(),
        game.app_ver(),
        metadata.len(),
        path.display()
    );
    for (i, meta) in metadata.iter().enumerate() {
        println!();
        print_metadata(i, meta);
    }
    Ok(())
}
