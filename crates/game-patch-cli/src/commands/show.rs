//! Show command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use game_patch::debug::PatchPreview;
use game_patch::memory::format_hex_dump;
use game_patch::{BufferMemory, PatchData, ParseEnvironment, parse_all};

use super::{definitions_path, load_image, resolve_game};
use crate::cli::GameArgs;
use crate::config::CliConfig;

/// Run the show command
///
/// With `preview`, each patch is also dry-run against the given image and
/// the bytes it would change are printed.
pub fn run(
    config: &CliConfig,
    game: &GameArgs,
    file: Option<&Path>,
    patch_title: Option<&str>,
    preview: Option<(&Path, &str)>,
    json: bool,
) -> Result<()> {
    let game = resolve_game(config, game)?;
    let path = definitions_path(config, &game, file);
    let env = ParseEnvironment::new()
        .with_settings_file(config.paths.settings_file(game.titleid()))
        .with_process_binary(config.binary.as_str());

    let patches = parse_all(&path, game, env, patch_title)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let image = match preview {
        Some((image, base)) => Some(load_image(image, base)?),
        None => None,
    };

    if json {
        let output = match &image {
            Some(image) => serde_json::to_string_pretty(&previews(image, &patches)?)?,
            None => serde_json::to_string_pretty(&patches)?,
        };
        println!("{}", output);
        return Ok(());
    }

    if patches.is_empty() {
        println!("No patches match {} {}", game.titleid(), game.app_ver());
        return Ok(());
    }

    for patch in &patches {
        let meta = &patch.metadata;
        println!(
            "{} (#{}, Hash: 0x{:08x}, {})",
            meta.display_title(),
            meta.patch_number,
            meta.hash,
            if meta.enabled { "enabled" } else { "disabled" }
        );
        for entry in &patch.entries {
            println!("  {}", entry);
        }
        if let Some(image) = &image {
            print_preview(&PatchPreview::run(image, patch)?);
        }
        println!();
    }
    Ok(())
}

fn previews(image: &BufferMemory, patches: &[PatchData]) -> Result<Vec<PatchPreview>> {
    patches
        .iter()
        .map(|patch| PatchPreview::run(image, patch).map_err(Into::into))
        .collect()
}

fn print_preview(preview: &PatchPreview) {
    for write in &preview.writes {
        println!("  before:");
        print!("{}", indent(&format_hex_dump(&write.before, write.address, false)));
        println!("  after:");
        print!("{}", indent(&format_hex_dump(&write.after, write.address, false)));
    }
    if preview.skipped > 0 {
        println!("  ({} entries without a memory write)", preview.skipped);
    }
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}\n", line)).collect()
}
