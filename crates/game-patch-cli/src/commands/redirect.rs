//! Redirect command implementation.
//!
//! Rewrites a call instruction inside a memory image file and saves the
//! result, optionally leaving a jump to the original target at a holder
//! address.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use game_patch::redirect_call;

use super::hex_utils::parse_hex_address;
use super::load_image;

/// Run the redirect command
pub fn run(
    image: &Path,
    image_base: &str,
    source: &str,
    new_target: &str,
    holder: Option<&str>,
    output: &Path,
) -> Result<()> {
    let mut memory = load_image(image, image_base)?;
    let source = parse_hex_address(source)?;
    let new_target = parse_hex_address(new_target)?;
    let holder = holder.map(parse_hex_address).transpose()?;

    let original = redirect_call(&mut memory, source, new_target, holder)?;
    fs::write(output, memory.data())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Call at 0x{:X} now targets 0x{:X}", source, new_target);
    println!("Original target was 0x{:X}", original);
    if let Some(holder) = holder {
        println!("Trampoline written at 0x{:X}", holder);
    }
    Ok(())
}
