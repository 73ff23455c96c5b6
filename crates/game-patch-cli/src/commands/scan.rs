//! Scan command implementation.

use anyhow::{Result, bail};
use game_patch::{Signature, pattern_scan};

use super::hex_utils::parse_hex_address;
use super::open_reader;
use crate::cli::TargetArgs;

/// Run the scan command
pub fn run(target: &TargetArgs, start: &str, size: &str, pattern: &str, adjust: u64) -> Result<()> {
    let signature: Signature = pattern.parse()?;
    let start = parse_hex_address(start)?;
    let size = parse_hex_address(size)?;
    let reader = open_reader(target)?;

    println!(
        "Scanning 0x{:X}..0x{:X} for {} ({} bytes)",
        start,
        start.saturating_add(size),
        signature,
        signature.len()
    );

    match pattern_scan(&*reader, start, size, &signature, adjust) {
        0 => bail!("Signature not found"),
        address => {
            println!("Found at 0x{:X}", address);
            Ok(())
        }
    }
}
