//! Hexdump command implementation.
//!
//! Displays raw memory bytes in traditional hexdump format.
//!
//! # Output Format
//!
//! ```text
//! 0x00010000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|
//! ```

use anyhow::Result;
use game_patch::debug::MemoryDump;

use super::hex_utils::parse_hex_address;
use super::open_reader;
use crate::cli::TargetArgs;

/// Run the hexdump command
pub fn run(target: &TargetArgs, address: &str, size: usize, ascii: bool) -> Result<()> {
    let address = parse_hex_address(address)?;
    let reader = open_reader(target)?;
    let dump = MemoryDump::capture(&*reader, address, size)?;

    println!("Hexdump at 0x{:X} ({} bytes):", address, size);
    println!();
    print!("{}", dump.to_hexdump(ascii));
    Ok(())
}
