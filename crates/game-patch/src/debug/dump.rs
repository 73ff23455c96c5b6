use std::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::memory::{ReadMemory, format_hex_dump};

/// A copy of a memory region.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryDump {
    pub address: u64,
    pub bytes: Vec<u8>,
}

impl MemoryDump {
    pub fn capture<R: ReadMemory + ?Sized>(reader: &R, address: u64, size: usize) -> Result<Self> {
        Ok(Self {
            address,
            bytes: reader.read_bytes(address, size)?,
        })
    }

    pub fn to_hexdump(&self, ascii: bool) -> String {
        format_hex_dump(&self.bytes, self.address, ascii)
    }
}

impl fmt::Display for MemoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hexdump at 0x{:X} ({} bytes):", self.address, self.bytes.len())?;
        f.write_str(&self.to_hexdump(true))
    }
}
