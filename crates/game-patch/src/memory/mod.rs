//! Access to a target's address space.

mod buffer;
pub mod dump;
#[cfg(unix)]
mod process;

pub use buffer::BufferMemory;
pub use dump::format_hex_dump;
#[cfg(unix)]
pub use process::ProcessHandle;

use crate::error::{Error, Result};

/// Trait for reading memory from a target.
pub trait ReadMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>>;

    fn read_u32_be(&self, address: u64) -> Result<u32> {
        let bytes = self.read_bytes(address, 4)?;
        let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| Error::MemoryReadFailed {
            address,
            message: format!("short read: {} bytes", bytes.len()),
        })?;
        Ok(u32::from_be_bytes(raw))
    }
}

/// Trait for writing memory in a target.
pub trait WriteMemory {
    fn write_bytes(&mut self, address: u64, data: &[u8]) -> Result<()>;

    fn write_u32_be(&mut self, address: u64, value: u32) -> Result<()> {
        self.write_bytes(address, &value.to_be_bytes())
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

impl<T: ReadMemory + ?Sized> ReadMemory for &mut T {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        (**self).read_bytes(address, size)
    }
}

impl<T: WriteMemory + ?Sized> WriteMemory for &mut T {
    fn write_bytes(&mut self, address: u64, data: &[u8]) -> Result<()> {
        (**self).write_bytes(address, data)
    }
}
