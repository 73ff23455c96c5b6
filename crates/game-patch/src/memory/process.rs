use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;

use tracing::debug;

use super::{ReadMemory, WriteMemory};
use crate::error::{Error, Result};

/// Live process opened through `/proc/<pid>/mem`.
#[derive(Debug)]
pub struct ProcessHandle {
    pub pid: u32,
    mem: File,
    writable: bool,
}

impl ProcessHandle {
    /// Open for reading only.
    pub fn open(pid: u32) -> Result<Self> {
        Self::open_with(pid, false)
    }

    /// Open for reading and writing.
    pub fn open_writable(pid: u32) -> Result<Self> {
        Self::open_with(pid, true)
    }

    fn open_with(pid: u32, writable: bool) -> Result<Self> {
        let path = format!("/proc/{}/mem", pid);
        let mem = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(&path)
            .map_err(|e| Error::ProcessOpenFailed {
                pid,
                message: e.to_string(),
            })?;
        debug!("Opened {} (writable: {})", path, writable);
        Ok(Self { pid, mem, writable })
    }
}

impl ReadMemory for ProcessHandle {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        self.mem
            .read_exact_at(&mut buffer, address)
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        Ok(buffer)
    }
}

impl WriteMemory for ProcessHandle {
    fn write_bytes(&mut self, address: u64, data: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(Error::MemoryWriteFailed {
                address,
                message: "process opened read-only".to_string(),
            });
        }
        self.mem
            .write_all_at(data, address)
            .map_err(|e| Error::MemoryWriteFailed {
                address,
                message: e.to_string(),
            })
    }
}
