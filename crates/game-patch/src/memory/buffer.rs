use super::{ReadMemory, WriteMemory};
use crate::error::{Error, Result};

/// A flat byte image mapped at a base address.
///
/// Used for offline work on memory dumps and as the test double for the
/// application engine. Every successful write is also recorded.
#[derive(Debug, Clone, Default)]
pub struct BufferMemory {
    base: u64,
    data: Vec<u8>,
    writes: Vec<(u64, Vec<u8>)>,
}

impl BufferMemory {
    pub fn new(base: u64, data: Vec<u8>) -> Self {
        Self {
            base,
            data,
            writes: Vec::new(),
        }
    }

    /// Zero-filled image of `size` bytes.
    pub fn zeroed(base: u64, size: usize) -> Self {
        Self::new(base, vec![0; size])
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Writes in the order they were made.
    pub fn writes(&self) -> &[(u64, Vec<u8>)] {
        &self.writes
    }

    fn range(&self, address: u64, size: usize) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(address.checked_sub(self.base)?).ok()?;
        let end = start.checked_add(size)?;
        (end <= self.data.len()).then_some(start..end)
    }
}

impl ReadMemory for BufferMemory {
    fn read_bytes(&self, address: u64, size: usize) -> Result<Vec<u8>> {
        let range = self.range(address, size).ok_or(Error::MemoryReadFailed {
            address,
            message: format!("{} bytes outside mapped image", size),
        })?;
        Ok(self.data[range].to_vec())
    }
}

impl WriteMemory for BufferMemory {
    fn write_bytes(&mut self, address: u64, data: &[u8]) -> Result<()> {
        let range = self
            .range(address, data.len())
            .ok_or(Error::MemoryWriteFailed {
                address,
                message: format!("{} bytes outside mapped image", data.len()),
            })?;
        self.data[range].copy_from_slice(data);
        self.writes.push((address, data.to_vec()));
        Ok(())
    }
}
