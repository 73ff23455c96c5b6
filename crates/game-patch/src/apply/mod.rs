//! Executes parsed patch entries against a target's memory.
//!
//! Entries are applied in file order with no rollback. A failed write is
//! returned to the caller; malformed or unknown entries are skipped.

mod args;
mod number;

pub use args::{ArgSlot, MAX_ARGS, ARG_BUFFER_LEN, PROGRAM_ARGS_SIZE, ProgramArgs};
pub use number::{parse_signed, parse_unsigned};

use strum::{Display, EnumString, IntoStaticStr};
use tracing::{Level, debug, enabled, warn};

use crate::error::Result;
use crate::memory::{ReadMemory, WriteMemory, format_hex_dump};
use crate::patch::PatchEntry;

/// Operation tag, the first parameter of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum PatchOp {
    #[strum(serialize = "bytes8")]
    Bytes8,
    #[strum(serialize = "bytes16")]
    Bytes16,
    #[strum(serialize = "bytes32")]
    Bytes32,
    #[strum(serialize = "bytes64")]
    Bytes64,
    #[strum(serialize = "append_arg")]
    AppendArg,
}

impl PatchOp {
    /// Write width in bytes for the `bytesN` operations.
    pub fn width(self) -> Option<usize> {
        match self {
            PatchOp::Bytes8 => Some(1),
            PatchOp::Bytes16 => Some(2),
            PatchOp::Bytes32 => Some(4),
            PatchOp::Bytes64 => Some(8),
            PatchOp::AppendArg => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Endian {
    #[default]
    Big,
    Little,
}

impl Endian {
    /// Low `width` bytes of `value` in this byte order.
    pub fn encode(self, value: i64, width: usize) -> Vec<u8> {
        match self {
            Endian::Big => value.to_be_bytes()[8 - width..].to_vec(),
            Endian::Little => value.to_le_bytes()[..width].to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Written { address: u64, width: usize },
    ArgsAppended { appended: usize, failed: usize },
    Skipped,
}

pub struct PatchApplier<'a, M> {
    memory: M,
    args: Option<&'a mut ProgramArgs>,
    base: u64,
    endian: Endian,
}

impl<'a, M> PatchApplier<'a, M> {
    pub fn new(memory: M) -> Self {
        Self {
            memory,
            args: None,
            base: 0,
            endian: Endian::default(),
        }
    }

    /// Argument table for `append_arg` entries. Without one they are skipped.
    pub fn with_args(mut self, args: &'a mut ProgramArgs) -> Self {
        self.args = Some(args);
        self
    }

    /// Added to every entry address.
    pub fn with_base(mut self, base: u64) -> Self {
        self.base = base;
        self
    }

    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }

    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Decode a `bytesN` entry into the target address and encoded value.
    fn decode_write(&self, op: PatchOp, entry: &PatchEntry) -> Option<(u64, Vec<u8>)> {
        let width = op.width()?;
        let address = self
            .base
            .wrapping_add(parse_unsigned(entry.param(1).unwrap_or_default()));
        let value = parse_signed(entry.param(2).unwrap_or_default());
        Some((address, self.endian.encode(value, width)))
    }

    fn append_args(&mut self, entry: &PatchEntry) -> ApplyOutcome {
        let Some(args) = self.args.as_deref_mut() else {
            debug!("No argument table, skipping {}", entry);
            return ApplyOutcome::Skipped;
        };

        let mut appended = 0;
        let mut failed = 0;
        for (i, arg) in entry.params.iter().enumerate().skip(1) {
            if arg.is_empty() {
                continue;
            }
            match args.append(arg) {
                Ok(()) => {
                    debug!("Appended argument {:?}", arg);
                    appended += 1;
                }
                Err(e) => {
                    warn!("Couldn't append argument {}: {}", i, e);
                    failed += 1;
                }
            }
        }
        ApplyOutcome::ArgsAppended { appended, failed }
    }

    fn classify(entry: &PatchEntry) -> Option<PatchOp> {
        if !entry.is_well_formed() {
            return None;
        }
        entry.op()?.parse().ok()
    }
}

impl<M: WriteMemory> PatchApplier<'_, M> {
    pub fn apply_entry(&mut self, entry: &PatchEntry) -> Result<ApplyOutcome> {
        let Some(op) = Self::classify(entry) else {
            debug!("Skipping entry {}", entry);
            return Ok(ApplyOutcome::Skipped);
        };
        if op == PatchOp::AppendArg {
            return Ok(self.append_args(entry));
        }

        let Some((address, bytes)) = self.decode_write(op, entry) else {
            return Ok(ApplyOutcome::Skipped);
        };
        self.memory.write_bytes(address, &bytes)?;
        debug!("{} wrote {:02X?} at 0x{:X}", op, bytes, address);
        Ok(ApplyOutcome::Written {
            address,
            width: bytes.len(),
        })
    }

    /// Apply entries in order, stopping at the first failed write.
    pub fn apply_all<'e, I>(&mut self, entries: I) -> Result<Vec<ApplyOutcome>>
    where
        I: IntoIterator<Item = &'e PatchEntry>,
    {
        entries.into_iter().map(|e| self.apply_entry(e)).collect()
    }
}

impl<M: ReadMemory + WriteMemory> PatchApplier<'_, M> {
    /// Like [`apply_entry`](Self::apply_entry), logging a hex dump of the
    /// target bytes before and after the write at debug level.
    pub fn apply_entry_with_dump(&mut self, entry: &PatchEntry) -> Result<ApplyOutcome> {
        let target = Self::classify(entry)
            .and_then(|op| self.decode_write(op, entry))
            .map(|(address, bytes)| (address, bytes.len()));

        let dump = |memory: &M, when: &str| {
            if let Some((address, width)) = target
                && enabled!(Level::DEBUG)
                && let Ok(bytes) = memory.read_bytes(address, width)
            {
                debug!("{}:\n{}", when, format_hex_dump(&bytes, address, true));
            }
        };

        dump(&self.memory, "before");
        let outcome = self.apply_entry(entry)?;
        dump(&self.memory, "after");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BufferMemory;

    fn entry(params: &[&str]) -> PatchEntry {
        PatchEntry::new(params.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_patch_op_from_tag() {
        assert_eq!("bytes32".parse::<PatchOp>().unwrap(), PatchOp::Bytes32);
        assert_eq!("append_arg".parse::<PatchOp>().unwrap(), PatchOp::AppendArg);
        assert!("float32".parse::<PatchOp>().is_err());
        assert_eq!(PatchOp::Bytes64.to_string(), "bytes64");
    }

    #[test]
    fn test_bytes_writes_have_exact_width() {
        let mut mem = BufferMemory::zeroed(0, 0x2000);
        let mut applier = PatchApplier::new(&mut mem);

        let cases = [
            ("bytes8", 1, vec![0xFF]),
            ("bytes16", 2, vec![0xFF, 0xFF]),
            ("bytes32", 4, vec![0xFF; 4]),
            ("bytes64", 8, vec![0xFF; 8]),
        ];
        for (tag, width, expected) in cases {
            let outcome = applier.apply_entry(&entry(&[tag, "0x1000", "-1"])).unwrap();
            assert_eq!(outcome, ApplyOutcome::Written { address: 0x1000, width });
            assert_eq!(applier.memory().read_bytes(0x1000, width).unwrap(), expected);
        }
        assert_eq!(mem.writes().len(), 4);
    }

    #[test]
    fn test_values_truncate_and_use_byte_order() {
        let mut mem = BufferMemory::zeroed(0, 0x100);
        PatchApplier::new(&mut mem)
            .apply_entry(&entry(&["bytes16", "0x10", "0x12345"]))
            .unwrap();
        assert_eq!(mem.read_bytes(0x10, 2).unwrap(), vec![0x23, 0x45]);

        PatchApplier::new(&mut mem)
            .with_endian(Endian::Little)
            .apply_entry(&entry(&["bytes32", "0x20", "5"]))
            .unwrap();
        assert_eq!(mem.read_bytes(0x20, 4).unwrap(), vec![5, 0, 0, 0]);
    }

    #[test]
    fn test_base_offsets_address() {
        let mut mem = BufferMemory::zeroed(0x1_0000, 0x100);
        let outcome = PatchApplier::new(&mut mem)
            .with_base(0x1_0000)
            .apply_entry(&entry(&["bytes8", "0x8", "7"]))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Written { address: 0x1_0008, width: 1 });
    }

    #[test]
    fn test_malformed_and_unknown_entries_skip() {
        let mut mem = BufferMemory::zeroed(0, 0x100);
        let mut applier = PatchApplier::new(&mut mem);
        assert_eq!(
            applier.apply_entry(&entry(&["bytes8", "0x10"])).unwrap(),
            ApplyOutcome::Skipped
        );
        assert_eq!(
            applier.apply_entry(&entry(&["float32", "0x10", "1.0"])).unwrap(),
            ApplyOutcome::Skipped
        );
        assert!(mem.writes().is_empty());
    }

    #[test]
    fn test_write_failure_propagates() {
        let mut mem = BufferMemory::zeroed(0, 0x10);
        let result = PatchApplier::new(&mut mem).apply_entry(&entry(&["bytes32", "0x100", "1"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_append_arg_skips_empty_and_reports_full() {
        let mut args = ProgramArgs::new(0, &[0; MAX_ARGS - 1]);
        let mut mem = BufferMemory::default();
        let mut applier = PatchApplier::new(&mut mem).with_args(&mut args);

        let outcome = applier
            .apply_entry(&entry(&["append_arg", "-a", "", "-b"]))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::ArgsAppended { appended: 1, failed: 1 });
        drop(applier);
        assert_eq!(args.appended().collect::<Vec<_>>(), vec!["-a"]);
    }

    #[test]
    fn test_append_arg_without_table_is_skipped() {
        let mut mem = BufferMemory::default();
        let outcome = PatchApplier::new(&mut mem)
            .apply_entry(&entry(&["append_arg", "-a", "-b"]))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Skipped);
    }

    #[test]
    fn test_apply_with_dump_writes_once() {
        let mut mem = BufferMemory::zeroed(0, 0x2000);
        let outcome = PatchApplier::new(&mut mem)
            .apply_entry_with_dump(&entry(&["bytes32", "0x1000", "5"]))
            .unwrap();
        assert_eq!(outcome, ApplyOutcome::Written { address: 0x1000, width: 4 });
        assert_eq!(mem.writes(), &[(0x1000, vec![0, 0, 0, 5])]);
    }
}
