//! Start-up argument table shared with the process loader.
//!
//! The loader hands over a fixed 32-bit big-endian record; this module keeps
//! an owned, tagged view of it and converts back and forth.
//!
//! ```text
//! offset  field
//!      0  argc                       u32
//!      4  argv                       u32 pointer to the original vector
//!      8  replace_args_size          u32
//!     12  replace_args_per_buf_size  u32
//!     16  new_argv[32]               {hi: u32, lo: u32}
//!    272  replace_args[32][293]      NUL-terminated strings
//!   9648  flag                       u64, bit 63 = changed
//! ```

use crate::error::{Error, Result};

pub const MAX_ARGS: usize = 32;
/// Longest argument stored in a replacement buffer, excluding the NUL.
pub const ARG_BUFFER_LEN: usize = 32 + 260;

const ARG_SLOT_SIZE: usize = ARG_BUFFER_LEN + 1;
const ARGV_ENTRY_SIZE: usize = 8;

pub const ARGC_OFFSET: usize = 0;
pub const ARGV_OFFSET: usize = 4;
pub const REPLACE_ARGS_SIZE_OFFSET: usize = 8;
pub const REPLACE_ARGS_PER_BUF_SIZE_OFFSET: usize = 12;
pub const NEW_ARGV_OFFSET: usize = 16;
pub const REPLACE_ARGS_OFFSET: usize = NEW_ARGV_OFFSET + MAX_ARGS * ARGV_ENTRY_SIZE;
pub const FLAG_OFFSET: usize = REPLACE_ARGS_OFFSET + MAX_ARGS * ARG_SLOT_SIZE;
pub const PROGRAM_ARGS_SIZE: usize = FLAG_OFFSET + 8;

const CHANGED_BIT: u64 = 1 << 63;

/// One `new_argv` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSlot {
    /// Pointer into the process's original argument strings.
    Original(u32),
    /// Argument added by a patch, stored in the matching replacement buffer.
    Appended(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramArgs {
    argv: u32,
    slots: Vec<ArgSlot>,
    changed: bool,
}

impl ProgramArgs {
    /// Table seeded with the process's original argument pointers. Pointers
    /// past the capacity are dropped.
    pub fn new(argv: u32, original: &[u32]) -> Self {
        Self {
            argv,
            slots: original
                .iter()
                .take(MAX_ARGS)
                .map(|&p| ArgSlot::Original(p))
                .collect(),
            changed: false,
        }
    }

    pub fn argc(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_full(&self) -> bool {
        self.slots.len() >= MAX_ARGS
    }

    /// Strings added by patches, in order.
    pub fn appended(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().filter_map(|s| match s {
            ArgSlot::Appended(a) => Some(a.as_str()),
            ArgSlot::Original(_) => None,
        })
    }

    /// Add one argument, truncated to the buffer length.
    pub fn append(&mut self, arg: &str) -> Result<()> {
        if self.is_full() {
            return Err(Error::ArgumentTableFull(MAX_ARGS));
        }
        self.slots.push(ArgSlot::Appended(truncate_arg(arg).to_string()));
        self.changed = true;
        Ok(())
    }

    /// Serialize as the loader record placed at address `base`.
    pub fn to_bytes(&self, base: u32) -> Vec<u8> {
        let mut out = vec![0u8; PROGRAM_ARGS_SIZE];
        put_u32(&mut out, ARGC_OFFSET, self.slots.len() as u32);
        put_u32(&mut out, ARGV_OFFSET, self.argv);
        put_u32(
            &mut out,
            REPLACE_ARGS_SIZE_OFFSET,
            (MAX_ARGS * ARG_SLOT_SIZE) as u32,
        );
        put_u32(&mut out, REPLACE_ARGS_PER_BUF_SIZE_OFFSET, ARG_SLOT_SIZE as u32);

        for (i, slot) in self.slots.iter().enumerate() {
            let entry = NEW_ARGV_OFFSET + i * ARGV_ENTRY_SIZE;
            let buf = REPLACE_ARGS_OFFSET + i * ARG_SLOT_SIZE;
            let pointer = match slot {
                ArgSlot::Original(p) => *p,
                ArgSlot::Appended(arg) => {
                    out[buf..buf + arg.len()].copy_from_slice(arg.as_bytes());
                    base.wrapping_add(buf as u32)
                }
            };
            put_u32(&mut out, entry + 4, pointer);
        }

        let flag = if self.changed { CHANGED_BIT } else { 0 };
        out[FLAG_OFFSET..].copy_from_slice(&flag.to_be_bytes());
        out
    }

    /// Parse a loader record that lives at address `base`.
    pub fn from_bytes(bytes: &[u8], base: u32) -> Result<Self> {
        if bytes.len() != PROGRAM_ARGS_SIZE {
            return Err(Error::InvalidArgumentRecord(format!(
                "expected {} bytes, got {}",
                PROGRAM_ARGS_SIZE,
                bytes.len()
            )));
        }
        let argc = get_u32(bytes, ARGC_OFFSET) as usize;
        if argc > MAX_ARGS {
            return Err(Error::InvalidArgumentRecord(format!(
                "argc {} exceeds {}",
                argc, MAX_ARGS
            )));
        }

        let buffers = base.wrapping_add(REPLACE_ARGS_OFFSET as u32);
        let slots = (0..argc)
            .map(|i| {
                let pointer = get_u32(bytes, NEW_ARGV_OFFSET + i * ARGV_ENTRY_SIZE + 4);
                let rel = pointer.wrapping_sub(buffers) as usize;
                if rel < MAX_ARGS * ARG_SLOT_SIZE && rel % ARG_SLOT_SIZE == 0 {
                    let start = REPLACE_ARGS_OFFSET + rel;
                    let raw = &bytes[start..start + ARG_BUFFER_LEN];
                    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
                    ArgSlot::Appended(String::from_utf8_lossy(&raw[..len]).into_owned())
                } else {
                    ArgSlot::Original(pointer)
                }
            })
            .collect();

        let flag = u64::from_be_bytes(
            bytes[FLAG_OFFSET..]
                .try_into()
                .map_err(|_| Error::InvalidArgumentRecord("truncated flag".to_string()))?,
        );

        Ok(Self {
            argv: get_u32(bytes, ARGV_OFFSET),
            slots,
            changed: flag & CHANGED_BIT != 0,
        })
    }
}

fn truncate_arg(arg: &str) -> &str {
    if arg.len() <= ARG_BUFFER_LEN {
        return arg;
    }
    let mut end = ARG_BUFFER_LEN;
    while !arg.is_char_boundary(end) {
        end -= 1;
    }
    &arg[..end]
}

fn put_u32(out: &mut [u8], offset: usize, value: u32) {
    out[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

fn get_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
