//! Branch instruction encoding and call-site redirection.
//!
//! Instructions are 32-bit big-endian words. A relative branch is primary
//! opcode `0x12` with a signed 24-bit word displacement in bits 2..26; bit 0
//! (`LK`) turns the branch into a call.
//!
//! ```text
//! make_jump(addr, to) = (0x12 << 26) | ((((to - addr) >> 2) & 0xFFFFFF) << 2)
//! make_call(addr, to) = make_jump(addr, to) | 1
//! read_call_offset(v) = sign_extend_26((v & !1) & 0x03FFFFFC)
//! ```

use tracing::debug;

use crate::error::Result;
use crate::memory::{ReadMemory, WriteMemory};

const BRANCH_OPCODE: u32 = 0x12 << 26;
const DISPLACEMENT_MASK: u32 = 0x03FF_FFFC;
const LINK_BIT: u32 = 1;

/// Unconditional branch at `addr` to `to`.
pub fn make_jump(addr: u64, to: u64) -> u32 {
    let words = (to.wrapping_sub(addr) >> 2) & 0x00FF_FFFF;
    BRANCH_OPCODE | ((words as u32) << 2)
}

/// Branch-and-link at `addr` to `to`.
pub fn make_call(addr: u64, to: u64) -> u32 {
    make_jump(addr, to) | LINK_BIT
}

/// Signed byte displacement of a branch word.
pub fn read_jump_offset(value: u32) -> i32 {
    (((value & DISPLACEMENT_MASK) << 6) as i32) >> 6
}

/// Signed byte displacement of a branch-and-link word.
pub fn read_call_offset(value: u32) -> i32 {
    read_jump_offset(value & !LINK_BIT)
}

/// Point the call at `source` to `new_target`.
///
/// When `original_holder` is given, a jump to the call's previous target is
/// written there first, so code at the holder can still reach the original.
/// Returns the previous call target.
pub fn redirect_call<M>(
    memory: &mut M,
    source: u64,
    new_target: u64,
    original_holder: Option<u64>,
) -> Result<u64>
where
    M: ReadMemory + WriteMemory + ?Sized,
{
    let old = memory.read_u32_be(source)?;
    let original_target = source.wrapping_add_signed(i64::from(read_call_offset(old)));

    if let Some(holder) = original_holder {
        memory.write_u32_be(holder, make_jump(holder, original_target))?;
        debug!(
            "Trampoline at 0x{:X} jumps to original call 0x{:X}",
            holder, original_target
        );
    }

    memory.write_u32_be(source, make_call(source, new_target))?;
    debug!("Call at 0x{:X} now targets 0x{:X}", source, new_target);
    Ok(original_target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BufferMemory;

    #[test]
    fn test_encoding_values() {
        assert_eq!(make_jump(0x1000, 0x1010), 0x4800_0010);
        assert_eq!(make_call(0x1000, 0x1010), 0x4800_0011);
        assert_eq!(make_jump(0x4000, 0x2000), 0x4BFF_E000);
    }

    #[test]
    fn test_offsets_decode_both_directions() {
        assert_eq!(read_call_offset(make_call(0x1000, 0x1010)), 0x10);
        assert_eq!(read_call_offset(make_call(0x4000, 0x2000)), -0x2000);
        assert_eq!(read_jump_offset(make_jump(0x1000, 0x800)), -0x800);
    }

    #[test]
    fn test_redirect_call_with_trampoline() {
        let mut mem = BufferMemory::zeroed(0, 0x5000);
        mem.write_u32_be(0x1000, make_call(0x1000, 0x2000)).unwrap();

        let original = redirect_call(&mut mem, 0x1000, 0x3000, Some(0x4000)).unwrap();
        assert_eq!(original, 0x2000);

        let holder = mem.read_u32_be(0x4000).unwrap();
        assert_eq!(0x4000 + i64::from(read_jump_offset(holder)), 0x2000);
        let call = mem.read_u32_be(0x1000).unwrap();
        assert_eq!(call & 1, 1);
        assert_eq!(0x1000 + i64::from(read_call_offset(call)), 0x3000);
        assert_eq!(mem.writes().len(), 3);
    }

    #[test]
    fn test_redirect_call_without_holder() {
        let mut mem = BufferMemory::zeroed(0, 0x2000);
        mem.write_u32_be(0x100, make_call(0x100, 0x80)).unwrap();

        let original = redirect_call(&mut mem, 0x100, 0x1800, None).unwrap();
        assert_eq!(original, 0x80);
        assert_eq!(mem.writes().len(), 2);
    }

    #[test]
    fn test_redirect_unreadable_source_fails() {
        let mut mem = BufferMemory::zeroed(0, 0x10);
        assert!(redirect_call(&mut mem, 0x100, 0, None).is_err());
        assert!(mem.writes().is_empty());
    }
}
