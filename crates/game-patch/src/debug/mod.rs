//! Debug utilities for inspecting patch targets
//!
//! This module provides tools for:
//! - Capturing and printing raw memory regions (`MemoryDump`)
//! - Checking what a patch file would do to a region (`PatchPreview`)

mod dump;
mod preview;

pub use dump::MemoryDump;
pub use preview::{PatchPreview, PreviewedWrite};
