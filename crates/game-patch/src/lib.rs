//! Load-time patching of a running game from declarative patch files.
//!
//! The pieces, leaves first:
//!
//! - [`text`] and [`lines`]: the line-level grammar of patch files
//! - [`patch`]: patch records and their FNV-1a identity
//! - [`parse`]: the line state machine with its three traversal modes
//! - [`state`]: the binary store of user toggles
//! - [`apply`]: writing entries into a target through [`memory`]
//! - [`scan`]: signature search and call-site redirection
//! - [`runner`]: the end-to-end "apply patches for this title" driver

pub mod apply;
pub mod config;
#[cfg(feature = "debug-tools")]
pub mod debug;
pub mod error;
pub mod game;
pub mod lines;
pub mod memory;
pub mod parse;
pub mod patch;
pub mod runner;
pub mod scan;
pub mod state;
pub mod text;

pub use apply::{ApplyOutcome, Endian, PatchApplier, PatchOp, ProgramArgs};
pub use config::PatchPaths;
pub use error::{Error, Result};
pub use game::{GamePatchInfo, load_game_info, save_game_info};
pub use memory::{BufferMemory, ReadMemory, WriteMemory};
#[cfg(unix)]
pub use memory::ProcessHandle;
pub use parse::{ParseContext, ParseEnvironment, ParseMode, PatchSink, parse_all, parse_metadata};
pub use patch::{Patch, PatchData, PatchEntry, PatchMetadata};
pub use runner::{RunSummary, run_patch};
pub use scan::{Signature, pattern_scan, redirect_call};
pub use state::{PatchState, PatchStateStore, StateLookup};
