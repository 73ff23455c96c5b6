//! Apply the enabled patches of the running title.
//!
//! Streams `<titleid>.yml` in low-memory mode against the title's state
//! store, writes every entry of each enabled patch and leaves a message in
//! the notification file when anything was applied.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::apply::{ApplyOutcome, PatchApplier, ProgramArgs};
use crate::config::PatchPaths;
use crate::error::Result;
use crate::game::GamePatchInfo;
use crate::memory::{ReadMemory, WriteMemory};
use crate::parse::{ParseContext, ParseEnvironment, ParseMode, PatchSink};
use crate::patch::{PatchEntry, PatchMetadata};

/// Totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Variants matching the game.
    pub matched: usize,
    /// Matching variants that were enabled.
    pub applied: usize,
    /// Successful memory writes.
    pub writes: usize,
    pub args_appended: usize,
    /// Entries that failed to apply.
    pub failures: usize,
}

/// Sink that applies forwarded entries as they are parsed.
pub struct ApplyingSink<'a, M> {
    applier: PatchApplier<'a, M>,
    summary: RunSummary,
}

impl<'a, M: ReadMemory + WriteMemory> ApplyingSink<'a, M> {
    pub fn new(applier: PatchApplier<'a, M>) -> Self {
        Self {
            applier,
            summary: RunSummary::default(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

impl<M: ReadMemory + WriteMemory> PatchSink for ApplyingSink<'_, M> {
    fn on_metadata(&mut self, metadata: &PatchMetadata) {
        self.summary.matched += 1;
        if metadata.enabled {
            self.summary.applied += 1;
            info!(
                "Applying patch #{} (Hash: 0x{:08x}) {}",
                metadata.patch_number,
                metadata.hash,
                metadata.display_title()
            );
        } else {
            debug!(
                "Patch #{} (Hash: 0x{:08x}) {} is disabled",
                metadata.patch_number,
                metadata.hash,
                metadata.display_title()
            );
        }
    }

    fn on_entry(&mut self, metadata: &PatchMetadata, entry: &PatchEntry) {
        if !metadata.enabled {
            return;
        }
        debug!("{}", entry);
        match self.applier.apply_entry_with_dump(entry) {
            Ok(ApplyOutcome::Written { .. }) => self.summary.writes += 1,
            Ok(ApplyOutcome::ArgsAppended { appended, failed }) => {
                self.summary.args_appended += appended;
                self.summary.failures += failed;
            }
            Ok(ApplyOutcome::Skipped) => {}
            Err(e) => {
                warn!("Failed to apply {}: {}", entry, e);
                self.summary.failures += 1;
            }
        }
    }
}

/// Message left for the user after applying `count` patches.
pub fn notify_message(count: usize) -> String {
    format!("Applied {} patch{}", count, if count == 1 { "" } else { "es" })
}

/// Parse and apply every enabled patch of `game`.
///
/// A missing definitions file means there is nothing to apply. The
/// notification file is written when at least one patch was applied and
/// removed otherwise.
pub fn run_patch<M: ReadMemory + WriteMemory>(
    paths: &PatchPaths,
    game: &GamePatchInfo,
    process_binary: &str,
    memory: M,
    args: Option<&mut ProgramArgs>,
) -> Result<RunSummary> {
    let definitions = paths.definitions_file(game.titleid());
    let env = ParseEnvironment::new()
        .with_settings_file(paths.settings_file(game.titleid()))
        .with_process_binary(process_binary);

    let mut applier = PatchApplier::new(memory);
    if let Some(args) = args {
        applier = applier.with_args(args);
    }
    let mut sink = ApplyingSink::new(applier);

    let parsed = ParseContext::new(*game, env, ParseMode::LowMem)
        .with_sink(&mut sink)
        .parse_file(&definitions);
    match parsed {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            info!("No patch file for {} at {}", game.titleid(), definitions.display());
        }
        Err(e) => return Err(e),
    }

    let summary = sink.summary();
    update_notification(&paths.notify_file(), summary.applied)?;
    Ok(summary)
}

fn update_notification(path: &Path, applied: usize) -> Result<()> {
    if applied > 0 {
        let message = notify_message(applied);
        fs::write(path, &message)?;
        info!("{}", message);
        return Ok(());
    }

    debug!("No patches applied, removing {}", path.display());
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
