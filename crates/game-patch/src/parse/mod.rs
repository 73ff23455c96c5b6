//! Line-driven parser for patch definition files.
//!
//! One grammar, three traversals:
//!
//! | Mode       | Keeps entries         | Keeps metadata | Output            |
//! |------------|-----------------------|----------------|-------------------|
//! | `All`      | yes, matching patches | yes            | [`PatchData`]     |
//! | `Metadata` | no                    | every variant  | [`PatchMetadata`] |
//! | `LowMem`   | no                    | no             | a [`PatchSink`]   |
//!
//! `LowMem` holds only the patch being scanned, so memory use does not grow
//! with the file.

mod context;

use std::path::Path;

use strum::{Display, EnumString, IntoStaticStr};

pub use context::ParseContext;

use crate::error::Result;
use crate::game::GamePatchInfo;
use crate::patch::{PatchData, PatchEntry, PatchMetadata};
use crate::state::{PatchState, StateLookup, lookup, read_states};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ParseMode {
    #[strum(serialize = "all")]
    All,
    #[strum(serialize = "metadata")]
    Metadata,
    #[strum(serialize = "low_mem")]
    LowMem,
}

/// Receiver for the streaming mode.
pub trait PatchSink {
    /// Called at `patches:` for every variant matching the running game.
    fn on_metadata(&mut self, metadata: &PatchMetadata);

    /// Called for every well-formed entry of a matching, enabled variant.
    fn on_entry(&mut self, metadata: &PatchMetadata, entry: &PatchEntry);
}

/// What the parser needs to decide whether a patch is enabled.
#[derive(Debug, Clone, Default)]
pub struct ParseEnvironment {
    states: Vec<PatchState>,
    process_binary: Option<String>,
}

impl ParseEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the state store consulted for every variant.
    pub fn with_states(mut self, states: Vec<PatchState>) -> Self {
        self.states = states;
        self
    }

    /// Load the state snapshot from a settings file.
    pub fn with_settings_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.with_states(read_states(path))
    }

    /// Name of the running binary, matched against each patch's `app_bin`.
    pub fn with_process_binary(mut self, name: impl Into<String>) -> Self {
        self.process_binary = Some(name.into());
        self
    }

    pub fn states(&self) -> &[PatchState] {
        &self.states
    }

    pub fn process_binary(&self) -> Option<&str> {
        self.process_binary.as_deref()
    }

    pub fn lookup(&self, hash: u32) -> StateLookup {
        lookup(&self.states, hash)
    }

    /// Enabled in the store and targeting the running binary. `app_bin` is
    /// matched by substring.
    pub fn is_enabled(&self, hash: u32, app_bin: Option<&str>) -> bool {
        let targets_binary = match (app_bin, self.process_binary()) {
            (Some(app_bin), Some(binary)) => app_bin.contains(binary),
            _ => false,
        };
        targets_binary && self.lookup(hash).is_enabled()
    }
}

/// Parse a file and return every patch matching the game, optionally only
/// those titled `title`.
pub fn parse_all<P: AsRef<Path>>(
    path: P,
    game: GamePatchInfo,
    env: ParseEnvironment,
    title: Option<&str>,
) -> Result<Vec<PatchData>> {
    let mut ctx = ParseContext::new(game, env, ParseMode::All);
    if let Some(title) = title {
        ctx = ctx.with_title_filter(title);
    }
    ctx.parse_file(path)?;
    Ok(ctx.into_patches())
}

/// Parse a file and return the metadata of every patch variant.
pub fn parse_metadata<P: AsRef<Path>>(
    path: P,
    game: GamePatchInfo,
    env: ParseEnvironment,
) -> Result<Vec<PatchMetadata>> {
    let mut ctx = ParseContext::new(game, env, ParseMode::Metadata);
    ctx.parse_file(path)?;
    Ok(ctx.into_metadata())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_names() {
        assert_eq!("low_mem".parse::<ParseMode>().unwrap(), ParseMode::LowMem);
        assert_eq!(ParseMode::Metadata.to_string(), "metadata");
    }

    #[test]
    fn test_enabled_needs_state_and_binary() {
        let env = ParseEnvironment::new()
            .with_states(vec![PatchState::new(1, true), PatchState::new(2, false)])
            .with_process_binary("EBOOT.BIN");

        assert!(env.is_enabled(1, Some("/app_home/EBOOT.BIN")));
        assert!(!env.is_enabled(1, Some("libgame.sprx")));
        assert!(!env.is_enabled(1, None));
        assert!(!env.is_enabled(2, Some("EBOOT.BIN")));
        assert!(!env.is_enabled(3, Some("EBOOT.BIN")));

        let no_binary = ParseEnvironment::new().with_states(vec![PatchState::new(1, true)]);
        assert!(!no_binary.is_enabled(1, Some("EBOOT.BIN")));
    }
}
