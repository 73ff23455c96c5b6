//! Apply command implementation.

use anyhow::Result;

use super::resolve_game;
use crate::cli::GameArgs;
use crate::config::CliConfig;

/// Run the apply command
#[cfg(unix)]
pub fn run(config: &CliConfig, game: &GameArgs, pid: u32, binary: Option<&str>) -> Result<()> {
    use game_patch::{ProcessHandle, run_patch};

    let game = resolve_game(config, game)?;
    let process = ProcessHandle::open_writable(pid)?;
    println!("Patching {} {} in process {}", game.titleid(), game.app_ver(), process.pid);

    let summary = run_patch(
        &config.paths,
        &game,
        binary.unwrap_or(&config.binary),
        process,
        None,
    )?;

    println!(
        "Matched {}, applied {}, {} write(s), {} failure(s)",
        summary.matched, summary.applied, summary.writes, summary.failures
    );
    Ok(())
}

#[cfg(not(unix))]
pub fn run(config: &CliConfig, game: &GameArgs, pid: u32, _binary: Option<&str>) -> Result<()> {
    let game = resolve_game(config, game)?;
    anyhow::bail!(
        "Live patching of {} (pid {}) is not supported on this platform",
        game.titleid(),
        pid
    )
}
