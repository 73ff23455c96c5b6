//! State command implementation.

use anyhow::Result;
use game_patch::PatchStateStore;
use serde::Serialize;

use crate::config::CliConfig;

#[derive(Serialize)]
struct StateRow {
    hash: String,
    enabled: bool,
}

/// Run the state command
pub fn run(config: &CliConfig, titleid: &str, json: bool) -> Result<()> {
    let store = PatchStateStore::new(config.paths.settings_file(titleid));
    let states = store.load();

    if json {
        let rows: Vec<StateRow> = states
            .iter()
            .map(|s| StateRow {
                hash: format!("0x{:08x}", s.hash),
                enabled: s.is_enabled(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} ({} record(s))", store.path().display(), states.len());
    for state in &states {
        println!(
            "  0x{:08x}  {}",
            state.hash,
            if state.is_enabled() { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}
