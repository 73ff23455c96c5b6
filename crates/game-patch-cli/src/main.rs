use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;

use cli::{Cli, Command};
use config::CliConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("game_patch={}", level).parse()?)
                .add_directive(format!("game_patch_cli={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::load(cli.config.as_deref())?;
    debug!("Using paths {:?}", config.paths);

    match cli.command {
        Command::List {
            game,
            file,
            binary,
            json,
        } => commands::list::run(&config, &game, file.as_deref(), binary.as_deref(), json),
        Command::Show {
            game,
            file,
            patch_title,
            preview,
            image_base,
            json,
        } => commands::show::run(
            &config,
            &game,
            file.as_deref(),
            patch_title.as_deref(),
            preview.as_deref().map(|path| (path, image_base.as_str())),
            json,
        ),
        Command::Toggle { titleid, hash } => commands::toggle::run(&config, &titleid, &hash),
        Command::State { titleid, json } => commands::state::run(&config, &titleid, json),
        Command::Apply { game, pid, binary } => {
            commands::apply::run(&config, &game, pid, binary.as_deref())
        }
        Command::Scan {
            target,
            start,
            size,
            pattern,
            adjust,
        } => commands::scan::run(&target, &start, &size, &pattern, adjust),
        Command::Redirect {
            image,
            image_base,
            source,
            new_target,
            holder,
            output,
        } => commands::redirect::run(
            &image,
            &image_base,
            &source,
            &new_target,
            holder.as_deref(),
            &output,
        ),
        Command::Hexdump {
            target,
            address,
            size,
            no_ascii,
        } => commands::hexdump::run(&target, &address, size, !no_ascii),
        Command::GameInfo { action } => commands::game_info::run(&config, action),
    }
}
