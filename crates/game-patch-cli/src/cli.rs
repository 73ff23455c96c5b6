use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "game-patch")]
#[command(about = "Apply and manage game patch definitions")]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, env = "GAME_PATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Identity of the game; missing values come from the game info record.
#[derive(Args, Debug, Clone, Default)]
pub struct GameArgs {
    /// Title id, e.g. BLUS30000
    #[arg(long)]
    pub titleid: Option<String>,

    /// Application version, e.g. 01.00
    #[arg(long)]
    pub app_ver: Option<String>,
}

/// Memory to operate on: a live process or an image file.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Process ID
    #[arg(long, conflicts_with = "image", required_unless_present = "image")]
    pub pid: Option<u32>,

    /// Raw memory image file
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Address the image is mapped at (hex)
    #[arg(long, default_value = "0")]
    pub image_base: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// List every patch variant of a definitions file
    List {
        #[command(flatten)]
        game: GameArgs,

        /// Definitions file (defaults to <definitions_dir>/<titleid>.yml)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Running binary name used to decide whether a patch is enabled
        #[arg(long)]
        binary: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the patches matching the game, with their entries
    Show {
        #[command(flatten)]
        game: GameArgs,

        /// Definitions file (defaults to <definitions_dir>/<titleid>.yml)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Only the patch with this exact title
        #[arg(long)]
        patch_title: Option<String>,

        /// Dry-run the patches against this memory image
        #[arg(long)]
        preview: Option<PathBuf>,

        /// Address the preview image is mapped at (hex)
        #[arg(long, default_value = "0", requires = "preview")]
        image_base: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Flip the enabled state of a patch
    Toggle {
        /// Title id owning the state store
        #[arg(long)]
        titleid: String,

        /// Patch hash (hex)
        hash: String,
    },

    /// Print the state store of a title
    State {
        /// Title id owning the state store
        #[arg(long)]
        titleid: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply the enabled patches to a running process
    Apply {
        #[command(flatten)]
        game: GameArgs,

        /// Process ID
        #[arg(long)]
        pid: u32,

        /// Running binary name (defaults to the configured binary)
        #[arg(long)]
        binary: Option<String>,
    },

    /// Search memory for a byte signature
    Scan {
        #[command(flatten)]
        target: TargetArgs,

        /// Region start address (hex)
        #[arg(long)]
        start: String,

        /// Region size (hex)
        #[arg(long)]
        size: String,

        /// Signature, e.g. "7F E3 ?? 78"
        pattern: String,

        /// Added to the match address
        #[arg(long, default_value_t = 0)]
        adjust: u64,
    },

    /// Point a call instruction in an image at a new target
    Redirect {
        /// Raw memory image file
        #[arg(long)]
        image: PathBuf,

        /// Address the image is mapped at (hex)
        #[arg(long, default_value = "0")]
        image_base: String,

        /// Address of the call instruction (hex)
        #[arg(long)]
        source: String,

        /// New call target (hex)
        #[arg(long)]
        new_target: String,

        /// Where to write a jump to the original target (hex)
        #[arg(long)]
        holder: Option<String>,

        /// Output image file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Display memory in hexdump format
    Hexdump {
        #[command(flatten)]
        target: TargetArgs,

        /// Start address (hex)
        #[arg(long)]
        address: String,

        /// Number of bytes
        #[arg(long, default_value_t = 256)]
        size: usize,

        /// Hide the ASCII column
        #[arg(long)]
        no_ascii: bool,
    },

    /// Read or write the game info record
    GameInfo {
        #[command(subcommand)]
        action: GameInfoAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum GameInfoAction {
    /// Print the recorded game
    Show,
    /// Record the running game
    Set {
        /// Title id
        titleid: String,
        /// Application version
        app_ver: String,
    },
}
