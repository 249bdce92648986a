//! Subcommands of the `avatar` binary.

use clap::Subcommand;

/// Available commands. With none given, `run` is assumed.
#[derive(Subcommand)]
pub enum Commands {
    /// Start the player and an interactive operator console
    Run {
        /// Clips to queue right after startup
        #[arg(long = "play")]
        play: Vec<String>,

        /// Queue every clip already in the directory at startup
        #[arg(long)]
        all: bool,

        /// Do not read commands from stdin; run until Ctrl+C
        #[arg(long)]
        headless: bool,
    },

    /// List audio output devices and their indices
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete stale clips from the clip directory and exit
    Sweep {
        /// Age in days (defaults to --stale-days)
        #[arg(long)]
        days: Option<u64>,
    },
}
