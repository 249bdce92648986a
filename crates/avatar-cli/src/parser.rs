//! Main CLI parser and top-level argument handling.
//!
//! Every engine setting can also come from the environment (or a `.env`
//! file), which is how the assistant's launcher configures it.

use std::path::PathBuf;

use avatar_player::{DEFAULT_CLIP_DIR, DEFAULT_STALE_DAYS, PlayerConfig};
use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the avatar speech clip player.
#[derive(Parser)]
#[command(name = "avatar")]
#[command(about = "Play synthesized speech clips as they appear")]
#[command(version)]
pub struct Cli {
    /// Directory the speech synthesizer writes clips into
    #[arg(long = "clip-dir", env = "AVATAR_CLIP_DIR", global = true)]
    pub clip_dir: Option<PathBuf>,

    /// Output device index (see `avatar devices`); system default when unset
    #[arg(long = "device", env = "OUTPUT_DEVICE_INDEX", global = true)]
    pub device: Option<usize>,

    /// Clip file format
    #[arg(long = "format", env = "TTS_AUDIO_FORMAT", default_value = "wav", global = true)]
    pub format: String,

    /// Delete clips older than this many days at startup (0 disables)
    #[arg(
        long = "stale-days",
        env = "TTS_CLEANUP_DAYS",
        default_value_t = DEFAULT_STALE_DAYS,
        global = true
    )]
    pub stale_days: u64,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Engine configuration from the global options.
    pub fn player_config(&self) -> PlayerConfig {
        let clip_dir = self
            .clip_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIP_DIR));
        let mut config = PlayerConfig::new(clip_dir).with_stale_days(self.stale_days);
        config.format.clone_from(&self.format);
        config.output_device_index = self.device;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_args_flow_into_config() {
        let cli = Cli::parse_from([
            "avatar",
            "--clip-dir",
            "/tmp/clips",
            "--device",
            "2",
            "--stale-days",
            "0",
            "devices",
        ]);
        let config = cli.player_config();
        assert_eq!(config.clip_dir, PathBuf::from("/tmp/clips"));
        assert_eq!(config.output_device_index, Some(2));
        assert_eq!(config.stale_after, None);
        assert!(matches!(cli.command, Some(Commands::Devices { .. })));
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::parse_from(["avatar", "-v"]);
        assert!(cli.verbose);
        assert!(cli.command.is_none());
    }
}
