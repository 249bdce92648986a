//! Sweep command handler.
//!
//! Runs the same stale-clip cleanup the player does at startup, without
//! starting playback.

use std::time::{Duration, SystemTime};

use anyhow::Result;
use avatar_player::PlayerConfig;
use avatar_player::cleanup::sweep_stale_clips;
use avatar_player::config::ensure_clip_dir;

use crate::error::CliError;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Delete clips older than `days` (or the configured age) and report how
/// many were removed.
pub fn execute(config: &PlayerConfig, days: Option<u64>) -> Result<usize> {
    config.validate().map_err(CliError::from)?;
    let max_age = match days {
        Some(0) => None,
        Some(days) => Some(Duration::from_secs(days.saturating_mul(SECS_PER_DAY))),
        None => config.stale_after,
    };
    let Some(max_age) = max_age else {
        println!("Stale clip cleanup is disabled.");
        return Ok(0);
    };

    let dir = ensure_clip_dir(&config.clip_dir).map_err(CliError::from)?;
    let removed = sweep_stale_clips(&dir, &config.format, max_age, SystemTime::now())
        .map_err(CliError::from)?;
    println!("Removed {removed} stale clip(s) from {}", dir.display());
    Ok(removed)
}
