//! CLI-specific error types and mappings.
//!
//! Maps [`PlayerError`] to exit codes and user-facing messages.

use avatar_player::{ConfigError, PlayerError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument or console command error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (clip directory, stdin).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio device error.
    #[error("Audio device error: {0}")]
    Device(String),

    /// The player stopped or never started.
    #[error("Player error: {0}")]
    Player(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow sysexits.h where one fits.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Arguments(_) => 64, // EX_USAGE
            Self::Io(_) => 74,        // EX_IOERR
            Self::Config(_) => 78,    // EX_CONFIG
            Self::Device(_) => 69,    // EX_UNAVAILABLE
            Self::Player(_) => 70,    // EX_SOFTWARE
        }
    }
}

impl From<PlayerError> for CliError {
    fn from(err: PlayerError) -> Self {
        match err {
            PlayerError::Config(e) => Self::Config(e.to_string()),
            PlayerError::Disabled { reason } => Self::Config(reason),
            PlayerError::ClipNotFound(path) => {
                Self::Arguments(format!("no such clip: {}", path.display()))
            }
            e @ (PlayerError::NoOutputDevice(_)
            | PlayerError::NoDefaultOutputDevice
            | PlayerError::OutputStreamError(_)
            | PlayerError::OutputWriteError(_)
            | PlayerError::DeviceEnumeration(_)) => Self::Device(e.to_string()),
            PlayerError::Io(e) => Self::Io(e.to_string()),
            e => Self::Player(e.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn player_errors_map_to_exit_codes() {
        let cases = [
            (PlayerError::NoOutputDevice(3), 69),
            (PlayerError::ClipNotFound(PathBuf::from("a.wav")), 64),
            (
                PlayerError::Config(ConfigError::UnsupportedFormat("mp3".into())),
                78,
            ),
            (PlayerError::NotRunning, 70),
        ];
        for (err, code) in cases {
            assert_eq!(CliError::from(err).exit_code(), code);
        }
    }
}
