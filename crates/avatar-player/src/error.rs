//! Player error types.

use std::path::PathBuf;

/// Configuration problems detected at startup.
///
/// These are surfaced once; the engine keeps running in disabled mode
/// instead of taking the host process down.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configured clip format is not one the sink can decode.
    #[error("Unsupported clip format '{0}' (supported: wav)")]
    UnsupportedFormat(String),

    /// The clip directory path exists but is not a directory.
    #[error("{0} exists but is not a directory")]
    NotADirectory(PathBuf),

    /// The clip directory could not be created or read.
    #[error("Clip directory {path} is not accessible: {reason}")]
    DirectoryInaccessible { path: PathBuf, reason: String },

    /// A numeric setting is out of range.
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Errors produced by the audio delivery engine.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// Startup configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested clip does not exist on disk.
    #[error("Clip not found at {0}")]
    ClipNotFound(PathBuf),

    /// The clip could not be opened or decoded.
    #[error("Failed to decode clip {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// No output device exists at the configured index.
    #[error("No output device at index {0}")]
    NoOutputDevice(usize),

    /// No default output device is available.
    #[error("No default output device available")]
    NoDefaultOutputDevice,

    /// Failed to open the output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// Failed while writing to an open output stream.
    #[error("Audio output write failed: {0}")]
    OutputWriteError(String),

    /// Failed to enumerate output devices.
    #[error("Failed to enumerate audio devices: {0}")]
    DeviceEnumeration(String),

    /// The playback worker thread is gone.
    #[error("Playback worker thread died")]
    WorkerDied,

    /// The engine was disabled at startup by a configuration error.
    #[error("Audio player is disabled: {reason}")]
    Disabled { reason: String },

    /// The engine loop has already stopped.
    #[error("Audio player is not running")]
    NotRunning,

    /// IO error (clip directory, clip files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
