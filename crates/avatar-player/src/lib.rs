#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod cleanup;
pub mod clip;
pub mod config;
pub mod control;
mod engine;
pub mod error;
pub mod events;
mod flags;
pub mod output;
pub mod queue;
pub mod registry;
pub mod sink;
pub mod watcher;
mod worker;

// Re-export key types for convenience
pub use cleanup::{ClipRemover, DeleteOutcome};
pub use clip::{ClipFormat, ClipPath};
pub use config::{DEFAULT_CLIP_DIR, DEFAULT_STALE_DAYS, DeletePolicy, PlayerConfig};
pub use control::{AudioPlayer, PlayerBuilder, PlayerHandle};
pub use error::{ConfigError, PlayerError};
pub use events::{LoopState, PlayerEvent, PlayerStatus};
pub use output::{LocalOutput, OutputDevice, OutputDeviceInfo, OutputStream, list_output_devices};
pub use sink::PlaybackOutcome;
