//! Events and status snapshots published by the playback loop.

use serde::Serialize;

use crate::clip::ClipPath;
use crate::sink::PlaybackOutcome;

/// Phase of the playback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoopState {
    /// Sleeping between iterations (or disabled).
    #[default]
    Idle,
    /// Taking in control requests and listing the clip directory.
    Scanning,
    /// Popping the next queue entry.
    Dequeuing,
    /// A clip is streaming on the playback worker.
    Playing,
    /// Removing the clip that just finished.
    Deleting,
    /// The loop has exited.
    Terminated,
}

/// Events emitted by the engine to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// A clip was detected or requested and added to the queue.
    ClipQueued(ClipPath),

    /// The sink started streaming a clip.
    ClipStarted(ClipPath),

    /// The sink returned.
    ClipFinished {
        clip: ClipPath,
        outcome: PlaybackOutcome,
    },

    /// A played clip was removed from disk.
    ClipDeleted(ClipPath),

    /// Deletion failed on every attempt; the file was left in place.
    DeleteAbandoned { clip: ClipPath, attempts: u32 },

    /// A queued clip vanished before its turn.
    ClipMissing(ClipPath),

    /// The loop exited.
    Stopped,
}

/// What the loop publishes after every phase change.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoopSnapshot {
    pub state: LoopState,
    pub current: Option<ClipPath>,
    pub queued: Vec<ClipPath>,
}

/// Point-in-time view of the engine for the orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub state: LoopState,
    pub enabled: bool,
    pub paused: bool,
    pub speaking: bool,
    /// File name of the clip being played.
    pub current: Option<String>,
    /// File names of pending clips, in play order.
    pub queued: Vec<String>,
}
