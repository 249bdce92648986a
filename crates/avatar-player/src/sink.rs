//! Device sink: streams one clip to the output device in fixed-size chunks.
//!
//! Blocking by nature; always called from the playback worker thread.
//!
//! Before each chunk is written the sink checks the control flags:
//! 1. while `paused`, it suspends the device and re-checks on a fixed poll
//!    interval (handles stay open, so resuming continues at the next chunk)
//! 2. if `abort` is raised, it clears the flag and stops early
//!
//! Writes and the final drain also watch `abort`, so a clip stuck on a
//! device that has stopped pulling audio can still be skipped.
//!
//! Open or streaming failures are logged and reported as
//! [`PlaybackOutcome::Failed`]; they never escape to the loop as errors.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::clip::{ClipPath, ClipReader};
use crate::error::PlayerError;
use crate::flags::ControlFlags;
use crate::output::{OutputDevice, OutputStream};

/// How one playback session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PlaybackOutcome {
    /// Every chunk was written and drained.
    Completed { chunks: usize },
    /// Stopped early by an abort request.
    Aborted { chunks: usize },
    /// The clip or the device failed.
    Failed { reason: String },
}

impl PlaybackOutcome {
    /// Only a clean finish makes the clip eligible for deletion.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Plays clips on an [`OutputDevice`], honouring pause and abort.
pub(crate) struct DeviceSink {
    device: Arc<dyn OutputDevice>,
    flags: ControlFlags,
    chunk_frames: usize,
    pause_poll: Duration,
}

impl DeviceSink {
    pub fn new(
        device: Arc<dyn OutputDevice>,
        flags: ControlFlags,
        chunk_frames: usize,
        pause_poll: Duration,
    ) -> Self {
        Self {
            device,
            flags,
            chunk_frames: chunk_frames.max(1),
            pause_poll,
        }
    }

    /// Play `clip` to completion, abort, or failure. Blocks the caller.
    pub fn play(&self, clip: &ClipPath) -> PlaybackOutcome {
        match self.stream_clip(clip) {
            Ok(outcome) => {
                tracing::debug!(clip = %clip, ?outcome, "Playback session ended");
                outcome
            }
            Err(e) => {
                tracing::warn!(clip = %clip, error = %e, "Playback failed");
                PlaybackOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn stream_clip(&self, clip: &ClipPath) -> Result<PlaybackOutcome, PlayerError> {
        let reader = ClipReader::open(clip.as_path())?;
        let format = reader.format();
        tracing::info!(clip = %clip, format = %format, "Playing clip");

        // On failure `reader` is dropped here, closing the file.
        let output = self.device.open(format)?;

        let mut session = SinkSession {
            output: Some(output),
            reader: Some(reader),
            drained: false,
        };
        session.stream(self)
    }

    /// Block while paused. The device is suspended for the duration so
    /// audio already handed over does not keep playing.
    fn wait_while_paused(&self, output: &mut dyn OutputStream) {
        if !self.flags.is_paused() {
            return;
        }
        tracing::debug!("Playback paused");
        output.set_paused(true);
        while self.flags.is_paused() && !self.flags.is_abort_requested() {
            thread::sleep(self.pause_poll);
        }
        if !self.flags.is_abort_requested() {
            output.set_paused(false);
            tracing::debug!("Playback resumed");
        }
    }
}

/// Resources held for one clip.
///
/// Released on every exit path (success, abort, error or panic) in a fixed
/// order: output stream, device handle, then the clip's file descriptor.
struct SinkSession {
    output: Option<Box<dyn OutputStream>>,
    reader: Option<ClipReader>,
    drained: bool,
}

impl SinkSession {
    fn stream(&mut self, sink: &DeviceSink) -> Result<PlaybackOutcome, PlayerError> {
        let (Some(output), Some(reader)) = (self.output.as_mut(), self.reader.as_mut()) else {
            return Err(PlayerError::OutputStreamError("session already released".into()));
        };

        let cancel = || sink.flags.is_abort_requested();
        let mut chunks = 0usize;
        while let Some(chunk) = reader.next_chunk(sink.chunk_frames)? {
            sink.wait_while_paused(output.as_mut());

            if sink.flags.take_abort() {
                tracing::info!(chunks, "Playback aborted");
                return Ok(PlaybackOutcome::Aborted { chunks });
            }

            output.write(&chunk, &cancel)?;
            chunks += 1;
        }

        output.drain(&cancel)?;
        if sink.flags.take_abort() {
            tracing::info!(chunks, "Playback aborted while draining");
            return Ok(PlaybackOutcome::Aborted { chunks });
        }
        self.drained = true;
        Ok(PlaybackOutcome::Completed { chunks })
    }
}

impl Drop for SinkSession {
    fn drop(&mut self) {
        if let Some(mut output) = self.output.take() {
            if !self.drained {
                output.stop();
            }
            // Dropping the stream releases the device handle with it.
            drop(output);
        }
        drop(self.reader.take());
        tracing::trace!("Playback session released");
    }
}
