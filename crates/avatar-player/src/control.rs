//! Control surface: how the orchestrator starts, steers and stops the engine.
//!
//! [`AudioPlayer`] owns the background loop task. [`PlayerHandle`] is the
//! cheap, cloneable API handed to the rest of the process: every method is
//! a synchronous signal (a request on the loop's channel or a flag flip)
//! and never touches the device directly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::cleanup::{ClipRemover, fs_remover};
use crate::clip::ClipPath;
use crate::config::{PlayerConfig, ensure_clip_dir};
use crate::engine::{LoopParts, PlaybackLoop, Request};
use crate::error::PlayerError;
use crate::events::{LoopSnapshot, PlayerEvent, PlayerStatus};
use crate::flags::ControlFlags;
use crate::output::{LocalOutput, OutputDevice};
use crate::sink::DeviceSink;
use crate::watcher::list_clips;
use crate::worker::PlaybackWorker;

/// Builder for [`AudioPlayer`], used to swap in a different output device
/// or clip remover.
pub struct PlayerBuilder {
    config: PlayerConfig,
    output: Option<Arc<dyn OutputDevice>>,
    remover: Option<ClipRemover>,
}

impl PlayerBuilder {
    /// Play through `output` instead of the local device.
    #[must_use]
    pub fn output(mut self, output: Arc<dyn OutputDevice>) -> Self {
        self.output = Some(output);
        self
    }

    /// Remove played clips with `remover` instead of `std::fs::remove_file`.
    #[must_use]
    pub fn remover(mut self, remover: ClipRemover) -> Self {
        self.remover = Some(remover);
        self
    }

    /// Start the loop as a background task on the current Tokio runtime.
    ///
    /// Configuration problems do not fail the call: they are logged once
    /// and the engine runs disabled. Only failing to spawn the playback
    /// thread is an error.
    pub fn start(self) -> Result<(AudioPlayer, mpsc::UnboundedReceiver<PlayerEvent>), PlayerError> {
        let Self {
            config,
            output,
            remover,
        } = self;

        let flags = ControlFlags::new(config.enabled);
        let resolved = config
            .validate()
            .and_then(|()| ensure_clip_dir(&config.clip_dir));
        let (clip_dir, disabled_reason) = match resolved {
            Ok(dir) => (dir, None),
            Err(e) => {
                tracing::error!(error = %e, "Audio player configuration invalid; running disabled");
                flags.set_enabled(false);
                (config.clip_dir.clone(), Some(Arc::<str>::from(e.to_string())))
            }
        };

        let output =
            output.unwrap_or_else(|| Arc::new(LocalOutput::new(config.output_device_index)));
        tracing::info!(
            device_index = ?config.output_device_index,
            dir = %clip_dir.display(),
            "Audio player starting"
        );

        let worker = {
            let flags = flags.clone();
            let chunk_frames = config.chunk_frames;
            let pause_poll = config.pause_poll_interval;
            PlaybackWorker::spawn(move || {
                DeviceSink::new(Arc::clone(&output), flags.clone(), chunk_frames, pause_poll)
            })?
        };

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(LoopSnapshot::default());

        let handle = PlayerHandle {
            flags: flags.clone(),
            requests: request_tx,
            snapshot: snapshot_rx,
            clip_dir: clip_dir.clone(),
            format: config.format.clone(),
            disabled_reason,
        };

        let engine = PlaybackLoop::new(LoopParts {
            config,
            clip_dir,
            flags,
            requests: request_rx,
            worker,
            remover: remover.unwrap_or_else(fs_remover),
            events: event_tx,
            snapshot: snapshot_tx,
        });
        let task = tokio::spawn(engine.run());

        Ok((
            AudioPlayer {
                handle,
                task: Some(task),
            },
            event_rx,
        ))
    }
}

/// The running engine: a control handle plus the loop's background task.
///
/// Dropping it without [`shutdown`](Self::shutdown) still stops the loop
/// after its current iteration, and with it every cloned handle.
pub struct AudioPlayer {
    handle: PlayerHandle,
    task: Option<JoinHandle<()>>,
}

impl AudioPlayer {
    /// Builder with the local output device and filesystem deletion.
    #[must_use]
    pub fn builder(config: PlayerConfig) -> PlayerBuilder {
        PlayerBuilder {
            config,
            output: None,
            remover: None,
        }
    }

    /// Start with default collaborators. See [`PlayerBuilder::start`].
    pub fn start(
        config: PlayerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<PlayerEvent>), PlayerError> {
        Self::builder(config).start()
    }

    /// A cloneable control handle.
    #[must_use]
    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Whether the loop task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal termination and wait for the loop to finish its current
    /// iteration, including any clip still playing.
    pub async fn shutdown(mut self) -> Result<(), PlayerError> {
        self.handle.stop();
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        task.await.map_err(|e| {
            tracing::error!(error = %e, "Audio player loop did not exit cleanly");
            PlayerError::NotRunning
        })
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        if self.task.is_some() {
            tracing::debug!("Audio player dropped without shutdown; stopping loop");
            self.handle.stop();
        }
    }
}

/// Cloneable control API for a running [`AudioPlayer`].
#[derive(Clone)]
pub struct PlayerHandle {
    flags: ControlFlags,
    requests: mpsc::UnboundedSender<Request>,
    snapshot: watch::Receiver<LoopSnapshot>,
    clip_dir: PathBuf,
    format: String,
    disabled_reason: Option<Arc<str>>,
}

impl PlayerHandle {
    /// Queue a clip by file name (resolved against the clip directory) or
    /// absolute path.
    ///
    /// A missing file is a no-op: it is logged and reported as
    /// [`PlayerError::ClipNotFound`].
    pub fn enqueue(&self, name_or_path: &str) -> Result<ClipPath, PlayerError> {
        let clip = self.existing_clip(name_or_path)?;
        self.send(Request::Enqueue(clip.clone()))?;
        Ok(clip)
    }

    /// Queue every clip currently in the directory, in production order.
    pub fn enqueue_all(&self) -> Result<(), PlayerError> {
        self.send(Request::EnqueueAll)
    }

    /// Abort the current clip and play `name_or_path` next.
    pub fn play_now(&self, name_or_path: &str) -> Result<ClipPath, PlayerError> {
        let clip = self.existing_clip(name_or_path)?;
        self.send(Request::EnqueueFront(clip.clone()))?;
        self.abort_current();
        Ok(clip)
    }

    /// Pause the clip being played. Returns `false` (and does nothing) when
    /// no clip is playing.
    pub fn pause(&self) -> bool {
        if !self.flags.is_speaking() {
            tracing::debug!("Pause ignored; nothing is playing");
            return false;
        }
        self.flags.set_paused(true);
        true
    }

    /// Resume a paused clip.
    pub fn resume(&self) {
        self.flags.set_paused(false);
    }

    /// Stop the clip being played early. Returns `false` (and does nothing)
    /// when no clip is playing.
    pub fn abort_current(&self) -> bool {
        if !self.flags.is_speaking() {
            tracing::debug!("Abort ignored; nothing is playing");
            return false;
        }
        self.flags.request_abort();
        true
    }

    /// Ask the loop to exit after its current iteration.
    ///
    /// A paused clip is resumed so that iteration can finish.
    pub fn stop(&self) {
        self.flags.request_termination();
        self.flags.set_paused(false);
    }

    /// Turn the engine on or off without stopping the loop.
    ///
    /// Cannot enable an engine whose configuration failed validation.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), PlayerError> {
        if enabled {
            if let Some(reason) = &self.disabled_reason {
                return Err(PlayerError::Disabled {
                    reason: reason.to_string(),
                });
            }
        }
        self.flags.set_enabled(enabled);
        Ok(())
    }

    /// Names of the clips currently in the directory.
    pub fn known_clips(&self) -> Result<Vec<String>, PlayerError> {
        Ok(list_clips(&self.clip_dir, &self.format)?
            .iter()
            .map(ClipPath::name)
            .collect())
    }

    /// Whether a clip is being streamed right now.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.flags.is_speaking()
    }

    /// Why the engine was disabled at startup, if it was.
    #[must_use]
    pub fn disabled_reason(&self) -> Option<&str> {
        self.disabled_reason.as_deref()
    }

    /// The resolved clip directory.
    #[must_use]
    pub fn clip_dir(&self) -> &Path {
        &self.clip_dir
    }

    /// Current engine status.
    #[must_use]
    pub fn status(&self) -> PlayerStatus {
        let snapshot = self.snapshot.borrow();
        PlayerStatus {
            state: snapshot.state,
            enabled: self.flags.is_enabled(),
            paused: self.flags.is_paused(),
            speaking: self.flags.is_speaking(),
            current: snapshot.current.as_ref().map(ClipPath::name),
            queued: snapshot.queued.iter().map(ClipPath::name).collect(),
        }
    }

    /// Resolve a requested clip to the identity the watcher would give it.
    fn existing_clip(&self, name_or_path: &str) -> Result<ClipPath, PlayerError> {
        let requested = ClipPath::resolve(&self.clip_dir, name_or_path.trim());
        let canonical = requested
            .exists()
            .then(|| requested.canonical())
            .and_then(Result::ok);
        canonical.ok_or_else(|| {
            tracing::warn!(clip = %requested, "Requested clip does not exist");
            PlayerError::ClipNotFound(requested.as_path().to_path_buf())
        })
    }

    fn send(&self, request: Request) -> Result<(), PlayerError> {
        self.requests
            .send(request)
            .map_err(|_| PlayerError::NotRunning)
    }
}
