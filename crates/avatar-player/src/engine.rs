//! Playback loop: the single control loop of the engine.
//!
//! ```text
//!   Idle → Scanning → Dequeuing → Playing → Deleting → Idle
//!     │
//!     └→ Terminated   (only once `terminating` is observed while idle)
//! ```
//!
//! The loop owns the registry and the queue outright; control requests
//! reach it through an unbounded channel and are applied during the
//! Scanning phase, so membership changes only ever happen on this task.
//! Blocking playback is handed to the [`PlaybackWorker`] and awaited.
//! Nothing that goes wrong with a single clip ends the loop.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::SystemTime;

use tokio::sync::{mpsc, watch};

use crate::cleanup::{ClipRemover, DeleteOutcome, delete_with_retry, sweep_stale_clips};
use crate::clip::ClipPath;
use crate::config::PlayerConfig;
use crate::events::{LoopSnapshot, LoopState, PlayerEvent};
use crate::flags::ControlFlags;
use crate::queue::{PlaybackQueue, QueueEntry};
use crate::registry::ClipRegistry;
use crate::sink::PlaybackOutcome;
use crate::watcher::{DirectoryWatcher, list_clips};
use crate::worker::PlaybackWorker;

/// Requests sent from the control surface to the loop.
#[derive(Debug)]
pub(crate) enum Request {
    /// Append a clip to the queue.
    Enqueue(ClipPath),
    /// Put a clip at the head of the queue.
    EnqueueFront(ClipPath),
    /// Append the "play all" sentinel.
    EnqueueAll,
}

pub(crate) struct PlaybackLoop {
    config: PlayerConfig,
    clip_dir: PathBuf,
    flags: ControlFlags,
    registry: ClipRegistry,
    queue: PlaybackQueue,
    watcher: DirectoryWatcher,
    requests: mpsc::UnboundedReceiver<Request>,
    worker: PlaybackWorker,
    remover: ClipRemover,
    events: mpsc::UnboundedSender<PlayerEvent>,
    snapshot: watch::Sender<LoopSnapshot>,
    state: LoopState,
    swept: bool,
}

/// Channels and collaborators the loop is built from.
pub(crate) struct LoopParts {
    pub config: PlayerConfig,
    pub clip_dir: PathBuf,
    pub flags: ControlFlags,
    pub requests: mpsc::UnboundedReceiver<Request>,
    pub worker: PlaybackWorker,
    pub remover: ClipRemover,
    pub events: mpsc::UnboundedSender<PlayerEvent>,
    pub snapshot: watch::Sender<LoopSnapshot>,
}

impl PlaybackLoop {
    pub(crate) fn new(parts: LoopParts) -> Self {
        let watcher = DirectoryWatcher::new(
            parts.clip_dir.clone(),
            parts.config.format.clone(),
            parts.config.scan_interval,
        );
        Self {
            config: parts.config,
            clip_dir: parts.clip_dir,
            flags: parts.flags,
            registry: ClipRegistry::new(),
            queue: PlaybackQueue::new(),
            watcher,
            requests: parts.requests,
            worker: parts.worker,
            remover: parts.remover,
            events: parts.events,
            snapshot: parts.snapshot,
            state: LoopState::Idle,
            swept: false,
        }
    }

    /// Run until `terminating` is observed at the top of an iteration.
    pub(crate) async fn run(mut self) {
        tracing::info!(dir = %self.clip_dir.display(), "Audio player loop started");

        loop {
            self.set_state(LoopState::Idle);

            if !self.flags.is_enabled() {
                tokio::time::sleep(self.config.disabled_poll_interval).await;
                if self.flags.is_terminating() {
                    break;
                }
                continue;
            }

            // Once per run, before the first scan can pick old clips up.
            if !self.swept {
                self.swept = true;
                self.sweep_stale();
            }

            tokio::time::sleep(self.config.tick_interval).await;
            if self.flags.is_terminating() {
                break;
            }
            self.reset_flags();

            self.set_state(LoopState::Scanning);
            self.take_requests();
            self.scan_directory();

            self.set_state(LoopState::Dequeuing);
            let Some(clip) = self.dequeue() else {
                continue;
            };

            self.set_state(LoopState::Playing);
            let outcome = self.play(&clip).await;

            self.set_state(LoopState::Deleting);
            self.settle(&clip, &outcome).await;
        }

        self.set_state(LoopState::Terminated);
        self.emit(PlayerEvent::Stopped);
        tracing::info!("Audio player loop stopped");
    }

    /// Neutral flags between clips: a leftover abort is always dropped, a
    /// pause only when nothing is waiting to play.
    fn reset_flags(&self) {
        if self.flags.take_abort() {
            tracing::debug!("Discarded abort request outside playback");
        }
        if self.queue.is_empty() && self.flags.is_paused() {
            self.flags.set_paused(false);
        }
    }

    fn sweep_stale(&self) {
        let Some(max_age) = self.config.stale_after else {
            return;
        };
        if let Err(e) = sweep_stale_clips(
            &self.clip_dir,
            &self.config.format,
            max_age,
            SystemTime::now(),
        ) {
            tracing::warn!(error = %e, "Stale clip sweep failed");
        }
    }

    fn take_requests(&mut self) {
        while let Ok(request) = self.requests.try_recv() {
            match request {
                Request::Enqueue(clip) => self.push_clip(clip, false),
                Request::EnqueueFront(clip) => self.push_clip(clip, true),
                Request::EnqueueAll => self.queue.enqueue(QueueEntry::All),
            }
        }
    }

    /// Register and queue a clip unless it is already pending.
    fn push_clip(&mut self, clip: ClipPath, front: bool) {
        if front && self.queue.remove(&clip) {
            self.queue.enqueue_front(QueueEntry::Clip(clip));
            return;
        }
        if !self.registry.mark_queued(clip.clone()) {
            tracing::debug!(clip = %clip, "Clip already pending; not queued again");
            return;
        }
        tracing::debug!(clip = %clip, front, "Clip queued");
        if front {
            self.queue.enqueue_front(QueueEntry::Clip(clip.clone()));
        } else {
            self.queue.enqueue(QueueEntry::Clip(clip.clone()));
        }
        self.emit(PlayerEvent::ClipQueued(clip));
    }

    fn scan_directory(&mut self) {
        match self.watcher.poll(&self.registry) {
            None => {}
            Some(Ok(scan)) => {
                let on_disk: HashSet<ClipPath> = scan.on_disk.into_iter().collect();
                self.registry.prune_retired(&on_disk);
                for clip in scan.new {
                    tracing::info!(clip = %clip, "Detected new clip");
                    self.push_clip(clip, false);
                }
            }
            Some(Err(e)) => {
                tracing::warn!(dir = %self.watcher.dir().display(), error = %e, "Clip directory scan failed");
            }
        }
    }

    /// Pop the next playable clip.
    ///
    /// A "play all" sentinel expands in place and yields nothing this
    /// iteration; so does a clip whose file has disappeared.
    fn dequeue(&mut self) -> Option<ClipPath> {
        match self.queue.dequeue()? {
            QueueEntry::All => {
                self.expand_all();
                None
            }
            QueueEntry::Clip(clip) if !clip.exists() => {
                tracing::debug!(clip = %clip, "Queued clip vanished; dropping it");
                self.registry.forget(&clip);
                self.emit(PlayerEvent::ClipMissing(clip));
                None
            }
            QueueEntry::Clip(clip) => Some(clip),
        }
    }

    fn expand_all(&mut self) {
        match list_clips(&self.clip_dir, &self.config.format) {
            Ok(clips) => {
                tracing::info!(count = clips.len(), "Queueing all known clips");
                for clip in clips {
                    self.push_clip(clip, false);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Cannot list clips for play-all"),
        }
    }

    async fn play(&mut self, clip: &ClipPath) -> PlaybackOutcome {
        self.registry.begin_playback(clip.clone());
        self.flags.take_abort();
        self.publish();

        if let Err(e) = self.worker.ensure_running() {
            tracing::error!(error = %e, "Playback worker unavailable");
            return PlaybackOutcome::Failed {
                reason: e.to_string(),
            };
        }

        self.flags.set_speaking(true);
        self.emit(PlayerEvent::ClipStarted(clip.clone()));
        let outcome = self.worker.play(clip.clone()).await;
        self.flags.set_speaking(false);

        self.emit(PlayerEvent::ClipFinished {
            clip: clip.clone(),
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Reclaim storage for a completed clip and clear its bookkeeping.
    ///
    /// Aborted or failed clips are left on disk untouched and retired so
    /// the watcher does not replay them.
    async fn settle(&mut self, clip: &ClipPath, outcome: &PlaybackOutcome) {
        if !outcome.is_completed() {
            self.registry.finish_playback(clip, clip.exists());
            return;
        }

        match delete_with_retry(clip, &self.config.delete_policy, &self.remover).await {
            DeleteOutcome::Deleted { .. } => {
                self.registry.finish_playback(clip, false);
                self.emit(PlayerEvent::ClipDeleted(clip.clone()));
            }
            DeleteOutcome::GaveUp { attempts } => {
                self.registry.finish_playback(clip, true);
                self.emit(PlayerEvent::DeleteAbandoned {
                    clip: clip.clone(),
                    attempts,
                });
            }
        }
    }

    fn set_state(&mut self, state: LoopState) {
        self.state = state;
        self.publish();
    }

    fn publish(&self) {
        let snapshot = LoopSnapshot {
            state: self.state,
            current: self.registry.current().cloned(),
            queued: self.queue.clips(),
        };
        self.snapshot.send_replace(snapshot);
    }

    fn emit(&self, event: PlayerEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}
