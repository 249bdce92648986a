//! Clip registry: which clips are pending, which one is playing.
//!
//! Owned and mutated only by the playback loop, so it needs no locking.
//! The watcher reads it to skip clips it already knows about.
//!
//! Three views are kept:
//! - `queued`: detected or enqueued, not yet dequeued for playback
//! - `current`: the clip the sink is streaming right now
//! - `retired`: clips whose file outlived their turn (aborted, failed to
//!   play, or could not be deleted). The watcher skips them so a stuck file
//!   is not replayed forever; an explicit enqueue brings them back.

use std::collections::HashSet;

use crate::clip::ClipPath;

/// In-memory bookkeeping for one watched directory.
#[derive(Debug, Default)]
pub struct ClipRegistry {
    queued: HashSet<ClipPath>,
    current: Option<ClipPath>,
    retired: HashSet<ClipPath>,
}

impl ClipRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the watcher should ignore this clip.
    #[must_use]
    pub fn is_known(&self, clip: &ClipPath) -> bool {
        self.queued.contains(clip) || self.current.as_ref() == Some(clip) || self.retired.contains(clip)
    }

    /// Whether the clip is pending or playing.
    #[must_use]
    pub fn is_pending(&self, clip: &ClipPath) -> bool {
        self.queued.contains(clip) || self.current.as_ref() == Some(clip)
    }

    /// Record a clip as queued. Returns `false` if it is already pending.
    ///
    /// An explicit request lifts a previous retirement.
    pub fn mark_queued(&mut self, clip: ClipPath) -> bool {
        if self.is_pending(&clip) {
            return false;
        }
        self.retired.remove(&clip);
        self.queued.insert(clip)
    }

    /// Move a dequeued clip into the playing slot.
    pub fn begin_playback(&mut self, clip: ClipPath) {
        self.queued.remove(&clip);
        self.current = Some(clip);
    }

    /// Clear the playing slot after the sink returned.
    ///
    /// When `retire` is set the file is expected to stay on disk and is
    /// kept out of future scans.
    pub fn finish_playback(&mut self, clip: &ClipPath, retire: bool) {
        if self.current.as_ref() == Some(clip) {
            self.current = None;
        }
        self.queued.remove(clip);
        if retire {
            self.retired.insert(clip.clone());
        }
    }

    /// Drop a clip that vanished before it could be played.
    pub fn forget(&mut self, clip: &ClipPath) {
        self.queued.remove(clip);
        self.retired.remove(clip);
        if self.current.as_ref() == Some(clip) {
            self.current = None;
        }
    }

    /// Forget retired clips whose files are gone.
    pub fn prune_retired(&mut self, on_disk: &HashSet<ClipPath>) {
        self.retired.retain(|clip| on_disk.contains(clip));
    }

    #[must_use]
    pub const fn current(&self) -> Option<&ClipPath> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn is_retired(&self, clip: &ClipPath) -> bool {
        self.retired.contains(clip)
    }

    /// Queued clips in path order.
    #[must_use]
    pub fn queued(&self) -> Vec<ClipPath> {
        let mut clips: Vec<ClipPath> = self.queued.iter().cloned().collect();
        clips.sort();
        clips
    }

    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }
}
