//! Shared control flags between the control surface, the loop and the sink.
//!
//! Every flag is a plain atomic boolean. Setting one is idempotent and safe
//! from any thread; the loop and the sink poll them at well-defined points
//! (top of each iteration, before each chunk). Mutation goes through the
//! methods below so the set of writers stays small.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug)]
struct Flags {
    enabled: AtomicBool,
    paused: AtomicBool,
    abort: AtomicBool,
    terminating: AtomicBool,
    speaking: AtomicBool,
}

/// Cloneable handle to the engine's control flags.
#[derive(Debug, Clone)]
pub struct ControlFlags {
    inner: Arc<Flags>,
}

impl ControlFlags {
    /// Create a neutral flag set.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            inner: Arc::new(Flags {
                enabled: AtomicBool::new(enabled),
                paused: AtomicBool::new(false),
                abort: AtomicBool::new(false),
                terminating: AtomicBool::new(false),
                speaking: AtomicBool::new(false),
            }),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    pub fn set_paused(&self, paused: bool) {
        self.inner.paused.store(paused, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_abort_requested(&self) -> bool {
        self.inner.abort.load(Ordering::SeqCst)
    }

    pub fn request_abort(&self) {
        self.inner.abort.store(true, Ordering::SeqCst);
    }

    /// Clear the abort flag, returning whether it was set.
    pub fn take_abort(&self) -> bool {
        self.inner.abort.swap(false, Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_terminating(&self) -> bool {
        self.inner.terminating.load(Ordering::SeqCst)
    }

    pub fn request_termination(&self) {
        self.inner.terminating.store(true, Ordering::SeqCst);
    }

    /// Whether a clip is currently being streamed to the device.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.inner.speaking.load(Ordering::SeqCst)
    }

    pub(crate) fn set_speaking(&self, speaking: bool) {
        self.inner.speaking.store(speaking, Ordering::SeqCst);
    }
}
