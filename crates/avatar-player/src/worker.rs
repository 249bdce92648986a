//! Dedicated playback thread: keeps blocking device I/O off the async runtime.
//!
//! Only one clip plays at a time, so a single long-lived OS thread is
//! enough. The loop hands it a clip over an `mpsc` channel and awaits a
//! `oneshot` completion; the output stream is opened, used, and dropped
//! entirely on this thread, which also keeps `!Send` device handles
//! confined to it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use tokio::sync::oneshot;

use crate::clip::ClipPath;
use crate::error::PlayerError;
use crate::sink::{DeviceSink, PlaybackOutcome};

enum WorkerCommand {
    /// Play a clip and report how it ended.
    Play {
        clip: ClipPath,
        reply: oneshot::Sender<PlaybackOutcome>,
    },

    /// Exit the thread.
    Shutdown,
}

/// Handle to the playback thread.
///
/// The thread owns the [`DeviceSink`] for its whole lifetime. If it dies
/// (a panicking output backend, say) the next [`play`](Self::play) call
/// reports [`PlaybackOutcome::Failed`] and [`ensure_running`](Self::ensure_running)
/// brings up a fresh thread.
pub struct PlaybackWorker {
    cmd_tx: mpsc::Sender<WorkerCommand>,
    thread: Option<thread::JoinHandle<()>>,
    make_sink: Box<dyn Fn() -> DeviceSink + Send + Sync>,
    died: AtomicBool,
}

impl PlaybackWorker {
    /// Spawn the worker thread. `make_sink` is called once per thread start.
    pub fn spawn(make_sink: impl Fn() -> DeviceSink + Send + Sync + 'static) -> Result<Self, PlayerError> {
        let make_sink: Box<dyn Fn() -> DeviceSink + Send + Sync> = Box::new(make_sink);
        let (cmd_tx, thread) = Self::start_thread(make_sink())?;
        Ok(Self {
            cmd_tx,
            thread: Some(thread),
            make_sink,
            died: AtomicBool::new(false),
        })
    }

    fn start_thread(
        sink: DeviceSink,
    ) -> Result<(mpsc::Sender<WorkerCommand>, thread::JoinHandle<()>), PlayerError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<WorkerCommand>();
        let thread = thread::Builder::new()
            .name("avatar-playback".into())
            .spawn(move || Self::run(&sink, &cmd_rx))?;
        Ok((cmd_tx, thread))
    }

    /// Restart the thread if it has exited.
    pub fn ensure_running(&mut self) -> Result<(), PlayerError> {
        let alive = !self.died.load(Ordering::SeqCst)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished());
        if alive {
            return Ok(());
        }
        // A dead thread may still be unwinding; joining waits it out.
        if let Some(dead) = self.thread.take() {
            if dead.join().is_err() {
                tracing::error!("Playback worker panicked; restarting");
            }
        }
        let (cmd_tx, thread) = Self::start_thread((self.make_sink)())?;
        self.cmd_tx = cmd_tx;
        self.thread = Some(thread);
        self.died.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Play `clip` on the worker thread and wait for it to finish.
    ///
    /// Suspends only the calling task; the runtime keeps running.
    pub async fn play(&self, clip: ClipPath) -> PlaybackOutcome {
        let (reply, done) = oneshot::channel();
        if self
            .cmd_tx
            .send(WorkerCommand::Play { clip, reply })
            .is_err()
        {
            return self.report_death();
        }
        match done.await {
            Ok(outcome) => outcome,
            Err(_) => self.report_death(),
        }
    }

    fn report_death(&self) -> PlaybackOutcome {
        self.died.store(true, Ordering::SeqCst);
        tracing::error!("Playback worker died mid-clip");
        PlaybackOutcome::Failed {
            reason: PlayerError::WorkerDied.to_string(),
        }
    }

    fn run(sink: &DeviceSink, cmd_rx: &mpsc::Receiver<WorkerCommand>) {
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                WorkerCommand::Play { clip, reply } => {
                    let outcome = sink.play(&clip);
                    // The loop may have gone away; nothing to report to.
                    let _ = reply.send(outcome);
                }
                WorkerCommand::Shutdown => break,
            }
        }
        tracing::debug!("Playback worker shutting down");
    }
}

impl Drop for PlaybackWorker {
    fn drop(&mut self) {
        // The thread may already be dead.
        let _ = self.cmd_tx.send(WorkerCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::clip::ClipFormat;
    use crate::flags::ControlFlags;
    use crate::output::{OutputDevice, OutputStream};

    /// Panics on the first open, then refuses politely.
    struct FlakyDevice {
        opens: AtomicUsize,
    }

    impl OutputDevice for FlakyDevice {
        fn open(&self, _format: ClipFormat) -> Result<Box<dyn OutputStream>, PlayerError> {
            if self.opens.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("driver crashed");
            }
            Err(PlayerError::OutputStreamError("no device".into()))
        }
    }

    fn write_clip(dir: &std::path::Path) -> ClipPath {
        let path = dir.join("a.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0i16).unwrap();
        writer.finalize().unwrap();
        ClipPath::resolve(dir, "a.wav")
    }

    #[tokio::test]
    async fn worker_death_is_reported_and_recovered() {
        let tmp = tempfile::tempdir().unwrap();
        let clip = write_clip(tmp.path());
        let device = Arc::new(FlakyDevice {
            opens: AtomicUsize::new(0),
        });
        let flags = ControlFlags::new(true);

        let mut worker = PlaybackWorker::spawn(move || {
            DeviceSink::new(device.clone(), flags.clone(), 64, Duration::from_millis(5))
        })
        .unwrap();

        let first = worker.play(clip.clone()).await;
        assert_eq!(
            first,
            PlaybackOutcome::Failed {
                reason: PlayerError::WorkerDied.to_string()
            }
        );

        worker.ensure_running().unwrap();
        let second = worker.play(clip).await;
        assert!(
            matches!(second, PlaybackOutcome::Failed { ref reason } if reason.contains("no device")),
            "unexpected outcome {second:?}"
        );
    }
}
