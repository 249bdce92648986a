//! Output device abstraction and the local `rodio`/`cpal` implementation.
//!
//! The sink is written against [`OutputDevice`] / [`OutputStream`] so the
//! playback loop can be driven without audio hardware:
//!
//! | Implementor | Where used |
//! |---|---|
//! | [`LocalOutput`] | CLI / orchestrator: rodio playback on a cpal device |
//! | test doubles | integration tests: record every chunk written |
//!
//! A stream is opened, used, and dropped on the playback worker thread, so
//! [`OutputStream`] does not need to be `Send` (`rodio::OutputStream` is
//! `!Send` on some platforms).

use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait};
use rodio::buffer::SamplesBuffer;
use serde::Serialize;

use crate::clip::ClipFormat;
use crate::error::PlayerError;

/// Factory for per-clip output streams.
pub trait OutputDevice: Send + Sync {
    /// Open a stream matching the clip's channel count and sample rate.
    fn open(&self, format: ClipFormat) -> Result<Box<dyn OutputStream>, PlayerError>;
}

/// One open output stream, scoped to a single clip.
///
/// Dropping the stream releases it together with its device handle.
///
/// Blocking calls take a `cancel` check. When it returns `true` the call
/// gives up waiting and returns `Ok(())`; the caller decides what the
/// cancellation means.
pub trait OutputStream {
    /// Write one chunk of interleaved samples, blocking until the device
    /// has room for more.
    ///
    /// A device that stops consuming audio is reported as
    /// [`PlayerError::OutputWriteError`] rather than waited on forever.
    fn write(&mut self, samples: &[f32], cancel: &dyn Fn() -> bool) -> Result<(), PlayerError>;

    /// Suspend or resume audio already handed to the device.
    fn set_paused(&mut self, paused: bool);

    /// Block until every written chunk has been played.
    fn drain(&mut self, cancel: &dyn Fn() -> bool) -> Result<(), PlayerError>;

    /// Discard anything not yet played.
    fn stop(&mut self);
}

/// Chunks allowed to sit in the rodio queue before `write` blocks.
const MAX_BUFFERED_CHUNKS: usize = 2;

/// Back-pressure poll while the rodio queue is full.
const BUFFER_POLL: Duration = Duration::from_millis(5);

/// Grace period on top of the buffered audio's own duration before a
/// device that has stopped pulling samples is treated as dead.
const STALL_SLACK: Duration = Duration::from_secs(2);

/// How a bounded wait on the device ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Ready,
    Cancelled,
    TimedOut,
}

/// Poll `ready` every `poll` until it holds, `cancel` fires, or
/// `deadline` passes.
fn wait_until(
    deadline: Instant,
    poll: Duration,
    cancel: &dyn Fn() -> bool,
    mut ready: impl FnMut() -> bool,
) -> Wait {
    loop {
        if ready() {
            return Wait::Ready;
        }
        if cancel() {
            return Wait::Cancelled;
        }
        if Instant::now() >= deadline {
            return Wait::TimedOut;
        }
        thread::sleep(poll);
    }
}

/// Output on a local device through `rodio`.
#[derive(Debug, Clone, Default)]
pub struct LocalOutput {
    device_index: Option<usize>,
}

impl LocalOutput {
    /// Use the device at `device_index` (see [`list_output_devices`]), or the
    /// system default when `None`.
    #[must_use]
    pub const fn new(device_index: Option<usize>) -> Self {
        Self { device_index }
    }

    fn select_device(&self) -> Result<cpal::Device, PlayerError> {
        let host = cpal::default_host();
        match self.device_index {
            Some(index) => host
                .output_devices()
                .map_err(|e| PlayerError::DeviceEnumeration(e.to_string()))?
                .nth(index)
                .ok_or(PlayerError::NoOutputDevice(index)),
            None => host
                .default_output_device()
                .ok_or(PlayerError::NoDefaultOutputDevice),
        }
    }
}

impl OutputDevice for LocalOutput {
    fn open(&self, format: ClipFormat) -> Result<Box<dyn OutputStream>, PlayerError> {
        let device = self.select_device()?;
        let (stream, handle) = rodio::OutputStream::try_from_device(&device)
            .map_err(|e| PlayerError::OutputStreamError(e.to_string()))?;
        let sink = rodio::Sink::try_new(&handle)
            .map_err(|e| PlayerError::OutputStreamError(e.to_string()))?;

        tracing::debug!(
            device = %device.name().unwrap_or_default(),
            format = %format,
            "Output stream opened"
        );

        Ok(Box::new(LocalStream {
            sink,
            _stream: stream,
            channels: format.channels,
            sample_rate: format.sample_rate,
            chunk_duration: Duration::ZERO,
        }))
    }
}

/// An open rodio sink plus the stream that keeps the device alive.
///
/// Field order is drop order: the sink goes first, then the device stream.
struct LocalStream {
    sink: rodio::Sink,
    _stream: rodio::OutputStream,
    channels: u16,
    sample_rate: u32,
    /// Longest chunk written so far, in playback time.
    chunk_duration: Duration,
}

impl LocalStream {
    fn playback_time(&self, samples: usize) -> Duration {
        let frames = samples / usize::from(self.channels.max(1));
        #[allow(clippy::cast_precision_loss)]
        let secs = frames as f64 / f64::from(self.sample_rate.max(1));
        Duration::from_secs_f64(secs)
    }

    /// Latest moment the queued audio should have finished playing.
    fn deadline(&self) -> Instant {
        let queued = u32::try_from(self.sink.len()).unwrap_or(u32::MAX);
        Instant::now() + self.chunk_duration.saturating_mul(queued) + STALL_SLACK
    }

    fn stalled(&self) -> PlayerError {
        tracing::warn!(queued = self.sink.len(), "Output device stopped consuming audio");
        PlayerError::OutputWriteError("output device stopped consuming audio".into())
    }
}

impl OutputStream for LocalStream {
    fn write(&mut self, samples: &[f32], cancel: &dyn Fn() -> bool) -> Result<(), PlayerError> {
        self.chunk_duration = self.chunk_duration.max(self.playback_time(samples.len()));
        self.sink.append(SamplesBuffer::new(
            self.channels,
            self.sample_rate,
            samples.to_vec(),
        ));

        let sink = &self.sink;
        match wait_until(self.deadline(), BUFFER_POLL, cancel, || {
            sink.len() <= MAX_BUFFERED_CHUNKS
        }) {
            Wait::Ready | Wait::Cancelled => Ok(()),
            Wait::TimedOut => Err(self.stalled()),
        }
    }

    fn set_paused(&mut self, paused: bool) {
        if paused {
            self.sink.pause();
        } else {
            self.sink.play();
        }
    }

    fn drain(&mut self, cancel: &dyn Fn() -> bool) -> Result<(), PlayerError> {
        let sink = &self.sink;
        match wait_until(self.deadline(), BUFFER_POLL, cancel, || sink.empty()) {
            Wait::Ready | Wait::Cancelled => Ok(()),
            Wait::TimedOut => Err(self.stalled()),
        }
    }

    fn stop(&mut self) {
        self.sink.stop();
    }
}

/// An output device as seen by the operator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputDeviceInfo {
    /// Index accepted by `OUTPUT_DEVICE_INDEX`.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the system default output device.
    pub is_default: bool,
    /// Highest channel count among the device's output configs.
    pub max_channels: u16,
}

/// Enumerate output devices on the default host.
pub fn list_output_devices() -> Result<Vec<OutputDeviceInfo>, PlayerError> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| d.name().ok());

    let devices = host
        .output_devices()
        .map_err(|e| PlayerError::DeviceEnumeration(e.to_string()))?;

    Ok(devices
        .enumerate()
        .map(|(index, device)| {
            let name = device.name().unwrap_or_else(|_| "<unknown>".to_string());
            let max_channels = device
                .supported_output_configs()
                .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
                .unwrap_or(0);
            OutputDeviceInfo {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                max_channels,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const POLL: Duration = Duration::from_millis(1);

    #[test]
    fn wait_returns_once_ready() {
        let polls = Cell::new(0);
        let deadline = Instant::now() + Duration::from_secs(5);

        let outcome = wait_until(deadline, POLL, &|| false, || {
            polls.set(polls.get() + 1);
            polls.get() >= 3
        });

        assert_eq!(outcome, Wait::Ready);
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn stalled_device_times_out() {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(30);

        let outcome = wait_until(deadline, POLL, &|| false, || false);

        assert_eq!(outcome, Wait::TimedOut);
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn cancel_ends_the_wait_before_the_deadline() {
        let started = Instant::now();
        let deadline = started + Duration::from_secs(30);
        let cancel = || started.elapsed() >= Duration::from_millis(20);

        let outcome = wait_until(deadline, POLL, &cancel, || false);

        assert_eq!(outcome, Wait::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
