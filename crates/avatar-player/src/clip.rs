//! Clip identity and WAV decoding.
//!
//! A [`ClipPath`] names one playable file. [`ClipReader`] opens it with
//! `hound` and hands out fixed-size chunks of interleaved `f32` samples,
//! so the sink can check its control flags between chunks.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::PlayerError;

/// Absolute path of one playable clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClipPath(PathBuf);

impl ClipPath {
    /// Wrap a path. Relative paths are resolved against `base`.
    pub fn resolve(base: &Path, name_or_path: impl AsRef<Path>) -> Self {
        let candidate = name_or_path.as_ref();
        if candidate.is_absolute() {
            Self(candidate.to_path_buf())
        } else {
            Self(base.join(candidate))
        }
    }

    /// The full path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// File name used for display and for the known-clips listing.
    #[must_use]
    pub fn name(&self) -> String {
        self.0
            .file_name()
            .map_or_else(|| self.0.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Whether the clip still exists on disk.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.0.is_file()
    }

    /// The same clip with its directory resolved through symlinks and
    /// `..` components.
    ///
    /// The file name is kept as given, so a clip reached through any
    /// alias of the clip directory compares equal to the one the watcher
    /// finds there.
    pub fn canonical(&self) -> std::io::Result<Self> {
        let (Some(dir), Some(name)) = (self.0.parent(), self.0.file_name()) else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "clip path has no file name",
            ));
        };
        Ok(Self(std::fs::canonicalize(dir)?.join(name)))
    }
}

impl fmt::Display for ClipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ClipPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Stream format of a clip, used to open a matching output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipFormat {
    /// Interleaved channel count.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bits per sample as stored in the file.
    pub bits_per_sample: u16,
    /// Whether samples are stored as IEEE floats.
    pub float: bool,
}

impl From<hound::WavSpec> for ClipFormat {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            float: spec.sample_format == hound::SampleFormat::Float,
        }
    }
}

impl fmt::Display for ClipFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ch, {} Hz, {}-bit{}",
            self.channels,
            self.sample_rate,
            self.bits_per_sample,
            if self.float { " float" } else { "" }
        )
    }
}

/// Chunked reader over an open WAV clip.
///
/// Holds the clip's file descriptor until dropped.
pub struct ClipReader {
    reader: hound::WavReader<BufReader<File>>,
    format: ClipFormat,
    path: PathBuf,
}

impl ClipReader {
    /// Open a clip and read its header.
    pub fn open(path: &Path) -> Result<Self, PlayerError> {
        let reader = hound::WavReader::open(path).map_err(|e| decode_error(path, &e))?;
        let format = ClipFormat::from(reader.spec());
        Ok(Self {
            reader,
            format,
            path: path.to_path_buf(),
        })
    }

    /// Format read from the clip header.
    #[must_use]
    pub const fn format(&self) -> ClipFormat {
        self.format
    }

    /// Read up to `frames` frames as interleaved `f32` samples in `[-1, 1]`.
    ///
    /// Returns `Ok(None)` once the clip is exhausted.
    pub fn next_chunk(&mut self, frames: usize) -> Result<Option<Vec<f32>>, PlayerError> {
        let wanted = frames * usize::from(self.format.channels.max(1));
        let mut chunk = Vec::with_capacity(wanted);

        if self.format.float {
            for sample in self.reader.samples::<f32>().take(wanted) {
                chunk.push(sample.map_err(|e| decode_error(&self.path, &e))?);
            }
        } else {
            let scale = int_scale(self.format.bits_per_sample);
            for sample in self.reader.samples::<i32>().take(wanted) {
                let value = sample.map_err(|e| decode_error(&self.path, &e))?;
                #[allow(clippy::cast_precision_loss)]
                chunk.push(value as f32 / scale);
            }
        }

        Ok(if chunk.is_empty() { None } else { Some(chunk) })
    }
}

/// Full-scale magnitude for a signed integer sample of `bits` width.
fn int_scale(bits: u16) -> f32 {
    let bits = i32::from(bits.clamp(1, 32));
    2f32.powi(bits - 1)
}

fn decode_error(path: &Path, err: &hound::Error) -> PlayerError {
    match err {
        hound::Error::IoError(io) if io.kind() == std::io::ErrorKind::NotFound => {
            PlayerError::ClipNotFound(path.to_path_buf())
        }
        other => PlayerError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}
