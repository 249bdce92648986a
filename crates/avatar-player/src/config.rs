//! Engine configuration.
//!
//! Values are read once at startup. The CLI fills them from flags and
//! environment variables; library users build them directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// The only clip format the sink decodes.
pub const SUPPORTED_FORMAT: &str = "wav";

/// Default directory the synthesis producer writes clips into.
pub const DEFAULT_CLIP_DIR: &str = "audio";

/// Default age after which leftover clips are swept at startup.
pub const DEFAULT_STALE_DAYS: u64 = 7;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Bounded retry policy for removing a consumed clip.
///
/// `delays[i]` is the wait after the `i + 1`-th failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePolicy {
    /// Total number of removal attempts (first try included).
    pub attempts: u32,
    /// Backoff between attempts, growing with each failure.
    pub delays: Vec<Duration>,
}

impl DeletePolicy {
    /// Delay to wait after the given (1-based) failed attempt.
    ///
    /// Attempts past the end of `delays` reuse the last entry.
    #[must_use]
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        let idx = failed_attempt.saturating_sub(1) as usize;
        self.delays
            .get(idx)
            .or_else(|| self.delays.last())
            .copied()
            .unwrap_or_default()
    }
}

impl Default for DeletePolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delays: vec![Duration::from_millis(250), Duration::from_secs(1)],
        }
    }
}

/// Configuration for [`AudioPlayer`](crate::AudioPlayer).
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Directory watched for new clips.
    pub clip_dir: PathBuf,

    /// Clip file extension (case-insensitive). Only `wav` is supported.
    pub format: String,

    /// Output device index; `None` selects the system default device.
    pub output_device_index: Option<usize>,

    /// Whether the engine starts active.
    pub enabled: bool,

    /// How often the clip directory is listed.
    pub scan_interval: Duration,

    /// Sleep at the top of every loop iteration.
    pub tick_interval: Duration,

    /// Poll interval while the engine is disabled.
    pub disabled_poll_interval: Duration,

    /// Frames written to the device per chunk.
    pub chunk_frames: usize,

    /// Re-check interval while playback is paused.
    pub pause_poll_interval: Duration,

    /// Retry policy for removing consumed clips.
    pub delete_policy: DeletePolicy,

    /// Clips older than this are removed at startup. `None` keeps them.
    pub stale_after: Option<Duration>,
}

impl PlayerConfig {
    /// Configuration with defaults for the given clip directory.
    pub fn new(clip_dir: impl Into<PathBuf>) -> Self {
        Self {
            clip_dir: clip_dir.into(),
            ..Self::default()
        }
    }

    /// Set the stale-clip age in whole days. Zero disables the sweep.
    #[must_use]
    pub fn with_stale_days(mut self, days: u64) -> Self {
        self.stale_after = if days == 0 {
            None
        } else {
            Some(Duration::from_secs(days.saturating_mul(SECS_PER_DAY)))
        };
        self
    }

    /// Check the settings that do not need filesystem access.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.format.eq_ignore_ascii_case(SUPPORTED_FORMAT) {
            return Err(ConfigError::UnsupportedFormat(self.format.clone()));
        }
        if self.chunk_frames == 0 {
            return Err(ConfigError::InvalidValue {
                name: "chunk_frames",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.delete_policy.attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "delete_policy.attempts",
                reason: "at least one attempt is required".to_string(),
            });
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "tick_interval",
                reason: "must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Whether `path` has the configured clip extension.
    #[must_use]
    pub fn is_clip_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.format))
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            clip_dir: PathBuf::from(DEFAULT_CLIP_DIR),
            format: SUPPORTED_FORMAT.to_string(),
            output_device_index: None,
            enabled: true,
            scan_interval: Duration::from_secs(1),
            tick_interval: Duration::from_millis(100),
            disabled_poll_interval: Duration::from_secs(1),
            chunk_frames: 1024,
            pause_poll_interval: Duration::from_millis(100),
            delete_policy: DeletePolicy::default(),
            stale_after: Some(Duration::from_secs(DEFAULT_STALE_DAYS * SECS_PER_DAY)),
        }
    }
}

/// Make sure the clip directory exists, creating it if needed.
///
/// Returns the absolute form of the directory so every `ClipPath`
/// derived from it is absolute as well.
pub fn ensure_clip_dir(dir: &Path) -> Result<PathBuf, ConfigError> {
    if dir.exists() && !dir.is_dir() {
        return Err(ConfigError::NotADirectory(dir.to_path_buf()));
    }
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::DirectoryInaccessible {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;
    std::fs::canonicalize(dir).map_err(|e| ConfigError::DirectoryInaccessible {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.delete_policy.attempts, 3);
        assert_eq!(config.chunk_frames, 1024);
        assert_eq!(config.output_device_index, None);
    }

    #[test]
    fn rejects_unsupported_format() {
        let config = PlayerConfig {
            format: "mp3".to_string(),
            ..PlayerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref f) if f == "mp3"));
    }

    #[test]
    fn format_match_is_case_insensitive() {
        let config = PlayerConfig {
            format: "WAV".to_string(),
            ..PlayerConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_clip_file(Path::new("/tmp/a.wav")));
        assert!(config.is_clip_file(Path::new("/tmp/b.Wav")));
        assert!(!config.is_clip_file(Path::new("/tmp/c.txt")));
        assert!(!config.is_clip_file(Path::new("/tmp/noext")));
    }

    #[test]
    fn delete_delays_grow_and_saturate() {
        let policy = DeletePolicy::default();
        assert!(policy.delay_after(1) < policy.delay_after(2));
        assert_eq!(policy.delay_after(5), policy.delay_after(2));
    }

    #[test]
    fn zero_stale_days_disables_sweep() {
        let config = PlayerConfig::default().with_stale_days(0);
        assert_eq!(config.stale_after, None);

        let config = PlayerConfig::default().with_stale_days(2);
        assert_eq!(config.stale_after, Some(Duration::from_secs(2 * SECS_PER_DAY)));
    }

    #[test]
    fn ensure_clip_dir_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("audio");
        let resolved = ensure_clip_dir(&dir).unwrap();
        assert!(resolved.is_dir());
        assert!(resolved.is_absolute());
    }

    #[test]
    fn ensure_clip_dir_rejects_file() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("audio");
        std::fs::write(&file, b"not a dir").unwrap();
        let err = ensure_clip_dir(&file).unwrap_err();
        assert!(matches!(err, ConfigError::NotADirectory(_)));
    }
}
