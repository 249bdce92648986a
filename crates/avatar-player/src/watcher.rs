//! Directory watcher: finds clips the registry does not know about yet.
//!
//! Scanning is throttled by its own interval so listing cost does not grow
//! with the loop's tick rate. The watcher never mutates the registry; the
//! loop registers whatever it returns.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::clip::ClipPath;
use crate::registry::ClipRegistry;

/// Lists the clip directory on a fixed interval.
#[derive(Debug)]
pub struct DirectoryWatcher {
    dir: PathBuf,
    format: String,
    interval: Duration,
    last_scan: Option<Instant>,
}

impl DirectoryWatcher {
    pub fn new(dir: impl Into<PathBuf>, format: impl Into<String>, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            format: format.into(),
            interval,
            last_scan: None,
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether enough time has passed since the last scan.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.last_scan
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Scan if the interval elapsed; otherwise return `None`.
    pub fn poll(&mut self, registry: &ClipRegistry) -> Option<std::io::Result<Scan>> {
        let now = Instant::now();
        if !self.is_due(now) {
            return None;
        }
        self.last_scan = Some(now);
        Some(self.scan(registry))
    }

    /// List the directory and split clips into known and new.
    pub fn scan(&self, registry: &ClipRegistry) -> std::io::Result<Scan> {
        let on_disk = list_clips(&self.dir, &self.format)?;
        let new = on_disk
            .iter()
            .filter(|clip| !registry.is_known(clip))
            .cloned()
            .collect();
        Ok(Scan { on_disk, new })
    }
}

/// Result of one directory scan.
#[derive(Debug, Default)]
pub struct Scan {
    /// Every clip currently in the directory, in production order.
    pub on_disk: Vec<ClipPath>,
    /// Clips not yet queued, playing, or retired.
    pub new: Vec<ClipPath>,
}

/// List playable clips in `dir`, oldest first (ties broken by name).
///
/// Production order follows modification time, so clips written in quick
/// succession by the synthesis producer play in the order they were made.
pub fn list_clips(dir: &Path, format: &str) -> std::io::Result<Vec<ClipPath>> {
    let mut clips: Vec<(SystemTime, ClipPath)> = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let matches_format = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(format));
        if !matches_format {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        clips.push((modified, ClipPath::resolve(dir, entry.file_name())));
    }

    clips.sort();
    Ok(clips.into_iter().map(|(_, clip)| clip).collect())
}
