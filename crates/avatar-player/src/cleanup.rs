//! Storage reclamation: deleting consumed clips and sweeping stale ones.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::clip::ClipPath;
use crate::config::DeletePolicy;
use crate::watcher::list_clips;

/// Removes a clip file. Injectable so lock failures can be simulated.
pub type ClipRemover = Arc<dyn Fn(&Path) -> io::Result<()> + Send + Sync>;

/// The remover used in production: `std::fs::remove_file`.
#[must_use]
pub fn fs_remover() -> ClipRemover {
    Arc::new(|path: &Path| std::fs::remove_file(path))
}

/// How a deletion attempt sequence ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The file is gone (removed by us, or already missing).
    Deleted { attempts: u32 },
    /// Every attempt failed; the file stays on disk.
    GaveUp { attempts: u32 },
}

/// Delete a consumed clip, retrying with growing delays.
///
/// The consuming process (an audio driver, an antivirus scanner) can hold
/// the file briefly after playback, so early failures are expected.
pub async fn delete_with_retry(
    clip: &ClipPath,
    policy: &DeletePolicy,
    remove: &ClipRemover,
) -> DeleteOutcome {
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        match remove(clip.as_path()) {
            Ok(()) => {
                tracing::debug!(clip = %clip, attempt, "Deleted played clip");
                return DeleteOutcome::Deleted { attempts: attempt };
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(clip = %clip, "Played clip already removed");
                return DeleteOutcome::Deleted { attempts: attempt };
            }
            Err(e) if attempt < attempts => {
                let delay = policy.delay_after(attempt);
                tracing::debug!(
                    clip = %clip,
                    attempt,
                    error = %e,
                    retry_in_ms = delay.as_millis(),
                    "Clip deletion failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::warn!(
                    clip = %clip,
                    attempts,
                    error = %e,
                    "Giving up on deleting clip; leaving it on disk"
                );
            }
        }
    }

    DeleteOutcome::GaveUp { attempts }
}

/// Remove clips in `dir` last modified more than `max_age` before `now`.
///
/// Returns the number of files removed. Individual failures are logged
/// and skipped.
pub fn sweep_stale_clips(
    dir: &Path,
    format: &str,
    max_age: Duration,
    now: SystemTime,
) -> io::Result<usize> {
    let Some(cutoff) = now.checked_sub(max_age) else {
        return Ok(0);
    };

    let mut removed = 0;
    for clip in list_clips(dir, format)? {
        let modified = match std::fs::metadata(clip.as_path()).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::debug!(clip = %clip, error = %e, "Skipping clip without mtime");
                continue;
            }
        };
        if modified >= cutoff {
            continue;
        }
        match std::fs::remove_file(clip.as_path()) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(clip = %clip, error = %e, "Failed to remove stale clip"),
        }
    }

    if removed > 0 {
        tracing::info!(removed, dir = %dir.display(), "Swept stale clips");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio_test::{assert_ok, block_on};

    use super::*;

    fn policy() -> DeletePolicy {
        DeletePolicy {
            attempts: 3,
            delays: vec![Duration::from_millis(1), Duration::from_millis(2)],
        }
    }

    /// Fails `failures` times with a sharing violation, then deletes.
    fn flaky_remover(failures: u32, calls: Arc<AtomicU32>) -> ClipRemover {
        Arc::new(move |path: &Path| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            if call < failures {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "file in use"))
            } else {
                std::fs::remove_file(path)
            }
        })
    }

    fn clip_in(dir: &Path, name: &str) -> ClipPath {
        std::fs::write(dir.join(name), b"RIFF").unwrap();
        ClipPath::resolve(dir, name)
    }

    #[tokio::test]
    async fn deletes_on_first_try() {
        let tmp = tempfile::tempdir().unwrap();
        let clip = clip_in(tmp.path(), "a.wav");

        let outcome = delete_with_retry(&clip, &policy(), &fs_remover()).await;

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 1 });
        assert!(!clip.exists());
    }

    #[tokio::test]
    async fn retries_through_transient_lock() {
        let tmp = tempfile::tempdir().unwrap();
        let clip = clip_in(tmp.path(), "a.wav");
        let calls = Arc::new(AtomicU32::new(0));

        let outcome = delete_with_retry(&clip, &policy(), &flaky_remover(2, calls.clone())).await;

        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(!clip.exists());
    }

    #[tokio::test]
    async fn gives_up_after_exactly_three_attempts() {
        let tmp = tempfile::tempdir().unwrap();
        let clip = clip_in(tmp.path(), "a.wav");
        let calls = Arc::new(AtomicU32::new(0));

        let outcome =
            delete_with_retry(&clip, &policy(), &flaky_remover(u32::MAX, calls.clone())).await;

        assert_eq!(outcome, DeleteOutcome::GaveUp { attempts: 3 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(clip.exists());
    }

    #[test]
    fn already_missing_counts_as_deleted() {
        let clip = ClipPath::resolve(Path::new("/no/such/dir"), "gone.wav");
        let outcome = block_on(delete_with_retry(&clip, &policy(), &fs_remover()));
        assert_eq!(outcome, DeleteOutcome::Deleted { attempts: 1 });
    }

    #[test]
    fn sweep_removes_only_old_clips() {
        let tmp = tempfile::tempdir().unwrap();
        let clip = clip_in(tmp.path(), "old.wav");
        std::fs::write(tmp.path().join("keep.txt"), b"x").unwrap();

        let later = SystemTime::now() + Duration::from_secs(10 * 24 * 3600);
        let removed = assert_ok!(sweep_stale_clips(
            tmp.path(),
            "wav",
            Duration::from_secs(7 * 24 * 3600),
            later
        ));

        assert_eq!(removed, 1);
        assert!(!clip.exists());
        assert!(tmp.path().join("keep.txt").exists());
    }

    #[test]
    fn sweep_keeps_fresh_clips() {
        let tmp = tempfile::tempdir().unwrap();
        let clip = clip_in(tmp.path(), "fresh.wav");

        let removed = assert_ok!(sweep_stale_clips(
            tmp.path(),
            "wav",
            Duration::from_secs(7 * 24 * 3600),
            SystemTime::now()
        ));

        assert_eq!(removed, 0);
        assert!(clip.exists());
    }
}
