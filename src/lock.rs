//! Single-instance lock
//!
//! A marker file whose existence means "a sync run is in progress". Only runs
//! of this program that check the marker are excluded; it is advisory.
//!
//! # Limitations
//!
//! The marker is not tied to the process lifetime. A run killed without
//! unwinding leaves a stale marker that blocks every later run until it is
//! removed (`datasync unlock`).
//!
//! # Example
//!
//! ```no_run
//! use datasync::lock::InstanceLock;
//!
//! let mut lock = InstanceLock::new("/tmp/datasync.lock");
//! if lock.try_acquire()? {
//!     // ... sync ...
//! } // marker removed on drop
//! # Ok::<(), datasync::DataSyncError>(())
//! ```

use crate::{DataSyncError, Result};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Marker-file lock with release on drop
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    held: bool,
}

impl InstanceLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            held: false,
        }
    }

    /// Path of the marker file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether this instance holds the lock
    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Whether a marker exists (held by anyone)
    pub fn is_locked(&self) -> bool {
        self.path.exists()
    }

    /// Try to take the lock.
    ///
    /// Returns `Ok(false)` without touching the marker if it already exists.
    /// Check and create are a single `create_new` call, so two runs starting
    /// together cannot both succeed.
    pub fn try_acquire(&mut self) -> Result<bool> {
        if self.held {
            return Err(DataSyncError::Lock(format!(
                "{} is already held by this process",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!(path = %self.path.display(), "Lock marker already present");
                return Ok(false);
            }
            Err(e) => {
                return Err(DataSyncError::Lock(format!(
                    "cannot create {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        self.held = true;

        // Informational only
        let content = format!(
            "pid={}\nstarted={}\n",
            std::process::id(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        if let Err(e) = file.write_all(content.as_bytes()) {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not write lock marker content");
        }

        tracing::info!(path = %self.path.display(), "Acquired instance lock");
        Ok(true)
    }

    /// Remove the marker. No-op if this instance does not hold the lock.
    pub fn release(&mut self) -> Result<()> {
        if !self.held {
            return Ok(());
        }
        self.held = false;

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Released instance lock");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "Lock marker vanished before release");
                Ok(())
            }
            Err(e) => Err(DataSyncError::Lock(format!(
                "cannot remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    /// Content of the current marker, if any
    pub fn holder_info(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|s| s.trim().to_string())
    }

    /// Remove a marker left behind by a run that did not exit cleanly.
    ///
    /// Returns the removed marker's content, or `None` if there was no marker.
    pub fn clear_stale(&self) -> Result<Option<String>> {
        if !self.is_locked() {
            return Ok(None);
        }
        let info = self.holder_info().unwrap_or_default();
        fs::remove_file(&self.path).map_err(|e| {
            DataSyncError::Lock(format!("cannot remove {}: {}", self.path.display(), e))
        })?;
        tracing::warn!(path = %self.path.display(), holder = %info, "Removed stale lock marker");
        Ok(Some(info))
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::error!(error = %e, "Failed to release instance lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_and_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.lock");

        let mut lock = InstanceLock::new(&path);
        assert!(lock.try_acquire().unwrap());
        assert!(lock.is_held());
        assert!(path.exists());

        lock.release().unwrap();
        assert!(!lock.is_held());
        assert!(!path.exists());

        assert!(lock.try_acquire().unwrap());
    }

    #[test]
    fn test_contention_leaves_marker_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.lock");
        fs::write(&path, "someone else").unwrap();

        let mut lock = InstanceLock::new(&path);
        assert!(!lock.try_acquire().unwrap());
        assert!(!lock.is_held());

        drop(lock);
        assert_eq!(fs::read_to_string(&path).unwrap(), "someone else");
    }

    #[test]
    fn test_second_instance_blocked_until_release() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.lock");

        let mut first = InstanceLock::new(&path);
        let mut second = InstanceLock::new(&path);
        assert!(first.try_acquire().unwrap());
        assert!(!second.try_acquire().unwrap());

        first.release().unwrap();
        assert!(second.try_acquire().unwrap());
    }

    #[test]
    fn test_drop_releases() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("sync.lock");
        {
            let mut lock = InstanceLock::new(&path);
            assert!(lock.try_acquire().unwrap());
            assert!(lock.holder_info().unwrap().contains("pid="));
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_not_reentrant() {
        let dir = TempDir::new().unwrap();
        let mut lock = InstanceLock::new(dir.path().join("sync.lock"));
        assert!(lock.try_acquire().unwrap());
        assert!(lock.try_acquire().is_err());
    }

    #[test]
    fn test_clear_stale() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sync.lock");
        let lock = InstanceLock::new(&path);
        assert_eq!(lock.clear_stale().unwrap(), None);

        fs::write(&path, "pid=42").unwrap();
        assert_eq!(lock.clear_stale().unwrap(), Some("pid=42".to_string()));
        assert!(!path.exists());
    }
}
