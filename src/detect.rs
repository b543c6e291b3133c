//! Completion detection
//!
//! The logger gives no signal when a capture is finished, so a capture is
//! considered complete once it is older than a fixed threshold.

use crate::capture::{is_capture_name, Capture};
use crate::{DataSyncError, Result};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Age after which a capture is assumed to have finished writing
pub const COMPLETION_THRESHOLD_MINUTES: i64 = 7;

/// A capture folder whose name could not be parsed
#[derive(Debug, Clone, Serialize)]
pub struct MalformedCapture {
    pub name: String,
    pub reason: String,
}

/// Result of scanning a source folder
#[derive(Debug, Default, Clone, Serialize)]
pub struct Scan {
    /// Captures older than the threshold
    pub completed: Vec<Capture>,

    /// Captures still inside the threshold
    pub pending: Vec<Capture>,

    /// Entries with an `@` that could not be used as captures: unparseable
    /// timestamps, non UTF-8 names, entries that could not be read
    pub malformed: Vec<MalformedCapture>,
}

impl Scan {
    /// Names of completed captures
    pub fn completed_names(&self) -> Vec<String> {
        self.completed.iter().map(|c| c.name.clone()).collect()
    }
}

/// Decides which captures have finished recording
#[derive(Debug, Clone)]
pub struct CompletionDetector {
    threshold: Duration,
}

impl Default for CompletionDetector {
    fn default() -> Self {
        Self::new(Duration::minutes(COMPLETION_THRESHOLD_MINUTES))
    }
}

impl CompletionDetector {
    /// Create a detector with a custom threshold
    pub fn new(threshold: Duration) -> Self {
        Self { threshold }
    }

    /// Whether a capture is complete at `now`.
    ///
    /// Strictly greater than the threshold: a capture exactly at the
    /// threshold is not complete yet.
    pub fn is_completed_at(&self, capture: &Capture, now: NaiveDateTime) -> bool {
        capture.age_at(now) > self.threshold
    }

    /// Parse a capture name and check completion against the local clock
    pub fn is_completed(&self, name: &str) -> Result<bool> {
        let capture = Capture::parse(name)?;
        Ok(self.is_completed_at(&capture, Local::now().naive_local()))
    }

    /// Names of completed captures directly under `folder`, in directory
    /// listing order
    pub fn list_completed(&self, folder: &Path) -> Result<Vec<String>> {
        Ok(self.scan(folder)?.completed_names())
    }

    /// Scan `folder` using the local clock
    pub fn scan(&self, folder: &Path) -> Result<Scan> {
        self.scan_at(folder, Local::now().naive_local())
    }

    /// Scan `folder` for capture folders and sort them by completion at `now`.
    ///
    /// Entries without `@` in their name and non-directories are ignored.
    /// Symlinks are followed. Malformed names, names that are not valid
    /// UTF-8 and entries that cannot be inspected are logged and reported
    /// as malformed, never fatal.
    pub fn scan_at(&self, folder: &Path, now: NaiveDateTime) -> Result<Scan> {
        let entries = fs::read_dir(folder).map_err(|e| {
            DataSyncError::Setup(format!("cannot list {}: {}", folder.display(), e))
        })?;

        let mut scan = Scan::default();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(folder = %folder.display(), error = %e, "Skipping unreadable entry");
                    scan.malformed.push(MalformedCapture {
                        name: folder.display().to_string(),
                        reason: format!("unreadable entry: {}", e),
                    });
                    continue;
                }
            };

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    let lossy = raw.to_string_lossy().to_string();
                    if is_capture_name(&lossy) {
                        tracing::warn!(capture = %lossy, "Skipping capture with a non UTF-8 name");
                        scan.malformed.push(MalformedCapture {
                            name: lossy,
                            reason: "name is not valid UTF-8".to_string(),
                        });
                    }
                    continue;
                }
            };

            if !is_capture_name(&name) {
                continue;
            }

            match fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_dir() => {}
                Ok(_) => {
                    tracing::debug!(entry = %name, "Skipping non-directory entry");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(capture = %name, error = %e, "Skipping entry that cannot be inspected");
                    scan.malformed.push(MalformedCapture {
                        name,
                        reason: format!("cannot inspect: {}", e),
                    });
                    continue;
                }
            }

            match Capture::parse(name.clone()) {
                Ok(capture) => {
                    if self.is_completed_at(&capture, now) {
                        scan.completed.push(capture);
                    } else {
                        tracing::debug!(capture = %capture, "Capture still recording");
                        scan.pending.push(capture);
                    }
                }
                Err(e) => {
                    tracing::warn!(capture = %name, error = %e, "Skipping capture with malformed name");
                    scan.malformed.push(MalformedCapture {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            folder = %folder.display(),
            completed = scan.completed.len(),
            pending = scan.pending.len(),
            malformed = scan.malformed.len(),
            "Scanned source folder"
        );

        Ok(scan)
    }
}
