//! Relocation of critical captures
//!
//! Critical captures are moved (not copied) from the source folder into the
//! critical folder. Each capture moves at most once; afterwards it is only
//! addressed through the critical folder.

use crate::{DataSyncError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the critical folder under the source folder
pub const CRITICAL_FOLDER_NAME: &str = "criticalData";

/// What happened when relocating a capture
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RelocationOutcome {
    /// The capture was moved
    Moved { destination: PathBuf },

    /// The capture is no longer in the source folder but already in the
    /// critical folder
    AlreadyRelocated { destination: PathBuf },

    /// The capture exists in neither place
    Missing,

    /// Dry run; the capture would be moved to `destination`
    Planned { destination: PathBuf },
}

/// Moves critical captures into the critical folder
#[derive(Debug, Clone)]
pub struct CriticalRelocator {
    source_folder: PathBuf,
    critical_folder: PathBuf,
}

impl CriticalRelocator {
    pub fn new(source_folder: impl Into<PathBuf>, critical_folder: impl Into<PathBuf>) -> Self {
        Self {
            source_folder: source_folder.into(),
            critical_folder: critical_folder.into(),
        }
    }

    /// Relocator using `<source>/criticalData`
    pub fn for_source(source_folder: impl Into<PathBuf>) -> Self {
        let source_folder = source_folder.into();
        let critical_folder = source_folder.join(CRITICAL_FOLDER_NAME);
        Self::new(source_folder, critical_folder)
    }

    pub fn source_folder(&self) -> &Path {
        &self.source_folder
    }

    pub fn critical_folder(&self) -> &Path {
        &self.critical_folder
    }

    /// Create the critical folder if it does not exist yet
    pub fn ensure_critical_folder(&self) -> Result<()> {
        if !self.critical_folder.is_dir() {
            fs::create_dir_all(&self.critical_folder)?;
            tracing::info!(folder = %self.critical_folder.display(), "Created critical folder");
        }
        Ok(())
    }

    /// Move `<source>/<capture>` to `<critical>/<capture>`.
    ///
    /// An existing destination is never overwritten: if both paths exist the
    /// capture is left in place and a collision error is returned.
    pub fn relocate(&self, capture: &str) -> Result<RelocationOutcome> {
        let source = self.source_folder.join(capture);
        let destination = self.critical_folder.join(capture);

        let source_exists = source.exists();
        let destination_exists = destination.exists();

        match (source_exists, destination_exists) {
            (false, true) => {
                tracing::info!(capture, destination = %destination.display(), "Capture already relocated");
                return Ok(RelocationOutcome::AlreadyRelocated { destination });
            }
            (false, false) => {
                tracing::warn!(capture, source = %source.display(), "Capture to relocate no longer exists");
                return Ok(RelocationOutcome::Missing);
            }
            (true, true) => {
                return Err(DataSyncError::RelocationCollision {
                    capture: capture.to_string(),
                    destination,
                });
            }
            (true, false) => {}
        }

        self.ensure_critical_folder()?;

        // Same filesystem, so rename is atomic
        fs::rename(&source, &destination).map_err(|e| DataSyncError::Relocation {
            capture: capture.to_string(),
            source: e,
        })?;

        tracing::info!(
            capture,
            from = %source.display(),
            to = %destination.display(),
            "Moved capture to critical folder"
        );

        Ok(RelocationOutcome::Moved { destination })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NAME: &str = "cam@20240101_000000000000";

    fn setup() -> (TempDir, CriticalRelocator) {
        let dir = TempDir::new().unwrap();
        let capture = dir.path().join(NAME);
        fs::create_dir(&capture).unwrap();
        fs::write(capture.join("frame.bin"), "data").unwrap();
        let relocator = CriticalRelocator::for_source(dir.path());
        (dir, relocator)
    }

    #[test]
    fn test_relocate_moves_whole_tree() {
        let (dir, relocator) = setup();
        let nested = dir.path().join(NAME).join("sub");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("more.bin"), "x").unwrap();

        let outcome = relocator.relocate(NAME).unwrap();
        let destination = dir.path().join(CRITICAL_FOLDER_NAME).join(NAME);
        assert_eq!(outcome, RelocationOutcome::Moved { destination: destination.clone() });

        assert!(!dir.path().join(NAME).exists());
        assert!(destination.join("frame.bin").exists());
        assert!(destination.join("sub").join("more.bin").exists());
    }

    #[test]
    fn test_relocate_twice_is_noop() {
        let (dir, relocator) = setup();
        relocator.relocate(NAME).unwrap();

        let outcome = relocator.relocate(NAME).unwrap();
        assert!(matches!(outcome, RelocationOutcome::AlreadyRelocated { .. }));
        assert!(dir
            .path()
            .join(CRITICAL_FOLDER_NAME)
            .join(NAME)
            .join("frame.bin")
            .exists());
    }

    #[test]
    fn test_relocate_missing_capture() {
        let (_dir, relocator) = setup();
        assert_eq!(
            relocator.relocate("ghost@20240101_000000").unwrap(),
            RelocationOutcome::Missing
        );
    }

    #[test]
    fn test_relocate_collision_keeps_both() {
        let (dir, relocator) = setup();
        let existing = dir.path().join(CRITICAL_FOLDER_NAME).join(NAME);
        fs::create_dir_all(&existing).unwrap();
        fs::write(existing.join("frame.bin"), "older").unwrap();

        let err = relocator.relocate(NAME).unwrap_err();
        assert!(matches!(err, DataSyncError::RelocationCollision { .. }));

        assert_eq!(fs::read_to_string(existing.join("frame.bin")).unwrap(), "older");
        assert!(dir.path().join(NAME).join("frame.bin").exists());
    }

    #[test]
    fn test_ensure_critical_folder_is_idempotent() {
        let (dir, relocator) = setup();
        relocator.ensure_critical_folder().unwrap();
        relocator.ensure_critical_folder().unwrap();
        assert!(dir.path().join(CRITICAL_FOLDER_NAME).is_dir());
    }
}
