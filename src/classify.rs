//! Tag artifact classification
//!
//! A capture may contain a `.txt` tag file with manual annotations made
//! during the drive. An actuation annotation marks the capture as critical.

use crate::capture::Disposition;
use crate::{DataSyncError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Annotation that promotes a capture to critical (exact, case-sensitive)
pub const CRITICAL_MARKER: &str = "[TAG],manual_annotation.Actuation_1,2,true";

/// Extension of tag artifacts
pub const TAG_EXTENSION: &str = ".txt";

/// Outcome of classifying a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Critical,
    NotCritical,
    /// No tag artifact in the capture
    Unknown,
}

impl Classification {
    /// Disposition of a completed capture with this classification
    pub fn disposition(self) -> Disposition {
        match self {
            Classification::Critical => Disposition::CompletedCritical,
            Classification::NotCritical | Classification::Unknown => Disposition::CompletedNormal,
        }
    }

    pub fn is_critical(self) -> bool {
        self == Classification::Critical
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Critical => write!(f, "critical"),
            Classification::NotCritical => write!(f, "not_critical"),
            Classification::Unknown => write!(f, "unknown"),
        }
    }
}

/// Reads a capture's tag artifact and decides criticality
#[derive(Debug, Clone)]
pub struct TagClassifier {
    marker: String,
}

impl Default for TagClassifier {
    fn default() -> Self {
        Self {
            marker: CRITICAL_MARKER.to_string(),
        }
    }
}

impl TagClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different marker string
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Find the tag artifact directly inside `capture_dir`.
    ///
    /// Candidates are sorted by name so the choice does not depend on
    /// directory listing order. More than one candidate is logged.
    pub fn locate_tag(&self, capture_dir: &Path) -> Result<Option<PathBuf>> {
        let mut candidates: Vec<PathBuf> = Vec::new();

        for entry in fs::read_dir(capture_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(TAG_EXTENSION) && !entry.file_type()?.is_dir() {
                candidates.push(entry.path());
            }
        }

        candidates.sort();

        if candidates.len() > 1 {
            tracing::warn!(
                capture = %capture_dir.display(),
                count = candidates.len(),
                using = %candidates[0].display(),
                "Capture has more than one tag file"
            );
        }

        Ok(candidates.into_iter().next())
    }

    /// Classify a capture, propagating I/O failures
    pub fn try_classify(&self, capture_dir: &Path) -> Result<Classification> {
        let Some(tag_path) = self.locate_tag(capture_dir)? else {
            return Ok(Classification::Unknown);
        };

        let content = fs::read_to_string(&tag_path).map_err(|source| {
            DataSyncError::TagUnreadable {
                path: tag_path.clone(),
                source,
            }
        })?;

        if content.contains(&self.marker) {
            Ok(Classification::Critical)
        } else {
            Ok(Classification::NotCritical)
        }
    }

    /// Classify a capture. Read failures are logged and fall back to
    /// `NotCritical`.
    pub fn classify(&self, capture_dir: &Path) -> Classification {
        match self.try_classify(capture_dir) {
            Ok(Classification::Unknown) => {
                tracing::warn!(capture = %capture_dir.display(), "No tag file found, treating as not critical");
                Classification::Unknown
            }
            Ok(classification) => classification,
            Err(e) => {
                tracing::warn!(
                    capture = %capture_dir.display(),
                    error = %e,
                    "Could not read tag file, treating as not critical"
                );
                Classification::NotCritical
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn capture_with_tag(content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("tags.txt"), content).unwrap();
        dir
    }

    #[test]
    fn test_critical_marker_detected() {
        let dir = capture_with_tag(
            "[TAG],manual_annotation.Lane_change,1,true\n[TAG],manual_annotation.Actuation_1,2,true\n",
        );
        assert_eq!(TagClassifier::new().classify(dir.path()), Classification::Critical);
    }

    #[test]
    fn test_marker_is_case_sensitive_and_exact() {
        for content in [
            "[tag],manual_annotation.actuation_1,2,true",
            "[TAG],manual_annotation.Actuation_1,2,false",
            "[TAG],manual_annotation.Actuation_1,1,true",
            "[TAG],manual_annotation.Actuation_1,2,tru",
        ] {
            let dir = capture_with_tag(content);
            assert_eq!(
                TagClassifier::new().classify(dir.path()),
                Classification::NotCritical,
                "content: {}",
                content
            );
        }
    }

    #[test]
    fn test_no_tag_file_is_unknown() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.bin"), [0u8; 4]).unwrap();
        assert_eq!(TagClassifier::new().classify(dir.path()), Classification::Unknown);
    }

    #[test]
    fn test_directory_named_txt_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("folder.txt")).unwrap();
        assert_eq!(TagClassifier::new().classify(dir.path()), Classification::Unknown);
    }

    #[test]
    fn test_multiple_tags_first_by_name_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.txt"), "nothing").unwrap();
        fs::write(dir.path().join("a.txt"), CRITICAL_MARKER).unwrap();

        let classifier = TagClassifier::new();
        assert_eq!(
            classifier.locate_tag(dir.path()).unwrap(),
            Some(dir.path().join("a.txt"))
        );
        assert_eq!(classifier.classify(dir.path()), Classification::Critical);
    }

    #[test]
    fn test_unreadable_tag_is_not_critical() {
        let dir = TempDir::new().unwrap();
        // Invalid UTF-8 fails read_to_string
        fs::write(dir.path().join("tags.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let classifier = TagClassifier::new();
        assert!(matches!(
            classifier.try_classify(dir.path()),
            Err(DataSyncError::TagUnreadable { .. })
        ));
        assert_eq!(classifier.classify(dir.path()), Classification::NotCritical);
    }

    #[test]
    fn test_custom_marker() {
        let dir = capture_with_tag("BRAKE_EVENT");
        let classifier = TagClassifier::with_marker("BRAKE_EVENT");
        assert_eq!(classifier.classify(dir.path()), Classification::Critical);
    }

    #[test]
    fn test_disposition_mapping() {
        assert_eq!(Classification::Critical.disposition(), Disposition::CompletedCritical);
        assert_eq!(Classification::NotCritical.disposition(), Disposition::CompletedNormal);
        assert_eq!(Classification::Unknown.disposition(), Disposition::CompletedNormal);
        assert!(Classification::Critical.is_critical());
    }
}
