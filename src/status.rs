//! Read-only overview of the source folder
//!
//! Shows what the next run would do without taking the lock or touching
//! any capture.

use crate::capture::Disposition;
use crate::classify::{Classification, TagClassifier};
use crate::detect::{CompletionDetector, MalformedCapture};
use crate::relocate::CRITICAL_FOLDER_NAME;
use crate::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// One capture in the source folder
#[derive(Debug, Clone, Serialize)]
pub struct CaptureStatus {
    pub name: String,
    pub created_at: NaiveDateTime,
    pub disposition: Disposition,

    /// Only classified once complete
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
}

/// Overview of a source folder
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub source_folder: PathBuf,
    pub captures: Vec<CaptureStatus>,
    pub malformed: Vec<MalformedCapture>,

    /// Captures already in the critical folder
    pub critical_count: usize,
}

impl StatusReport {
    pub fn count(&self, disposition: Disposition) -> usize {
        self.captures
            .iter()
            .filter(|c| c.disposition == disposition)
            .count()
    }
}

/// Collect the status of every capture under `source_folder` at `now`
pub fn collect_status(
    source_folder: &Path,
    detector: &CompletionDetector,
    classifier: &TagClassifier,
    now: NaiveDateTime,
) -> Result<StatusReport> {
    let scan = detector.scan_at(source_folder, now)?;

    let mut captures: Vec<CaptureStatus> = scan
        .completed
        .iter()
        .map(|capture| {
            let classification = classifier.classify(&source_folder.join(&capture.name));
            CaptureStatus {
                name: capture.name.clone(),
                created_at: capture.created_at,
                disposition: classification.disposition(),
                classification: Some(classification),
            }
        })
        .collect();

    captures.extend(scan.pending.iter().map(|capture| CaptureStatus {
        name: capture.name.clone(),
        created_at: capture.created_at,
        disposition: Disposition::Incomplete,
        classification: None,
    }));

    captures.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));

    let critical_count = match fs::read_dir(source_folder.join(CRITICAL_FOLDER_NAME)) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .count(),
        Err(_) => 0,
    };

    Ok(StatusReport {
        source_folder: source_folder.to_path_buf(),
        captures,
        malformed: scan.malformed,
        critical_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::CRITICAL_MARKER;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    #[test]
    fn test_collect_status_is_read_only() {
        let src = TempDir::new().unwrap();
        let critical = src.path().join("A@20240101_000000");
        fs::create_dir(&critical).unwrap();
        fs::write(critical.join("tag.txt"), CRITICAL_MARKER).unwrap();
        fs::create_dir(src.path().join("B@20240101_000000")).unwrap();
        fs::create_dir(src.path().join("C@20240101_000900")).unwrap();
        fs::create_dir_all(src.path().join("criticalData/old@20231231_000000")).unwrap();

        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 10, 0)
            .unwrap();
        let report = collect_status(
            src.path(),
            &CompletionDetector::default(),
            &TagClassifier::default(),
            now,
        )
        .unwrap();

        assert_eq!(report.captures.len(), 3);
        assert_eq!(report.captures[0].name, "A@20240101_000000");
        assert_eq!(report.count(Disposition::CompletedCritical), 1);
        assert_eq!(report.count(Disposition::CompletedNormal), 1);
        assert_eq!(report.count(Disposition::Incomplete), 1);
        assert_eq!(report.critical_count, 1);

        // Nothing moved
        assert!(critical.is_dir());
    }
}
