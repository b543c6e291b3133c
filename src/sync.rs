//! Sync orchestration
//!
//! One run: find completed captures, move the critical ones into the
//! critical folder, then mirror every remaining completed capture plus the
//! critical folder to the external destination.
//!
//! Failures for one capture or one transfer are recorded in the
//! [`SyncReport`] and logged; they never stop the rest of the run. Only
//! failing to scan the source folder aborts.

use crate::capture::Disposition;
use crate::classify::{Classification, TagClassifier};
use crate::detect::{CompletionDetector, MalformedCapture};
use crate::relocate::{CriticalRelocator, RelocationOutcome, CRITICAL_FOLDER_NAME};
use crate::transfer::Transfer;
use crate::Result;
use chrono::{Local, NaiveDateTime};
use rsync::TransferSummary;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Per-capture result of a run
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub name: String,
    pub classification: Classification,
    pub disposition: Disposition,

    /// Set when relocation was attempted and did not fail
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relocation: Option<RelocationOutcome>,

    /// Relocation failure, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureReport {
    /// Whether the capture still lives at the source root after the run
    pub fn remains_at_source(&self) -> bool {
        self.relocation.is_none()
    }
}

/// Result of one work-list transfer
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TransferStatus {
    Completed { summary: TransferSummary },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: TransferStatus,
}

/// Everything that happened during a run
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    /// Completed captures, in processing order
    pub captures: Vec<CaptureReport>,

    /// Captures skipped because their names could not be parsed
    pub malformed: Vec<MalformedCapture>,

    /// Captures left alone because they are still recording
    pub pending: Vec<String>,

    /// Folders handed to the transfer, in order
    pub work_list: Vec<PathBuf>,

    pub transfers: Vec<TransferReport>,
}

impl SyncReport {
    /// Names of captures moved into the critical folder by this run
    pub fn relocated(&self) -> Vec<&str> {
        self.captures
            .iter()
            .filter(|c| matches!(c.relocation, Some(RelocationOutcome::Moved { .. })))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Number of transfers that completed; skipped entries are not counted
    pub fn transferred(&self) -> usize {
        self.transfers
            .iter()
            .filter(|t| matches!(t.status, TransferStatus::Completed { .. }))
            .count()
    }

    /// All per-item error messages
    pub fn errors(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .captures
            .iter()
            .filter_map(|c| c.error.as_ref().map(|e| format!("{}: {}", c.name, e)))
            .collect();

        errors.extend(self.transfers.iter().filter_map(|t| match &t.status {
            TransferStatus::Failed { error } => Some(format!("{}: {}", t.source.display(), error)),
            _ => None,
        }));

        errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors().is_empty()
    }
}

/// Runs detection, classification, relocation and transfer for one
/// source folder
pub struct SyncOrchestrator<T: Transfer> {
    detector: CompletionDetector,
    classifier: TagClassifier,
    relocator: CriticalRelocator,
    transfer: T,
    destination: PathBuf,
    dry_run: bool,
}

impl<T: Transfer> SyncOrchestrator<T> {
    /// Orchestrator for `source_folder`, using `<source>/criticalData` as the
    /// critical folder
    pub fn new(source_folder: impl Into<PathBuf>, destination: impl Into<PathBuf>, transfer: T) -> Self {
        Self {
            detector: CompletionDetector::default(),
            classifier: TagClassifier::default(),
            relocator: CriticalRelocator::for_source(source_folder),
            transfer,
            destination: destination.into(),
            dry_run: false,
        }
    }

    pub fn with_detector(mut self, detector: CompletionDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Classify and plan without moving anything. The transfer is still
    /// invoked, so pair this with a transfer in dry-run mode.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn critical_folder(&self) -> &Path {
        self.relocator.critical_folder()
    }

    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    /// Run against the local clock
    pub fn run(&self) -> Result<SyncReport> {
        self.run_at(Local::now().naive_local())
    }

    /// Run with completion judged at `now`
    pub fn run_at(&self, now: NaiveDateTime) -> Result<SyncReport> {
        let source_folder = self.relocator.source_folder().to_path_buf();
        tracing::info!(
            source = %source_folder.display(),
            critical = %self.critical_folder().display(),
            destination = %self.destination.display(),
            dry_run = self.dry_run,
            "Starting sync"
        );

        let scan = self.detector.scan_at(&source_folder, now)?;

        let mut report = SyncReport {
            malformed: scan.malformed.clone(),
            pending: scan.pending.iter().map(|c| c.name.clone()).collect(),
            ..SyncReport::default()
        };

        for capture in &scan.completed {
            let capture_report = self.process_capture(&capture.name);
            if capture_report.remains_at_source() {
                report.work_list.push(source_folder.join(&capture.name));
            }
            report.captures.push(capture_report);
        }

        report
            .work_list
            .push(self.relocator.critical_folder().to_path_buf());

        for entry in &report.work_list {
            let status = self.transfer_entry(entry);
            report.transfers.push(TransferReport {
                source: entry.clone(),
                status,
            });
        }

        let failed = report
            .transfers
            .iter()
            .filter(|t| matches!(t.status, TransferStatus::Failed { .. }))
            .count();
        tracing::info!(
            completed = report.captures.len(),
            relocated = report.relocated().len(),
            transferred = report.transferred(),
            failed,
            "Sync finished"
        );

        Ok(report)
    }

    /// Classify one completed capture and relocate it if critical
    fn process_capture(&self, name: &str) -> CaptureReport {
        let path = self.relocator.source_folder().join(name);
        let classification = self.classifier.classify(&path);
        let disposition = classification.disposition();

        let mut capture_report = CaptureReport {
            name: name.to_string(),
            classification,
            disposition,
            relocation: None,
            error: None,
        };

        if !classification.is_critical() {
            tracing::info!(capture = %name, classification = %classification, "Capture is not critical");
            return capture_report;
        }

        if self.dry_run {
            tracing::info!(capture = %name, "Would move critical capture (dry run)");
            capture_report.relocation = Some(RelocationOutcome::Planned {
                destination: self.relocator.critical_folder().join(name),
            });
            return capture_report;
        }

        match self.relocator.relocate(name) {
            Ok(outcome) => capture_report.relocation = Some(outcome),
            Err(e) => {
                tracing::error!(capture = %name, error = %e, "Failed to relocate critical capture");
                capture_report.error = Some(e.to_string());
            }
        }

        capture_report
    }

    fn transfer_entry(&self, source: &Path) -> TransferStatus {
        if !source.exists() {
            let reason = if source.ends_with(CRITICAL_FOLDER_NAME) {
                "no critical captures yet".to_string()
            } else {
                "source no longer exists".to_string()
            };
            tracing::info!(source = %source.display(), reason = %reason, "Skipping transfer");
            return TransferStatus::Skipped { reason };
        }

        tracing::info!(
            source = %source.display(),
            destination = %self.destination.display(),
            transfer = self.transfer.name(),
            "Syncing data"
        );

        match self.transfer.transfer(source, &self.destination) {
            Ok(summary) => {
                if summary.is_empty() {
                    tracing::debug!(source = %source.display(), "Transfer printed no statistics");
                }
                tracing::info!(
                    source = %source.display(),
                    sent = summary.sent.as_deref().unwrap_or("-"),
                    total_size = summary.total_size.as_deref().unwrap_or("-"),
                    "Transfer complete"
                );
                TransferStatus::Completed { summary }
            }
            Err(e) => {
                tracing::error!(source = %source.display(), error = %e, "Transfer failed");
                TransferStatus::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
