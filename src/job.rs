//! One locked sync job
//!
//! Wires the instance lock, mount discovery and the orchestrator together.
//! The lock is released on every exit path, including setup errors.

use crate::config::SyncConfig;
use crate::detect::CompletionDetector;
use crate::discovery::{find_external_destination, find_vehicle_folder};
use crate::lock::InstanceLock;
use crate::sync::{SyncOrchestrator, SyncReport};
use crate::transfer::Transfer;
use crate::Result;

/// How a job ended
#[derive(Debug)]
pub enum JobOutcome {
    /// Another run holds the lock; nothing was done
    AlreadyRunning { holder: Option<String> },

    /// The run completed (possibly with per-item errors in the report)
    Finished(SyncReport),
}

/// Run one sync job with `transfer`
pub fn run_job<T: Transfer>(config: &SyncConfig, transfer: T, dry_run: bool) -> Result<JobOutcome> {
    tracing::info!("Start sync data");

    let mut lock = InstanceLock::new(&config.lock_file);
    if !lock.try_acquire()? {
        let holder = lock.holder_info();
        tracing::info!(
            lock = %config.lock_file.display(),
            holder = holder.as_deref().unwrap_or("unknown"),
            "Exit because another sync is running"
        );
        return Ok(JobOutcome::AlreadyRunning { holder });
    }

    let result = run_locked(config, transfer, dry_run);
    if let Err(ref e) = result {
        tracing::error!(error = %e, "Error syncing data");
    }

    lock.release()?;
    Ok(JobOutcome::Finished(result?))
}

fn run_locked<T: Transfer>(config: &SyncConfig, transfer: T, dry_run: bool) -> Result<SyncReport> {
    let source_folder = find_vehicle_folder(&config.internal_mount)?;
    let destination = find_external_destination(&config.external_mount_root)?;

    let orchestrator = SyncOrchestrator::new(source_folder, destination, transfer)
        .with_detector(CompletionDetector::new(config.completion_threshold()))
        .dry_run(dry_run);

    orchestrator.run()
}
