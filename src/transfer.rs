//! Mirror transfers to the external drive
//!
//! The orchestrator only needs "copy this folder into that folder"; the
//! [`Transfer`] trait keeps it independent of how the copy happens.

use crate::Result;
use rsync::{MirrorOptions, Rsync, TransferSummary};
use std::path::{Path, PathBuf};

/// Copies a folder into a destination directory.
///
/// Implementations must be non-destructive and skip content that is already
/// present and unchanged at the destination, so repeated calls are cheap.
pub trait Transfer {
    fn transfer(&self, source: &Path, destination: &Path) -> Result<TransferSummary>;

    /// Short name for logs
    fn name(&self) -> &str;
}

/// [`Transfer`] backed by the rsync CLI
#[derive(Debug, Clone)]
pub struct RsyncTransfer {
    rsync: Rsync,
}

impl RsyncTransfer {
    /// Use `binary` with the default mirror options
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            rsync: Rsync::with_binary(binary),
        }
    }

    /// Pass `--dry-run` to rsync
    pub fn dry_run(mut self, enabled: bool) -> Self {
        let options = self.rsync.options().clone().dry_run(enabled);
        self.rsync = self.rsync.with_options(options);
        self
    }

    pub fn options(&self) -> &MirrorOptions {
        self.rsync.options()
    }

    /// Verify the binary runs, logging its version
    pub fn check_available(&self) -> Result<()> {
        let version = self.rsync.version()?;
        tracing::debug!(binary = %self.rsync.binary().display(), version = %version, "rsync available");
        Ok(())
    }
}

impl Transfer for RsyncTransfer {
    fn transfer(&self, source: &Path, destination: &Path) -> Result<TransferSummary> {
        tracing::debug!(
            args = %self.rsync.options().to_args().join(" "),
            source = %source.display(),
            destination = %destination.display(),
            "Running rsync"
        );
        Ok(self.rsync.mirror(source, destination)?)
    }

    fn name(&self) -> &str {
        "rsync"
    }
}
