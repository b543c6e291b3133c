//! Error types for DataSync
//!
//! Setup failures abort a run; capture-level failures (tag, relocation,
//! transfer) are collected per item by the orchestrator and never abort it.
//! Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for DataSync operations
pub type Result<T> = std::result::Result<T, DataSyncError>;

/// Error type for DataSync operations
#[derive(Error, Debug)]
pub enum DataSyncError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mount or destination discovery failed; the run cannot start
    #[error("Setup error: {0}")]
    Setup(String),

    /// Capture name does not carry a parseable timestamp
    #[error("Invalid capture name '{name}': {reason}")]
    InvalidCaptureName { name: String, reason: String },

    /// Tag artifact exists but could not be read
    #[error("Tag file {path} unreadable: {source}")]
    TagUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A folder with the capture's name already exists in the critical folder
    #[error("Cannot relocate '{capture}': {destination} already exists")]
    RelocationCollision {
        capture: String,
        destination: PathBuf,
    },

    /// Moving the capture folder failed
    #[error("Failed to relocate '{capture}': {source}")]
    Relocation {
        capture: String,
        #[source]
        source: std::io::Error,
    },

    /// External mirror copy failed
    #[error("Transfer error: {0}")]
    Transfer(#[from] rsync::Error),

    /// Lock marker could not be created, read or removed
    #[error("Lock error: {0}")]
    Lock(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl DataSyncError {
    /// Whether this error aborts the whole run rather than a single capture
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DataSyncError::Config(_) | DataSyncError::Setup(_) | DataSyncError::Lock(_)
        )
    }
}
