//! Configuration validation
//!
//! Catches settings that would make a run misbehave rather than fail:
//! - Empty paths
//! - A lock marker inside the data folders
//! - A non-positive completion threshold

use super::sync_config::SyncConfig;
use crate::DataSyncError;
use std::path::Path;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

fn check_path(errors: &mut Vec<ValidationError>, field: &str, path: &Path) {
    if path.as_os_str().is_empty() {
        errors.push(ValidationError::new(field, "Path must not be empty"));
    }
}

/// Validate a run configuration
pub fn validate_config(config: &SyncConfig) -> ValidationResult {
    let mut errors = Vec::new();

    check_path(&mut errors, "internal_mount", &config.internal_mount);
    check_path(&mut errors, "external_mount_root", &config.external_mount_root);
    check_path(&mut errors, "lock_file", &config.lock_file);
    check_path(&mut errors, "log_dir", &config.log_dir);
    check_path(&mut errors, "rsync_binary", &config.rsync_binary);

    if config.completion_threshold_minutes <= 0 {
        errors.push(ValidationError::new(
            "completion_threshold_minutes",
            "Threshold must be greater than 0",
        ));
    }

    // A marker under the mirrored tree would be copied to the drive
    if !config.internal_mount.as_os_str().is_empty()
        && config.lock_file.starts_with(&config.internal_mount)
    {
        errors.push(ValidationError::new(
            "lock_file",
            format!(
                "Lock file must not live under the internal mount {}",
                config.internal_mount.display()
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate and convert the error list into a single configuration error
pub fn validate_config_result(config: &SyncConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        DataSyncError::Config(messages.join("; "))
    })
}
