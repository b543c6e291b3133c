//! Run configuration with fixed defaults
//!
//! Each path can be overridden by a command-line flag or the environment
//! variable named below; the CLI reads both and applies them on top of
//! [`SyncConfig::default`].

use crate::detect::COMPLETION_THRESHOLD_MINUTES;
use std::path::PathBuf;

/// Environment variable overriding the internal mount
pub const ENV_INTERNAL_MOUNT: &str = "DATASYNC_INTERNAL_MOUNT";
/// Environment variable overriding the external mount root
pub const ENV_EXTERNAL_ROOT: &str = "DATASYNC_EXTERNAL_ROOT";
/// Environment variable overriding the lock marker path
pub const ENV_LOCK_FILE: &str = "DATASYNC_LOCK_FILE";
/// Environment variable overriding the log directory
pub const ENV_LOG_DIR: &str = "DATASYNC_LOG_DIR";
/// Environment variable overriding the rsync binary
pub const ENV_RSYNC: &str = "DATASYNC_RSYNC";

pub const DEFAULT_INTERNAL_MOUNT: &str = "/mnt/dsu0";
pub const DEFAULT_EXTERNAL_ROOT: &str = "/media/autera-admin";
pub const DEFAULT_RSYNC: &str = "rsync";

/// Paths and settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Internal SSD mount containing the vehicle folder
    pub internal_mount: PathBuf,

    /// Root under which the removable drive is mounted
    pub external_mount_root: PathBuf,

    /// Instance lock marker
    pub lock_file: PathBuf,

    /// Directory for per-run log files
    pub log_dir: PathBuf,

    /// rsync executable
    pub rsync_binary: PathBuf,

    /// Age in minutes after which a capture is complete
    pub completion_threshold_minutes: i64,
}

/// `~/.datasync`, or `./.datasync` without a home directory
fn default_state_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".datasync");
    path
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            internal_mount: PathBuf::from(DEFAULT_INTERNAL_MOUNT),
            external_mount_root: PathBuf::from(DEFAULT_EXTERNAL_ROOT),
            lock_file: Self::default_lock_file(),
            log_dir: Self::default_log_dir(),
            rsync_binary: PathBuf::from(DEFAULT_RSYNC),
            completion_threshold_minutes: COMPLETION_THRESHOLD_MINUTES,
        }
    }
}

impl SyncConfig {
    /// Default lock marker (`~/.datasync/sync.lock`)
    pub fn default_lock_file() -> PathBuf {
        default_state_dir().join("sync.lock")
    }

    /// Default log directory (`~/.datasync/logs`)
    pub fn default_log_dir() -> PathBuf {
        default_state_dir().join("logs")
    }

    /// Completion threshold as a duration
    pub fn completion_threshold(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.completion_threshold_minutes)
    }
}
