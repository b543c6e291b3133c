//! CLI command definitions
//!
//! All CLI structs and subcommand enums are defined here.

use clap::{Parser, Subcommand};
use datasync::config::{self, SyncConfig};
use std::path::PathBuf;

/// DataSync - Move finished captures to critical storage and mirror them to an external drive
#[derive(Parser, Debug)]
#[command(name = "datasync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Internal SSD mount containing the vehicle folder
    #[arg(long, global = true, env = config::ENV_INTERNAL_MOUNT)]
    pub internal_mount: Option<PathBuf>,

    /// Root under which the external drive is mounted
    #[arg(long, global = true, env = config::ENV_EXTERNAL_ROOT)]
    pub external_root: Option<PathBuf>,

    /// Lock marker path
    #[arg(long, global = true, env = config::ENV_LOCK_FILE)]
    pub lock_file: Option<PathBuf>,

    /// Directory for per-run log files
    #[arg(long, global = true, env = config::ENV_LOG_DIR)]
    pub log_dir: Option<PathBuf>,

    /// rsync executable
    #[arg(long, global = true, env = config::ENV_RSYNC)]
    pub rsync: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply flag and environment overrides on top of the defaults
    pub fn apply_overrides(&self, config: &mut SyncConfig) {
        if let Some(ref path) = self.internal_mount {
            config.internal_mount = path.clone();
        }
        if let Some(ref path) = self.external_root {
            config.external_mount_root = path.clone();
        }
        if let Some(ref path) = self.lock_file {
            config.lock_file = path.clone();
        }
        if let Some(ref path) = self.log_dir {
            config.log_dir = path.clone();
        }
        if let Some(ref path) = self.rsync {
            config.rsync_binary = path.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relocate critical captures and mirror completed captures to the external drive
    Run {
        /// Classify and log the plan without moving files; rsync runs with --dry-run
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show captures and their dispositions without changing anything
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Remove a lock marker left behind by a crashed run
    Unlock,
}
