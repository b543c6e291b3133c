//! rsync wrapper for Rust
//!
//! A type-safe interface to the rsync CLI for archival mirror copies.
//!
//! # Example
//!
//! ```no_run
//! use rsync::{MirrorOptions, Rsync};
//!
//! let rsync = Rsync::new()?;
//!
//! // Mirror a folder into a destination directory
//! let summary = rsync.mirror("/mnt/data/capture@20240101_000000000000", "/media/ssd/BlockBlob")?;
//! println!("sent {:?}, total {:?}", summary.sent, summary.total_size);
//!
//! // Preview what would be copied
//! let preview = Rsync::new()?.with_options(MirrorOptions::default().dry_run(true));
//! preview.mirror("/mnt/data/criticalData", "/media/ssd/BlockBlob")?;
//! # Ok::<(), rsync::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Errors that can occur when invoking rsync
#[derive(Error, Debug)]
pub enum Error {
    #[error("rsync is not installed or not in PATH")]
    NotInstalled,

    #[error("rsync exited with status {code:?}: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("rsync was terminated by a signal")]
    Terminated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Flags controlling a mirror copy.
///
/// The default is an archival, non-destructive copy that does not carry
/// ownership, group or permission bits to the destination and does not
/// recompress payloads in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorOptions {
    pub archive: bool,
    pub compress: bool,
    pub verbose: bool,
    pub human_readable: bool,
    pub preserve_owner: bool,
    pub preserve_group: bool,
    pub recompress: bool,
    pub preserve_perms: bool,
    pub progress: bool,
    pub dry_run: bool,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            archive: true,
            compress: true,
            verbose: true,
            human_readable: true,
            preserve_owner: false,
            preserve_group: false,
            recompress: false,
            preserve_perms: false,
            progress: true,
            dry_run: false,
        }
    }
}

impl MirrorOptions {
    /// Enable or disable dry-run mode
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Render the options as rsync arguments
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        let mut short = String::new();
        if self.archive {
            short.push('a');
        }
        if self.compress {
            short.push('z');
        }
        if self.verbose {
            short.push('v');
        }
        if self.human_readable {
            short.push('h');
        }
        if !short.is_empty() {
            args.push(format!("-{}", short));
        }

        if !self.preserve_owner {
            args.push("--no-o".to_string());
        }
        if !self.preserve_group {
            args.push("--no-g".to_string());
        }
        if !self.recompress {
            args.push("--no-compress".to_string());
        }
        if !self.preserve_perms {
            args.push("--no-perms".to_string());
        }
        if self.progress {
            args.push("--progress".to_string());
        }
        if self.dry_run {
            args.push("--dry-run".to_string());
        }

        args
    }
}

/// Statistics rsync prints at the end of a verbose run.
///
/// Values are kept as printed since `-h` makes them human-readable
/// (e.g. `1.23K`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    #[serde(default)]
    pub sent: Option<String>,
    #[serde(default)]
    pub received: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub total_size: Option<String>,
    #[serde(default)]
    pub speedup: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl TransferSummary {
    /// Parse the trailing summary lines of rsync's verbose output
    pub fn parse(output: &str) -> Self {
        let mut summary = Self::default();

        for line in output.lines() {
            let line = line.trim();
            let words: Vec<&str> = line.split_whitespace().collect();

            if line.starts_with("sent ") {
                summary.sent = word_after(&words, "sent");
                summary.received = word_after(&words, "received");
                summary.rate = words
                    .iter()
                    .position(|w| *w == "bytes/sec")
                    .and_then(|pos| pos.checked_sub(1))
                    .map(|pos| words[pos].to_string());
            } else if line.starts_with("total size is ") {
                summary.total_size = words.get(3).map(|w| w.to_string());
                // "speedup is <n>"
                summary.speedup = words
                    .iter()
                    .position(|w| *w == "speedup")
                    .and_then(|pos| words.get(pos + 2))
                    .map(|w| w.to_string());
                summary.dry_run = line.contains("(DRY RUN)");
            }
        }

        summary
    }

    /// Whether rsync printed any recognizable statistics
    pub fn is_empty(&self) -> bool {
        self.sent.is_none() && self.total_size.is_none()
    }
}

fn word_after(words: &[&str], key: &str) -> Option<String> {
    words
        .iter()
        .position(|w| *w == key)
        .and_then(|pos| words.get(pos + 1))
        .map(|w| w.to_string())
}

/// rsync CLI wrapper
#[derive(Debug, Clone)]
pub struct Rsync {
    /// Binary to execute
    binary: PathBuf,
    /// Flags passed to every mirror invocation
    options: MirrorOptions,
}

impl Default for Rsync {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("rsync"),
            options: MirrorOptions::default(),
        }
    }
}

impl Rsync {
    /// Create a new instance using `rsync` from PATH
    pub fn new() -> Result<Self> {
        let rsync = Self::default();
        if !rsync.is_available() {
            return Err(Error::NotInstalled);
        }
        Ok(rsync)
    }

    /// Create with a specific binary, without checking that it runs
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            options: MirrorOptions::default(),
        }
    }

    /// Replace the mirror options
    pub fn with_options(mut self, options: MirrorOptions) -> Self {
        self.options = options;
        self
    }

    /// The options used for mirror invocations
    pub fn options(&self) -> &MirrorOptions {
        &self.options
    }

    /// The binary this wrapper invokes
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Check if rsync is available
    pub fn is_available(&self) -> bool {
        self.run_command(&["--version"]).is_ok()
    }

    /// Get the rsync version line
    pub fn version(&self) -> Result<String> {
        let output = self.run_command(&["--version"])?;
        Ok(output.lines().next().unwrap_or_default().trim().to_string())
    }

    /// Mirror `source` into the `destination` directory.
    ///
    /// `source` is passed without a trailing slash, so rsync recreates the
    /// source folder by name inside `destination`. Unchanged files are
    /// skipped on re-runs.
    pub fn mirror(
        &self,
        source: impl AsRef<Path>,
        destination: impl AsRef<Path>,
    ) -> Result<TransferSummary> {
        let mut args: Vec<&OsStr> = Vec::new();
        let flags = self.options.to_args();
        for flag in &flags {
            args.push(OsStr::new(flag));
        }
        args.push(source.as_ref().as_os_str());
        args.push(destination.as_ref().as_os_str());

        let output = self.run_command(args.as_slice())?;
        Ok(TransferSummary::parse(&output))
    }

    /// Run an rsync command, returning its stdout
    fn run_command<S: AsRef<OsStr>>(&self, args: &[S]) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);

        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Error::NotInstalled,
            _ => Error::Io(e),
        })?;

        if !output.status.success() {
            return match output.status.code() {
                Some(code) => Err(Error::CommandFailed {
                    code: Some(code),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                }),
                None => Err(Error::Terminated),
            };
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
