//! DataSync - Capture lifecycle mover for vehicle data loggers
//!
//! DataSync runs on the logging device. It finds finished raw data captures on
//! the internal SSD, moves the ones tagged as critical into a dedicated
//! folder, and mirrors finished captures to a removable drive with rsync.
//!
//! # Architecture
//!
//! - **capture**: Capture naming convention and dispositions
//! - **detect**: Completion detection (age threshold)
//! - **classify**: Tag artifact classification (critical marker)
//! - **relocate**: Moves critical captures into `criticalData`
//! - **transfer**: Mirror transfer trait and rsync adapter
//! - **sync**: Orchestration of one run and its report
//! - **lock**: Single-instance lock marker
//! - **discovery**: Vehicle folder and external drive discovery
//! - **job**: Locked end-to-end run
//! - **status**: Read-only overview of the source folder

// Core modules
pub mod capture;
pub mod classify;
pub mod detect;
pub mod relocate;
pub mod sync;

// Glue
pub mod config;
pub mod discovery;
pub mod error;
pub mod job;
pub mod lock;
pub mod logging;
pub mod status;
pub mod style;
pub mod transfer;

// Re-exports
pub use error::{DataSyncError, Result};
