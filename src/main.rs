//! DataSync - Capture lifecycle mover
//!
//! Main entry point for the DataSync CLI.

mod commands;

use chrono::Local;
use clap::Parser;
use commands::{Cli, Commands};
use datasync::capture::Disposition;
use datasync::classify::TagClassifier;
use datasync::config::SyncConfig;
use datasync::detect::CompletionDetector;
use datasync::discovery::find_vehicle_folder;
use datasync::job::{run_job, JobOutcome};
use datasync::lock::InstanceLock;
use datasync::status::{collect_status, StatusReport};
use datasync::style;
use datasync::sync::SyncReport;
use datasync::transfer::RsyncTransfer;
use std::process;

/// Exit status when another run holds the lock (EX_TEMPFAIL)
const EXIT_ALREADY_RUNNING: i32 = 75;

fn main() {
    let cli = Cli::parse();

    let mut config = SyncConfig::default();
    cli.apply_overrides(&mut config);

    // Only runs write a log file; status and unlock log to the console
    let log_dir = match cli.command {
        Commands::Run { .. } => Some(config.log_dir.as_path()),
        _ => None,
    };
    let _log_guard = match datasync::logging::init(log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            None
        }
    };

    if let Some(path) = _log_guard.as_ref().and_then(|g| g.path()) {
        tracing::info!(path = %path.display(), "Logging to file");
    }

    match run(cli, config) {
        Ok(code) => {
            if code != 0 {
                drop(_log_guard);
                process::exit(code);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "datasync failed");
            eprintln!("Error: {}", e);
            drop(_log_guard);
            process::exit(1);
        }
    }
}

fn run(cli: Cli, config: SyncConfig) -> datasync::Result<i32> {
    datasync::config::validate_config_result(&config)?;
    tracing::debug!(
        internal_mount = %config.internal_mount.display(),
        external_root = %config.external_mount_root.display(),
        lock_file = %config.lock_file.display(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Run { dry_run, json } => {
            let transfer = RsyncTransfer::new(&config.rsync_binary).dry_run(dry_run);
            if let Err(e) = transfer.check_available() {
                tracing::warn!(error = %e, "rsync check failed, transfers will fail");
            }

            match run_job(&config, transfer, dry_run)? {
                JobOutcome::AlreadyRunning { .. } => Ok(EXIT_ALREADY_RUNNING),
                JobOutcome::Finished(report) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&report)?);
                    } else {
                        print_run_summary(&report);
                    }
                    Ok(0)
                }
            }
        }

        Commands::Status { json } => {
            let source_folder = find_vehicle_folder(&config.internal_mount)?;
            let report = collect_status(
                &source_folder,
                &CompletionDetector::new(config.completion_threshold()),
                &TagClassifier::default(),
                Local::now().naive_local(),
            )?;
            let lock = InstanceLock::new(&config.lock_file);

            if json {
                let value = serde_json::json!({
                    "status": report,
                    "locked": lock.is_locked(),
                    "lock_holder": lock.holder_info(),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print_status(&report, &lock);
            }
            Ok(0)
        }

        Commands::Unlock => {
            let lock = InstanceLock::new(&config.lock_file);
            match lock.clear_stale()? {
                Some(info) => {
                    println!("Removed lock {}", lock.path().display());
                    if !info.is_empty() {
                        println!("{}", style::dim(&info));
                    }
                }
                None => println!("No lock at {}", lock.path().display()),
            }
            Ok(0)
        }
    }
}

fn print_run_summary(report: &SyncReport) {
    println!("{}", style::header("Sync finished"));
    println!("  Completed captures: {}", report.captures.len());
    println!("  Relocated:          {}", report.relocated().len());
    println!("  Still recording:    {}", report.pending.len());
    println!("  Malformed names:    {}", style::count_warning(report.malformed.len()));
    println!(
        "  Transfers:          {} of {}",
        report.transferred(),
        report.transfers.len()
    );

    let errors = report.errors();
    if !errors.is_empty() {
        println!();
        println!("Errors: {}", style::count_warning(errors.len()));
        for error in errors {
            println!("  {}", error);
        }
    }
}

fn print_status(report: &StatusReport, lock: &InstanceLock) {
    println!(
        "{} {}",
        style::header("Source:"),
        report.source_folder.display()
    );
    println!();

    for capture in &report.captures {
        println!(
            "{} {} {}",
            style::disposition_indicator(capture.disposition),
            capture.name,
            style::disposition_style(capture.disposition)
        );
    }
    for malformed in &report.malformed {
        println!("  {} {}", malformed.name, style::dim(&malformed.reason));
    }

    println!();
    println!(
        "Incomplete: {}  Normal: {}  Critical: {}  In criticalData: {}  Malformed: {}",
        report.count(Disposition::Incomplete),
        report.count(Disposition::CompletedNormal),
        report.count(Disposition::CompletedCritical),
        report.critical_count,
        style::count_warning(report.malformed.len())
    );

    if lock.is_locked() {
        println!(
            "Lock: held at {} ({})",
            lock.path().display(),
            lock.holder_info().unwrap_or_else(|| "no details".to_string()).replace('\n', ", ")
        );
    } else {
        println!("Lock: free");
    }
}
