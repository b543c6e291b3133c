//! Mount discovery
//!
//! The logger writes into a single vehicle folder (its name contains the
//! vehicle identifier `VF`) on the internal SSD. The removable drive is
//! whatever is mounted under the external mount root.

use crate::{DataSyncError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Substring identifying the vehicle folder on the internal mount
pub const VEHICLE_MARKER: &str = "VF";

/// Folder created on the external drive to receive mirrored captures
pub const DESTINATION_SUBFOLDER: &str = "BlockBlob";

/// Subdirectory names of `root`, sorted
fn sorted_dir_names(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root)
        .map_err(|e| DataSyncError::Setup(format!("cannot list {}: {}", root.display(), e)))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Find the vehicle data folder under the internal mount
pub fn find_vehicle_folder(internal_mount: &Path) -> Result<PathBuf> {
    let names = sorted_dir_names(internal_mount)?;
    let mut matches = names.iter().filter(|name| name.contains(VEHICLE_MARKER));

    let first = matches.next().ok_or_else(|| {
        DataSyncError::Setup(format!(
            "no folder containing '{}' under {}",
            VEHICLE_MARKER,
            internal_mount.display()
        ))
    })?;

    let others: Vec<&String> = matches.collect();
    if !others.is_empty() {
        tracing::warn!(using = %first, ignored = ?others, "More than one vehicle folder found");
    }

    let folder = internal_mount.join(first);
    tracing::info!(folder = %folder.display(), "Source data folder");
    Ok(folder)
}

/// Find the external drive and ensure its `BlockBlob` folder exists
pub fn find_external_destination(external_root: &Path) -> Result<PathBuf> {
    let names = sorted_dir_names(external_root)?;
    let drive = names.first().ok_or_else(|| {
        DataSyncError::Setup(format!(
            "no external drive mounted under {}",
            external_root.display()
        ))
    })?;

    let destination = external_root.join(drive).join(DESTINATION_SUBFOLDER);
    fs::create_dir_all(&destination).map_err(|e| {
        DataSyncError::Setup(format!("cannot create {}: {}", destination.display(), e))
    })?;

    tracing::info!(destination = %destination.display(), "External destination folder");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_vehicle_folder() {
        let mount = TempDir::new().unwrap();
        fs::create_dir(mount.path().join("lost+found")).unwrap();
        fs::create_dir(mount.path().join("VF1234567")).unwrap();
        fs::write(mount.path().join("VF_notes"), "file, not folder").unwrap();

        let folder = find_vehicle_folder(mount.path()).unwrap();
        assert_eq!(folder, mount.path().join("VF1234567"));
    }

    #[test]
    fn test_find_vehicle_folder_prefers_first_sorted() {
        let mount = TempDir::new().unwrap();
        fs::create_dir(mount.path().join("car_VF_b")).unwrap();
        fs::create_dir(mount.path().join("car_VF_a")).unwrap();
        assert_eq!(
            find_vehicle_folder(mount.path()).unwrap(),
            mount.path().join("car_VF_a")
        );
    }

    #[test]
    fn test_missing_vehicle_folder_is_setup_error() {
        let mount = TempDir::new().unwrap();
        fs::create_dir(mount.path().join("other")).unwrap();
        let err = find_vehicle_folder(mount.path()).unwrap_err();
        assert!(matches!(err, DataSyncError::Setup(_)));
    }

    #[test]
    fn test_find_external_destination_creates_subfolder() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("SSD_T7")).unwrap();

        let destination = find_external_destination(root.path()).unwrap();
        assert_eq!(destination, root.path().join("SSD_T7").join(DESTINATION_SUBFOLDER));
        assert!(destination.is_dir());

        // Existing folder is fine
        assert_eq!(find_external_destination(root.path()).unwrap(), destination);
    }

    #[test]
    fn test_no_external_drive_is_setup_error() {
        let root = TempDir::new().unwrap();
        assert!(find_external_destination(root.path()).unwrap_err().is_fatal());
        assert!(find_external_destination(&root.path().join("absent"))
            .unwrap_err()
            .is_fatal());
    }
}
