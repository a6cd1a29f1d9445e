//! Engine working directory: must exist and be writable before the engine
//! is built.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Make sure `path` is a writable directory, creating it (and its parents)
/// when missing.
pub fn ensure_work_dir(path: &Path) -> Result<()> {
    if !path.is_dir() {
        if path.exists() {
            return Err(invalid(path, "path exists but is not a directory"));
        }
        create_dir(path).map_err(|e| invalid(path, &format!("could not create folder: {e}")))?;
        log::debug!("created working directory {}", path.display());
    }

    // Permission bits say nothing about ownership; create a real file.
    tempfile::Builder::new()
        .prefix(".write-check-")
        .tempfile_in(path)
        .map_err(|e| invalid(path, &format!("folder is not writable: {e}")))?;
    Ok(())
}

fn invalid(path: &Path, reason: &str) -> Error {
    Error::InvalidConfig {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(unix)]
fn create_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o777).create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> io::Result<()> {
    fs::DirBuilder::new().recursive(true).create(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("runtime").join("pdf");
        ensure_work_dir(&nested).unwrap();
        assert!(nested.is_dir());
        // Second call is a no-op.
        ensure_work_dir(&nested).unwrap();
    }

    #[test]
    fn file_in_the_way_is_a_config_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        let err = ensure_work_dir(&file).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_directory_is_a_config_error() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempfile::tempdir().unwrap();
        let locked = root.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Root bypasses permission bits; only check when the write really fails.
        let writable = fs::write(locked.join("x"), b"x").is_ok();
        let result = ensure_work_dir(&locked);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if writable {
            assert!(result.is_ok());
        } else {
            assert!(matches!(result, Err(Error::InvalidConfig { .. })));
        }
    }

    #[test]
    fn writability_check_leaves_no_files() {
        let root = tempfile::tempdir().unwrap();
        ensure_work_dir(root.path()).unwrap();
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn uncreatable_directory_is_a_config_error() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        fs::write(&file, b"x").unwrap();
        let err = ensure_work_dir(&file.join("below")).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
    }
}
