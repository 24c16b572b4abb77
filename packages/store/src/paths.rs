//! Canonical file names inside a fire map data directory.

use std::path::{Path, PathBuf};

/// File holding the device's visible reports.
pub const REPORTS_FILE: &str = "user_reports.json";

/// File holding the device's submission meta.
pub const META_FILE: &str = "report_meta.json";

/// Default name of the shared feed file.
pub const FEED_FILE: &str = "feed.json";

/// Returns the reports file inside `data_dir`.
#[must_use]
pub fn reports_path(data_dir: &Path) -> PathBuf {
    data_dir.join(REPORTS_FILE)
}

/// Returns the submission meta file inside `data_dir`.
#[must_use]
pub fn meta_path(data_dir: &Path) -> PathBuf {
    data_dir.join(META_FILE)
}

/// Returns the default shared feed file inside `data_dir`.
#[must_use]
pub fn feed_path(data_dir: &Path) -> PathBuf {
    data_dir.join(FEED_FILE)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `contents` to `path` through a sibling temp file and a rename, so
/// readers never see a half-written document.
///
/// # Errors
///
/// Returns an I/O error if the parent directory, the temp file or the rename
/// fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

/// Reads `path`, returning `None` if it does not exist.
///
/// # Errors
///
/// Returns an I/O error for any failure other than a missing file.
pub fn read_optional(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
