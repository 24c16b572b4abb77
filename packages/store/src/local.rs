//! Directory-backed [`LocalStore`].
//!
//! The directory holds two JSON documents: the visible report list and the
//! submission meta. A missing document reads as empty. A corrupt report entry
//! is skipped, and corrupt meta reads as absent, so one bad write never locks
//! a device out of reporting.

use std::path::{Path, PathBuf};

use firemap_report_models::{Report, SubmissionMeta};
use firemap_reporting::store::{LocalStore, StoreError};

use crate::paths;

/// Persists one device's reports and submission meta under a directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Opens (and creates if needed) the store directory.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        paths::ensure_dir(&dir)?;
        log::debug!("Opened local report store at {}", dir.display());
        Ok(Self { dir })
    }

    /// The store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl LocalStore for JsonDirStore {
    fn load_reports(&self) -> Result<Vec<Report>, StoreError> {
        let path = paths::reports_path(&self.dir);
        let Some(bytes) = paths::read_optional(&path)? else {
            return Ok(Vec::new());
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_slice(&bytes) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Ignoring unreadable report list {}: {e}", path.display());
                return Ok(Vec::new());
            }
        };

        let total = entries.len();
        let reports: Vec<Report> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Report>(entry) {
                Ok(report) => Some(report),
                Err(e) => {
                    log::warn!("Skipping malformed stored report: {e}");
                    None
                }
            })
            .collect();

        log::debug!("Loaded {}/{total} stored reports", reports.len());
        Ok(reports)
    }

    fn save_reports(&mut self, reports: &[Report]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(reports)?;
        paths::write_atomic(&paths::reports_path(&self.dir), &json)?;
        log::debug!("Saved {} reports", reports.len());
        Ok(())
    }

    fn load_meta(&self) -> Result<Option<SubmissionMeta>, StoreError> {
        let path = paths::meta_path(&self.dir);
        let Some(bytes) = paths::read_optional(&path)? else {
            return Ok(None);
        };

        match serde_json::from_slice(&bytes) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                log::warn!("Ignoring unreadable submission meta {}: {e}", path.display());
                Ok(None)
            }
        }
    }

    fn save_meta(&mut self, meta: &SubmissionMeta) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(meta)?;
        paths::write_atomic(&paths::meta_path(&self.dir), &json)?;
        Ok(())
    }
}
