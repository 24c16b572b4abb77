//! Device-local persistence for the visible report set and submission meta.

use firemap_report_models::{Report, SubmissionMeta};
use thiserror::Error;

/// Errors from a [`LocalStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other backend failure.
    #[error("Store error: {0}")]
    Backend(String),
}

/// Where a device keeps its reports and its submission counter.
pub trait LocalStore {
    /// Loads the persisted report set. An empty store yields no reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_reports(&self) -> Result<Vec<Report>, StoreError>;

    /// Replaces the persisted report set.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn save_reports(&mut self, reports: &[Report]) -> Result<(), StoreError>;

    /// Loads the persisted submission meta, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn load_meta(&self) -> Result<Option<SubmissionMeta>, StoreError>;

    /// Replaces the persisted submission meta.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn save_meta(&mut self, meta: &SubmissionMeta) -> Result<(), StoreError>;
}

/// In-memory store for a single session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    reports: Vec<Report>,
    meta: Option<SubmissionMeta>,
    writes: usize,
}

impl MemoryStore {
    /// A store pre-loaded with `reports` and `meta`.
    #[must_use]
    pub const fn with_state(reports: Vec<Report>, meta: Option<SubmissionMeta>) -> Self {
        Self {
            reports,
            meta,
            writes: 0,
        }
    }

    /// Number of save calls so far.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl LocalStore for MemoryStore {
    fn load_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(self.reports.clone())
    }

    fn save_reports(&mut self, reports: &[Report]) -> Result<(), StoreError> {
        self.reports = reports.to_vec();
        self.writes += 1;
        Ok(())
    }

    fn load_meta(&self) -> Result<Option<SubmissionMeta>, StoreError> {
        Ok(self.meta.clone())
    }

    fn save_meta(&mut self, meta: &SubmissionMeta) -> Result<(), StoreError> {
        self.meta = Some(meta.clone());
        self.writes += 1;
        Ok(())
    }
}
