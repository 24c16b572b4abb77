//! Flat-file [`RemoteFeed`] shared by every device that points at it.
//!
//! The document holds the record list plus a small metadata block. Expired
//! records are dropped on every read and every write.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use firemap_reporting::feed::{FeedError, FeedRecord, RemoteFeed};
use serde::{Deserialize, Serialize};

use crate::paths;

/// Current document format version.
pub const FEED_FORMAT_VERSION: &str = "1.0";

/// Counters kept next to the records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadata {
    /// Document format version.
    pub version: String,
    /// Records ever accepted, including ones since expired.
    pub total_reports: u64,
    /// Records currently held.
    pub active_reports: u64,
}

/// On-disk shape of the shared feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDocument {
    /// Records currently held.
    pub reports: Vec<FeedRecord>,
    /// Time of the last write.
    pub last_updated: DateTime<Utc>,
    /// Counters.
    pub metadata: FeedMetadata,
}

impl FeedDocument {
    /// An empty document stamped with `now`.
    #[must_use]
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            reports: Vec::new(),
            last_updated: now,
            metadata: FeedMetadata {
                version: FEED_FORMAT_VERSION.to_string(),
                total_reports: 0,
                active_reports: 0,
            },
        }
    }

    /// Drops records whose expiry hint has passed. Returns how many went.
    pub fn clean_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.reports.len();
        self.reports.retain(|record| !record.is_expired(now));
        let removed = before - self.reports.len();
        self.metadata.active_reports = self.reports.len() as u64;
        removed
    }
}

/// A [`RemoteFeed`] backed by one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFeedFile {
    path: PathBuf,
}

impl JsonFeedFile {
    /// Opens the feed at `path`, writing an empty document if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Io`] if the document cannot be created.
    pub fn open(path: impl Into<PathBuf>, now: DateTime<Utc>) -> Result<Self, FeedError> {
        let feed = Self { path: path.into() };

        if !feed.path.exists() {
            log::info!("Creating shared feed at {}", feed.path.display());
            feed.write(&FeedDocument::empty(now))?;
        }

        Ok(feed)
    }

    /// Location of the feed document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. A missing file reads as an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Io`] or [`FeedError::Json`] if the document is
    /// unreadable.
    pub fn read(&self, now: DateTime<Utc>) -> Result<FeedDocument, FeedError> {
        match paths::read_optional(&self.path)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(FeedDocument::empty(now)),
        }
    }

    fn write(&self, document: &FeedDocument) -> Result<(), FeedError> {
        let json = serde_json::to_vec_pretty(document)?;
        paths::write_atomic(&self.path, &json)?;
        Ok(())
    }
}

impl RemoteFeed for JsonFeedFile {
    fn publish(&mut self, record: &FeedRecord, now: DateTime<Utc>) -> Result<(), FeedError> {
        let mut document = self.read(now)?;
        let expired = document.clean_expired(now);
        if expired > 0 {
            log::info!("Cleaned {expired} expired feed records");
        }

        if document
            .reports
            .iter()
            .any(|existing| existing.report.id == record.report.id)
        {
            return Err(FeedError::DuplicateId(record.report.id.clone()));
        }

        document.reports.push(record.clone());
        document.metadata.total_reports += 1;
        document.metadata.active_reports = document.reports.len() as u64;
        document.last_updated = now;
        self.write(&document)?;

        log::info!(
            "Published report {} to {}",
            record.report.id,
            self.path.display()
        );
        Ok(())
    }

    fn snapshot(&mut self, now: DateTime<Utc>) -> Result<Vec<FeedRecord>, FeedError> {
        let mut document = self.read(now)?;
        let expired = document.clean_expired(now);

        if expired > 0 {
            log::info!("Cleaned {expired} expired feed records");
            document.last_updated = now;
            self.write(&document)?;
        }

        log::debug!("Feed snapshot holds {} records", document.reports.len());
        Ok(document.reports)
    }
}
