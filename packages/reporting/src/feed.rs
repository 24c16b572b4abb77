//! Best-effort remote feed that shares reports between devices.
//!
//! Records carry a server-side expiry hint. A record past its hint is expired
//! no matter what the local lifecycle says. Feed failures never block local
//! visibility.

use chrono::{DateTime, TimeDelta, Utc};
use firemap_report_models::{ModerationStatus, Report, ReportId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a [`RemoteFeed`].
#[derive(Debug, Error)]
pub enum FeedError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The feed already holds a record with this id.
    #[error("Report with id {0} already exists")]
    DuplicateId(ReportId),

    /// The feed could not be reached.
    #[error("Feed unavailable: {0}")]
    Unavailable(String),
}

/// A report as published to the remote feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRecord {
    /// The report itself, in its usual wire shape.
    #[serde(flatten)]
    pub report: Report,
    /// Server-side expiry hint.
    pub expires_at: DateTime<Utc>,
    /// Moderation state when the feed is moderation-gated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ModerationStatus>,
}

impl FeedRecord {
    /// Wraps a newly created report with `expires_at = created_at + ttl`.
    #[must_use]
    pub fn for_report(report: Report, ttl: TimeDelta) -> Self {
        let expires_at = report.created_at + ttl;
        Self {
            report,
            expires_at,
            status: None,
        }
    }

    /// Whether the expiry hint has passed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether moderation allows showing this record. Ungated records are
    /// always shown.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.status.is_none_or(ModerationStatus::is_public)
    }
}

/// A shared store of reports keyed by id.
pub trait RemoteFeed {
    /// Offers a new record to the feed at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed is unreachable or already holds the id.
    fn publish(&mut self, record: &FeedRecord, now: DateTime<Utc>) -> Result<(), FeedError>;

    /// Fetches the full current set of records.
    ///
    /// # Errors
    ///
    /// Returns an error if the feed is unreachable or unreadable.
    fn snapshot(&mut self, now: DateTime<Utc>) -> Result<Vec<FeedRecord>, FeedError>;
}

/// A feed for devices that do not share reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeed;

impl RemoteFeed for NullFeed {
    fn publish(&mut self, _record: &FeedRecord, _now: DateTime<Utc>) -> Result<(), FeedError> {
        Ok(())
    }

    fn snapshot(&mut self, _now: DateTime<Utc>) -> Result<Vec<FeedRecord>, FeedError> {
        Ok(Vec::new())
    }
}
