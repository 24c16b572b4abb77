#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Anti-abuse submission guard and report lifecycle engine.
//!
//! Everything in this crate is a pure transform over values passed in by the
//! caller plus an injected `now`:
//!
//! - [`guard::SubmissionGuard`] decides whether a device may submit a report
//!   right now (cooldown, daily quota, spatial-temporal duplicate).
//! - [`lifecycle::ReportLifecycle`] creates and edits reports and decides
//!   when they expire.
//! - [`book::ReportBook`] threads that state through a session and persists
//!   it via the [`store::LocalStore`] and [`feed::RemoteFeed`] collaborators.
//!
//! Operator overrides of the guard go through [`authority::OperatorAuthority`]
//! and are written to the `firemap::audit` log target.

pub mod authority;
pub mod book;
pub mod feed;
pub mod geo;
pub mod guard;
pub mod lifecycle;
pub mod store;

use chrono::TimeDelta;
use firemap_report_models::LocationError;
use thiserror::Error;

/// Log target for operator audit events.
pub const AUDIT_TARGET: &str = "firemap::audit";

/// Minimum wait between two submissions from one device.
pub const COOLDOWN_MINUTES: i64 = 30;

/// Maximum successful submissions per device per local day.
pub const DAILY_LIMIT: u32 = 3;

/// Distance within which a recent report counts as a duplicate.
pub const DEDUPE_RADIUS_METERS: f64 = 200.0;

/// How far back the duplicate check looks.
pub const DEDUPE_WINDOW_MINUTES: i64 = 60;

/// How long an active report stays visible, measured from creation.
pub const ACTIVE_TTL_HOURS: i64 = 24;

/// How long a report stays visible after being marked inactive.
pub const INACTIVE_GRACE_MINUTES: i64 = 60;

/// Minimum description length after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Maximum description length after trimming.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

/// Maximum contact info length after trimming.
pub const MAX_CONTACT_INFO_CHARS: usize = 100;

/// Thresholds used by the guard and the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportingPolicy {
    /// Minimum time between two successful submissions.
    pub cooldown: TimeDelta,
    /// Successful submissions allowed per local day.
    pub daily_limit: u32,
    /// Inclusive duplicate radius in meters.
    pub dedupe_radius_meters: f64,
    /// Inclusive look-back window for the duplicate check.
    pub dedupe_window: TimeDelta,
    /// Lifetime of an active report from its creation time.
    pub active_ttl: TimeDelta,
    /// Lifetime of an inactive report from its last update.
    pub inactive_grace: TimeDelta,
}

impl Default for ReportingPolicy {
    fn default() -> Self {
        Self {
            cooldown: TimeDelta::minutes(COOLDOWN_MINUTES),
            daily_limit: DAILY_LIMIT,
            dedupe_radius_meters: DEDUPE_RADIUS_METERS,
            dedupe_window: TimeDelta::minutes(DEDUPE_WINDOW_MINUTES),
            active_ttl: TimeDelta::hours(ACTIVE_TTL_HOURS),
            inactive_grace: TimeDelta::minutes(INACTIVE_GRACE_MINUTES),
        }
    }
}

/// Malformed report fields at create or update time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Description is shorter than [`MIN_DESCRIPTION_CHARS`] after trimming.
    #[error("description must be at least {min} characters (got {len})")]
    DescriptionTooShort {
        /// Trimmed length that was provided.
        len: usize,
        /// Required minimum.
        min: usize,
    },

    /// Description is longer than [`MAX_DESCRIPTION_CHARS`] after trimming.
    #[error("description must be at most {max} characters (got {len})")]
    DescriptionTooLong {
        /// Trimmed length that was provided.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Contact info is longer than [`MAX_CONTACT_INFO_CHARS`] after trimming.
    #[error("contact info must be at most {max} characters (got {len})")]
    ContactInfoTooLong {
        /// Trimmed length that was provided.
        len: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// Report type is not one of the known incident kinds.
    #[error("unknown report type: {0}")]
    UnknownReportType(String),

    /// Severity is not one of the known levels.
    #[error("unknown severity: {0}")]
    UnknownSeverity(String),

    /// Coordinates are not a valid position.
    #[error(transparent)]
    Location(#[from] LocationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_published_limits() {
        let policy = ReportingPolicy::default();
        assert_eq!(policy.cooldown.num_milliseconds(), 1_800_000);
        assert_eq!(policy.daily_limit, 3);
        assert!((policy.dedupe_radius_meters - 200.0).abs() < f64::EPSILON);
        assert_eq!(policy.dedupe_window.num_milliseconds(), 3_600_000);
        assert_eq!(policy.active_ttl.num_milliseconds(), 86_400_000);
        assert_eq!(policy.inactive_grace.num_milliseconds(), 3_600_000);
    }
}
