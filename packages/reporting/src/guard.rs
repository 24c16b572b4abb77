//! Client-side anti-abuse gate consulted before a report is created.
//!
//! Three independent policies are checked in a fixed order so the user sees
//! the most relevant rejection first: cooldown, daily quota, then
//! spatial-temporal duplicate. This is a device-local heuristic, not a
//! security boundary.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta, Utc};
use firemap_report_models::{Location, Report, ReportId, SubmissionMeta};

use crate::ReportingPolicy;
use crate::authority::BypassGrant;
use crate::geo::haversine_meters;

/// Why a submission was turned away.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    /// The previous submission was too recent.
    Cooldown {
        /// Whole minutes left, rounded up.
        remaining_minutes: i64,
    },
    /// The device already used today's quota.
    DailyQuota {
        /// Submissions allowed per day.
        limit: u32,
    },
    /// A recent report already covers this spot.
    Duplicate {
        /// The report that matched.
        existing: ReportId,
        /// Distance from the candidate to that report.
        distance_meters: f64,
        /// Radius that was checked.
        radius_meters: f64,
        /// Look-back window that was checked.
        window: TimeDelta,
    },
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cooldown { remaining_minutes } => write!(
                f,
                "Please wait {remaining_minutes} more minute(s) before submitting another report."
            ),
            Self::DailyQuota { limit } => write!(
                f,
                "Daily limit reached. You can submit up to {limit} reports per day."
            ),
            Self::Duplicate {
                radius_meters,
                window,
                ..
            } => {
                let window = if *window == TimeDelta::hours(1) {
                    "the last hour".to_string()
                } else {
                    format!("the last {} minutes", window.num_minutes())
                };
                write!(
                    f,
                    "A report already exists within {radius_meters}m in {window}. \
                     Please avoid duplicate reports."
                )
            }
        }
    }
}

/// A typed negative result plus the message shown to the user verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Which policy rejected the submission.
    pub reason: RejectionReason,
    /// Human-readable explanation.
    pub message: String,
}

impl From<RejectionReason> for Rejection {
    fn from(reason: RejectionReason) -> Self {
        let message = reason.to_string();
        Self { reason, message }
    }
}

/// Outcome of [`SubmissionGuard::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The submission may proceed.
    Approved,
    /// The submission must not proceed.
    Rejected(Rejection),
}

impl Decision {
    /// Whether the submission may proceed.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// The rejection, if any.
    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Approved => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Gates submission attempts against the device's history.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubmissionGuard {
    policy: ReportingPolicy,
}

impl SubmissionGuard {
    /// Creates a guard enforcing `policy`.
    #[must_use]
    pub const fn new(policy: ReportingPolicy) -> Self {
        Self { policy }
    }

    /// The policy this guard enforces.
    #[must_use]
    pub const fn policy(&self) -> &ReportingPolicy {
        &self.policy
    }

    /// Decides whether a report at `candidate` may be submitted at `now`.
    ///
    /// `meta` must already be rolled to the current local day. A `bypass`
    /// grant approves unconditionally and is recorded in the audit log.
    /// Nothing passed in is modified; see [`record_submission`].
    #[must_use]
    pub fn evaluate(
        &self,
        candidate: Location,
        existing: &[Report],
        meta: &SubmissionMeta,
        now: DateTime<Utc>,
        bypass: Option<&BypassGrant>,
    ) -> Decision {
        if let Some(grant) = bypass {
            grant.record_use(now);
            return Decision::Approved;
        }

        if let Some(remaining_minutes) = self.cooldown_remaining_minutes(meta, now) {
            log::debug!("Submission rejected: cooldown ({remaining_minutes} min left)");
            return Decision::Rejected(RejectionReason::Cooldown { remaining_minutes }.into());
        }

        if meta.count >= self.policy.daily_limit {
            log::debug!(
                "Submission rejected: daily quota {}/{}",
                meta.count,
                self.policy.daily_limit
            );
            return Decision::Rejected(
                RejectionReason::DailyQuota {
                    limit: self.policy.daily_limit,
                }
                .into(),
            );
        }

        if let Some((report, distance_meters)) = self.find_duplicate(candidate, existing, now) {
            log::debug!(
                "Submission rejected: duplicate of {} at {distance_meters:.1}m",
                report.id
            );
            return Decision::Rejected(
                RejectionReason::Duplicate {
                    existing: report.id.clone(),
                    distance_meters,
                    radius_meters: self.policy.dedupe_radius_meters,
                    window: self.policy.dedupe_window,
                }
                .into(),
            );
        }

        Decision::Approved
    }

    /// Minutes left on the cooldown, rounded up, or `None` once it has
    /// elapsed.
    #[must_use]
    pub fn cooldown_remaining_minutes(
        &self,
        meta: &SubmissionMeta,
        now: DateTime<Utc>,
    ) -> Option<i64> {
        let last = meta.last_submission_time?;
        let elapsed = now - last;
        if elapsed >= self.policy.cooldown {
            return None;
        }
        let remaining_ms = (self.policy.cooldown - elapsed).num_milliseconds();
        Some((remaining_ms + 59_999) / 60_000)
    }

    fn find_duplicate<'a>(
        &self,
        candidate: Location,
        existing: &'a [Report],
        now: DateTime<Utc>,
    ) -> Option<(&'a Report, f64)> {
        existing
            .iter()
            .filter(|report| now - report.created_at <= self.policy.dedupe_window)
            .map(|report| (report, haversine_meters(candidate, report.location)))
            .find(|(_, distance)| *distance <= self.policy.dedupe_radius_meters)
    }
}

/// Returns `meta` updated for a successful submission at `now`.
///
/// `meta` must already be rolled to the current local day.
#[must_use]
pub fn record_submission(meta: SubmissionMeta, now: DateTime<Utc>) -> SubmissionMeta {
    SubmissionMeta {
        date_key: meta.date_key,
        count: meta.count.saturating_add(1),
        last_submission_time: Some(now),
    }
}

/// The device-local calendar day containing `now`.
#[must_use]
pub fn local_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
