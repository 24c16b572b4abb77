//! Report creation, editing and expiry.
//!
//! Per report the lifecycle is `Active <-> Inactive -> Expired`. `Expired` is
//! never stored; it is a predicate over time, realized by [`ReportLifecycle::prune`]
//! removing the report from the visible set.

use std::str::FromStr as _;

use chrono::{DateTime, Utc};
use firemap_report_models::{
    DEFAULT_REPORTER, Location, Report, ReportId, ReportType, Severity,
};

use crate::{
    MAX_CONTACT_INFO_CHARS, MAX_DESCRIPTION_CHARS, MIN_DESCRIPTION_CHARS, ReportingPolicy,
    ValidationError,
};

/// Raw fields collected from a report form.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFields {
    /// Incident kind, e.g. `"fire"` or `"road_closure"`.
    pub report_type: String,
    /// Severity, e.g. `"high"`.
    pub severity: String,
    /// Free-text description.
    pub description: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Optional contact info.
    pub contact_info: Option<String>,
    /// Display label; defaults to [`DEFAULT_REPORTER`].
    pub reporter: Option<String>,
}

/// Field changes for an existing report. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPatch {
    /// New incident kind.
    pub report_type: Option<String>,
    /// New severity.
    pub severity: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Mark the incident ongoing or resolved.
    pub is_active: Option<bool>,
}

/// Where a report is in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportState {
    /// Ongoing and within its TTL.
    Active,
    /// Marked resolved and still within the grace period.
    Inactive,
    /// Due for removal.
    Expired,
}

/// Result of [`ReportLifecycle::prune`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pruned {
    /// Reports still visible, in their original order.
    pub survivors: Vec<Report>,
    /// Ids of the reports that expired.
    pub removed: Vec<ReportId>,
}

/// Creates, edits and expires reports under a [`ReportingPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportLifecycle {
    policy: ReportingPolicy,
}

impl ReportLifecycle {
    /// Creates a lifecycle using `policy`'s TTLs.
    #[must_use]
    pub const fn new(policy: ReportingPolicy) -> Self {
        Self { policy }
    }

    /// Validates `fields` without building a report.
    ///
    /// Returns the position so the submission guard can be consulted before
    /// anything is created.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for the first malformed field.
    pub fn check(&self, fields: &ReportFields) -> Result<Location, ValidationError> {
        parse_report_type(&fields.report_type)?;
        parse_severity(&fields.severity)?;
        validate_description(&fields.description)?;
        validate_contact_info(fields.contact_info.as_deref())?;
        Ok(Location::new(fields.latitude, fields.longitude)?)
    }

    /// Builds a new active report stamped at `now`.
    ///
    /// Performs no gating; callers must have an approval from the
    /// submission guard first.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if any field is malformed.
    pub fn create(
        &self,
        fields: ReportFields,
        now: DateTime<Utc>,
    ) -> Result<Report, ValidationError> {
        let report_type = parse_report_type(&fields.report_type)?;
        let severity = parse_severity(&fields.severity)?;
        let description = validate_description(&fields.description)?;
        let contact_info = validate_contact_info(fields.contact_info.as_deref())?;
        let location = Location::new(fields.latitude, fields.longitude)?;

        let reporter = fields
            .reporter
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REPORTER.to_string());

        let report = Report {
            id: ReportId::generate(),
            report_type,
            severity,
            description,
            location,
            contact_info,
            reporter,
            created_at: now,
            last_updated: now,
            is_active: true,
        };

        log::debug!(
            "Created {} report {} ({})",
            report.report_type,
            report.id,
            report.severity
        );

        Ok(report)
    }

    /// Returns `report` with `patch` applied and `last_updated` set to `now`.
    ///
    /// `id`, `created_at`, location and contact info never change. If `now`
    /// is earlier than `created_at` the update is stamped at `created_at`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if a patched field is malformed; the
    /// input report is left untouched.
    pub fn update(
        &self,
        report: &Report,
        patch: ReportPatch,
        now: DateTime<Utc>,
    ) -> Result<Report, ValidationError> {
        let report_type = patch
            .report_type
            .as_deref()
            .map(parse_report_type)
            .transpose()?
            .unwrap_or(report.report_type);
        let severity = patch
            .severity
            .as_deref()
            .map(parse_severity)
            .transpose()?
            .unwrap_or(report.severity);
        let description = match patch.description.as_deref() {
            Some(description) => validate_description(description)?,
            None => validate_description(&report.description)?,
        };
        let is_active = patch.is_active.unwrap_or(report.is_active);

        if report.is_active && !is_active {
            log::info!("Report {} marked no longer active", report.id);
        } else if !report.is_active && is_active {
            log::info!("Report {} re-activated", report.id);
        }

        Ok(Report {
            report_type,
            severity,
            description,
            is_active,
            last_updated: now.max(report.created_at),
            ..report.clone()
        })
    }

    /// Whether `report` should no longer be visible at `now`.
    ///
    /// Inactive reports expire once the grace period since their last update
    /// has passed. Active reports expire once the TTL since their original
    /// creation has passed; editing does not extend it.
    #[must_use]
    pub fn is_expired(&self, report: &Report, now: DateTime<Utc>) -> bool {
        if report.is_active {
            now - report.created_at > self.policy.active_ttl
        } else {
            now - report.last_updated > self.policy.inactive_grace
        }
    }

    /// The last instant at which `report` is still visible, absent further
    /// edits.
    #[must_use]
    pub fn visible_until(&self, report: &Report) -> DateTime<Utc> {
        if report.is_active {
            report.created_at + self.policy.active_ttl
        } else {
            report.last_updated + self.policy.inactive_grace
        }
    }

    /// Lifecycle state of `report` at `now`.
    #[must_use]
    pub fn state(&self, report: &Report, now: DateTime<Utc>) -> ReportState {
        if self.is_expired(report, now) {
            ReportState::Expired
        } else if report.is_active {
            ReportState::Active
        } else {
            ReportState::Inactive
        }
    }

    /// Splits `reports` into those still visible at `now` and the ids of
    /// those that expired. Pruning an already-pruned set changes nothing.
    #[must_use]
    pub fn prune(&self, reports: Vec<Report>, now: DateTime<Utc>) -> Pruned {
        let (expired, survivors): (Vec<_>, Vec<_>) = reports
            .into_iter()
            .partition(|report| self.is_expired(report, now));

        let removed: Vec<ReportId> = expired.into_iter().map(|report| report.id).collect();

        if !removed.is_empty() {
            log::info!("Pruned {} expired report(s)", removed.len());
        }

        Pruned { survivors, removed }
    }
}

fn parse_report_type(value: &str) -> Result<ReportType, ValidationError> {
    ReportType::from_str(value.trim())
        .map_err(|_| ValidationError::UnknownReportType(value.to_string()))
}

fn parse_severity(value: &str) -> Result<Severity, ValidationError> {
    Severity::from_str(value.trim())
        .map_err(|_| ValidationError::UnknownSeverity(value.to_string()))
}

fn validate_description(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooShort {
            len,
            min: MIN_DESCRIPTION_CHARS,
        });
    }
    if len > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooLong {
            len,
            max: MAX_DESCRIPTION_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

fn validate_contact_info(value: Option<&str>) -> Result<Option<String>, ValidationError> {
    let Some(trimmed) = value.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let len = trimmed.chars().count();
    if len > MAX_CONTACT_INFO_CHARS {
        return Err(ValidationError::ContactInfoTooLong {
            len,
            max: MAX_CONTACT_INFO_CHARS,
        });
    }
    Ok(Some(trimmed.to_string()))
}
