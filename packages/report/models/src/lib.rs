#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Community incident report types and device submission metadata.
//!
//! These are the shapes exchanged between the reporting core, the device-local
//! store, and the remote feed. The JSON wire format keeps the field names the
//! map frontend has always written (`timestamp`, `originalTimestamp`,
//! `lastUpdated`, `isActive`, `lat`, `lng`) so that previously stored reports
//! keep loading.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Reporter label used when a submission does not provide one.
pub const DEFAULT_REPORTER: &str = "Community User";

/// What kind of incident a community report describes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ReportType {
    /// Visible flames or an active fire front
    Fire,
    /// Smoke without a confirmed fire
    Smoke,
    /// Evacuation order or notice
    Evacuation,
    /// Road closed because of the incident
    RoadClosure,
}

impl ReportType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Fire, Self::Smoke, Self::Evacuation, Self::RoadClosure]
    }

    /// Upper-case label shown on map popups (e.g. `ROAD CLOSURE`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fire => "FIRE",
            Self::Smoke => "SMOKE",
            Self::Evacuation => "EVACUATION",
            Self::RoadClosure => "ROAD CLOSURE",
        }
    }
}

/// Reported severity, ordered `Low < Moderate < High < Extreme`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    /// Minor, localized impact
    Low,
    /// Noticeable impact, no immediate danger
    Moderate,
    /// Dangerous, be ready to leave
    High,
    /// Immediate danger to life
    Extreme,
}

impl Severity {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Moderate, Self::High, Self::Extreme]
    }

    /// Radius of the circle drawn for a report of this severity, in meters.
    #[must_use]
    pub const fn marker_radius_meters(self) -> u32 {
        match self {
            Self::Low => 120,
            Self::Moderate => 250,
            Self::High => 500,
            Self::Extreme => 800,
        }
    }
}

/// Safety guidance attached to a report when it is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Advisory {
    /// Move to designated evacuation centers and follow emergency services.
    #[strum(serialize = "EVACUATION INFORMATION")]
    Evacuation,
    /// Stay alert and keep an emergency kit ready.
    #[strum(serialize = "SAFETY ADVISORY")]
    Safety,
}

impl Advisory {
    /// Picks the advisory for a report, if any.
    ///
    /// Evacuation reports and extreme severity get evacuation guidance; high
    /// severity gets a safety advisory; everything else gets nothing.
    #[must_use]
    pub fn for_incident(report_type: ReportType, severity: Severity) -> Option<Self> {
        if report_type == ReportType::Evacuation || severity == Severity::Extreme {
            Some(Self::Evacuation)
        } else if severity == Severity::High {
            Some(Self::Safety)
        } else {
            None
        }
    }

    /// Bullet points shown under the advisory heading.
    #[must_use]
    pub const fn guidance(self) -> &'static [&'static str] {
        match self {
            Self::Evacuation => &[
                "Move to designated evacuation centers",
                "Follow local emergency services guidance",
                "Monitor emergency radio/alerts",
                "Emergency Hotline: 911",
            ],
            Self::Safety => &[
                "Stay alert and prepared to evacuate",
                "Keep emergency kit ready",
                "Monitor local news and alerts",
            ],
        }
    }
}

/// Moderation state a report carries when it passes through a gated public
/// feed. Independent of the report's active/inactive lifecycle.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModerationStatus {
    /// Awaiting review
    Pending,
    /// Visible on the public feed
    Approved,
    /// Hidden by a moderator
    Rejected,
    /// Flagged for a second look
    UnderReview,
}

impl ModerationStatus {
    /// Whether a record with this status may be shown publicly.
    #[must_use]
    pub const fn is_public(self) -> bool {
        matches!(self, Self::Approved)
    }
}

/// Error returned when a coordinate pair is not a valid WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationError {
    /// Latitude was not finite or outside `[-90, 90]`.
    Latitude(f64),
    /// Longitude was not finite or outside `[-180, 180]`.
    Longitude(f64),
}

impl std::fmt::Display for LocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude(value) => {
                write!(f, "invalid latitude {value}: expected -90 to 90")
            }
            Self::Longitude(value) => {
                write!(f, "invalid longitude {value}: expected -180 to 180")
            }
        }
    }
}

impl std::error::Error for LocationError {}

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Location {
    /// Creates a location after range-checking both coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if either coordinate is non-finite or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Opaque, immutable report identifier.
///
/// New reports get a UUID. Reports written by older frontends used the
/// numeric submission time as their id; those still deserialize and are
/// carried as their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawReportId")]
pub struct ReportId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReportId {
    Text(String),
    Number(u64),
}

impl From<RawReportId> for ReportId {
    fn from(raw: RawReportId) -> Self {
        match raw {
            RawReportId::Text(text) => Self(text),
            RawReportId::Number(number) => Self(number.to_string()),
        }
    }
}

impl ReportId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReportId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ReportId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ReportId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single community-submitted incident report.
///
/// `last_updated >= created_at` always holds for values produced by the
/// reporting lifecycle and for values read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReportRecord", into = "ReportRecord")]
pub struct Report {
    /// Assigned at creation, never changes.
    pub id: ReportId,
    /// Kind of incident.
    pub report_type: ReportType,
    /// Reported severity.
    pub severity: Severity,
    /// Free-text description.
    pub description: String,
    /// Where the incident is.
    pub location: Location,
    /// Optional way to reach the reporter.
    pub contact_info: Option<String>,
    /// Display label of the reporter (not an identity).
    pub reporter: String,
    /// Original submission time, never changes.
    pub created_at: DateTime<Utc>,
    /// Time of the last edit; equals `created_at` until the first edit.
    pub last_updated: DateTime<Utc>,
    /// Whether the incident is still believed to be ongoing.
    pub is_active: bool,
}

/// JSON shape of a stored report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRecord {
    id: ReportId,
    #[serde(rename = "type")]
    report_type: ReportType,
    severity: Severity,
    description: String,
    lat: f64,
    lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contact_info: Option<String>,
    #[serde(default = "default_reporter")]
    reporter: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    original_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    is_active: Option<bool>,
}

fn default_reporter() -> String {
    DEFAULT_REPORTER.to_string()
}

impl TryFrom<ReportRecord> for Report {
    type Error = LocationError;

    fn try_from(record: ReportRecord) -> Result<Self, Self::Error> {
        let location = Location::new(record.lat, record.lng)?;
        let created_at = record.original_timestamp.unwrap_or(record.timestamp);
        let last_updated = record.last_updated.unwrap_or(created_at).max(created_at);

        Ok(Self {
            id: record.id,
            report_type: record.report_type,
            severity: record.severity,
            description: record.description,
            location,
            contact_info: record.contact_info.filter(|c| !c.trim().is_empty()),
            reporter: record.reporter,
            created_at,
            last_updated,
            is_active: record.is_active.unwrap_or(true),
        })
    }
}

impl From<Report> for ReportRecord {
    fn from(report: Report) -> Self {
        Self {
            id: report.id,
            report_type: report.report_type,
            severity: report.severity,
            description: report.description,
            lat: report.location.latitude,
            lng: report.location.longitude,
            contact_info: report.contact_info,
            reporter: report.reporter,
            timestamp: report.created_at,
            original_timestamp: Some(report.created_at),
            last_updated: Some(report.last_updated),
            is_active: Some(report.is_active),
        }
    }
}

impl Report {
    /// Whether the report has been edited since it was created.
    #[must_use]
    pub fn was_edited(&self) -> bool {
        self.last_updated != self.created_at
    }
}

/// Per-device anti-abuse counter for one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMeta {
    /// Local calendar date this counter applies to.
    pub date_key: NaiveDate,
    /// Successful submissions so far on `date_key`.
    pub count: u32,
    /// Most recent successful submission. Stored as epoch milliseconds,
    /// `0` meaning none.
    #[serde(rename = "lastTime", default, with = "epoch_millis_or_zero")]
    pub last_submission_time: Option<DateTime<Utc>>,
}

impl SubmissionMeta {
    /// A counter with no submissions for `day`.
    #[must_use]
    pub const fn fresh(day: NaiveDate) -> Self {
        Self {
            date_key: day,
            count: 0,
            last_submission_time: None,
        }
    }

    /// Returns this counter as seen on `today`.
    ///
    /// A counter from any other day is replaced by a fresh one, so the daily
    /// quota and the cooldown both start over on date rollover.
    #[must_use]
    pub fn rolled_to(self, today: NaiveDate) -> Self {
        if self.date_key == today {
            self
        } else {
            Self::fresh(today)
        }
    }
}

mod epoch_millis_or_zero {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.map_or(0, |t| t.timestamp_millis()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let millis = Option::<i64>::deserialize(deserializer)?.unwrap_or(0);
        if millis == 0 {
            return Ok(None);
        }
        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp {millis} out of range")))
    }
}
