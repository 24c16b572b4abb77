//! TOML configuration for the `firemap` binary.
//!
//! Every key is optional. A missing file path means "use defaults".
//!
//! ```toml
//! data_dir = "data"
//! feed_path = "data/feed.json"
//!
//! [policy]
//! cooldown_minutes = 30
//! daily_limit = 3
//!
//! [operator]
//! token_sha256 = "..."
//! ```

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use firemap_reporting::authority::{AuthorizationError, OperatorAuthority};
use firemap_reporting::{
    ACTIVE_TTL_HOURS, COOLDOWN_MINUTES, DAILY_LIMIT, DEDUPE_RADIUS_METERS, DEDUPE_WINDOW_MINUTES,
    INACTIVE_GRACE_MINUTES, ReportingPolicy,
};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "FIREMAP_CONFIG";

/// Environment variable holding the operator token for `--bypass`.
pub const OPERATOR_TOKEN_ENV: &str = "FIREMAP_OPERATOR_TOKEN";

/// Default data directory, relative to the working directory.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Longest configurable duration of any policy window.
pub const MAX_POLICY_DAYS: u32 = 3650;

/// Errors from loading or interpreting the config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A policy value is out of range.
    #[error("invalid policy: {0}")]
    Policy(String),

    /// The operator section is unusable.
    #[error(transparent)]
    Operator(#[from] AuthorizationError),
}

/// Top-level config document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FiremapConfig {
    /// Directory holding the device's reports and submission meta.
    pub data_dir: PathBuf,
    /// Shared feed file. Reports stay on this device when unset.
    pub feed_path: Option<PathBuf>,
    /// Guard and lifecycle thresholds.
    pub policy: PolicyConfig,
    /// Operator bypass settings.
    pub operator: OperatorConfig,
}

impl Default for FiremapConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            feed_path: None,
            policy: PolicyConfig::default(),
            operator: OperatorConfig::default(),
        }
    }
}

/// `[policy]` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Minutes between two submissions.
    pub cooldown_minutes: u32,
    /// Submissions per local day.
    pub daily_limit: u32,
    /// Inclusive duplicate radius.
    pub dedupe_radius_meters: f64,
    /// Inclusive duplicate look-back.
    pub dedupe_window_minutes: u32,
    /// Lifetime of an active report.
    pub active_ttl_hours: u32,
    /// Lifetime of a resolved report after its last edit.
    pub inactive_grace_minutes: u32,
}

impl Default for PolicyConfig {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn default() -> Self {
        Self {
            cooldown_minutes: COOLDOWN_MINUTES as u32,
            daily_limit: DAILY_LIMIT,
            dedupe_radius_meters: DEDUPE_RADIUS_METERS,
            dedupe_window_minutes: DEDUPE_WINDOW_MINUTES as u32,
            active_ttl_hours: ACTIVE_TTL_HOURS as u32,
            inactive_grace_minutes: INACTIVE_GRACE_MINUTES as u32,
        }
    }
}

impl PolicyConfig {
    /// Converts to the policy used by the guard and lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Policy`] if the duplicate radius is negative or
    /// not finite, if the active TTL is zero, or if any window is longer
    /// than [`MAX_POLICY_DAYS`].
    pub fn to_policy(&self) -> Result<ReportingPolicy, ConfigError> {
        if !self.dedupe_radius_meters.is_finite() || self.dedupe_radius_meters < 0.0 {
            return Err(ConfigError::Policy(format!(
                "dedupe_radius_meters must be a non-negative number (got {})",
                self.dedupe_radius_meters
            )));
        }
        if self.active_ttl_hours == 0 {
            return Err(ConfigError::Policy(
                "active_ttl_hours must be at least 1".to_string(),
            ));
        }

        let max_hours = MAX_POLICY_DAYS * 24;
        let max_minutes = max_hours * 60;
        for (key, value, max) in [
            ("cooldown_minutes", self.cooldown_minutes, max_minutes),
            ("dedupe_window_minutes", self.dedupe_window_minutes, max_minutes),
            ("active_ttl_hours", self.active_ttl_hours, max_hours),
            ("inactive_grace_minutes", self.inactive_grace_minutes, max_minutes),
        ] {
            if value > max {
                return Err(ConfigError::Policy(format!(
                    "{key} must be at most {max} ({MAX_POLICY_DAYS} days, got {value})"
                )));
            }
        }

        Ok(ReportingPolicy {
            cooldown: TimeDelta::minutes(i64::from(self.cooldown_minutes)),
            daily_limit: self.daily_limit,
            dedupe_radius_meters: self.dedupe_radius_meters,
            dedupe_window: TimeDelta::minutes(i64::from(self.dedupe_window_minutes)),
            active_ttl: TimeDelta::hours(i64::from(self.active_ttl_hours)),
            inactive_grace: TimeDelta::minutes(i64::from(self.inactive_grace_minutes)),
        })
    }
}

/// `[operator]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperatorConfig {
    /// Hex SHA-256 of the operator token. Bypass is disabled when unset.
    pub token_sha256: Option<String>,
}

impl OperatorConfig {
    /// Builds the authority that checks bypass requests.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Operator`] if the digest is malformed.
    pub fn authority(&self) -> Result<OperatorAuthority, ConfigError> {
        match self.token_sha256.as_deref().map(str::trim) {
            Some(digest) if !digest.is_empty() => Ok(OperatorAuthority::from_hex_digest(digest)?),
            _ => Ok(OperatorAuthority::disabled()),
        }
    }
}

impl FiremapConfig {
    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `source` is not a valid config.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Loads the config at `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            log::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::debug!("Loaded config from {}", path.display());
        Self::from_toml(&source)
    }
}
