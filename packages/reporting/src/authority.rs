//! Operator authorization for bypassing the submission guard.
//!
//! A [`BypassGrant`] can only be obtained from an [`OperatorAuthority`] that
//! was configured with the SHA-256 digest of the operator token. Issuing,
//! using, denying and revoking grants each produce a distinct line on the
//! [`AUDIT_TARGET`](crate::AUDIT_TARGET) log target.

use chrono::{DateTime, Utc};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

use crate::AUDIT_TARGET;

/// Errors from operator authorization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// No operator token digest is configured, so bypass is unavailable.
    #[error("operator bypass is not configured")]
    Disabled,

    /// The configured digest is not 32 bytes of hex.
    #[error("malformed operator token digest: {0}")]
    MalformedDigest(String),

    /// The operator name was empty.
    #[error("operator name is required")]
    MissingOperator,

    /// The presented token does not match the configured digest.
    #[error("operator token rejected")]
    InvalidToken,
}

/// Proof that a named operator was authorized to bypass the guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BypassGrant {
    id: String,
    operator: String,
    issued_at: DateTime<Utc>,
}

impl BypassGrant {
    /// Unique id of this grant, repeated on every audit line.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the operator the grant was issued to.
    #[must_use]
    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// When the grant was issued.
    #[must_use]
    pub const fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub(crate) fn record_use(&self, now: DateTime<Utc>) {
        log::warn!(
            target: AUDIT_TARGET,
            "bypass USED grant={} operator={} at={}",
            self.id,
            self.operator,
            now.to_rfc3339()
        );
    }
}

/// Issues [`BypassGrant`]s to operators presenting the configured token.
#[derive(Debug, Clone, Default)]
pub struct OperatorAuthority {
    token_digest: Option<[u8; 32]>,
}

/// Hex SHA-256 digest of an operator token, as stored in configuration.
#[must_use]
pub fn token_digest_hex(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

impl OperatorAuthority {
    /// An authority that denies every request.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { token_digest: None }
    }

    /// Builds an authority from a hex SHA-256 digest of the operator token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizationError::MalformedDigest`] if `digest` is not 64
    /// hex characters.
    pub fn from_hex_digest(digest: &str) -> Result<Self, AuthorizationError> {
        let bytes = hex::decode(digest.trim())
            .map_err(|e| AuthorizationError::MalformedDigest(e.to_string()))?;
        let token_digest: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            AuthorizationError::MalformedDigest(format!("expected 32 bytes, got {}", bytes.len()))
        })?;

        Ok(Self {
            token_digest: Some(token_digest),
        })
    }

    /// Whether a token digest is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.token_digest.is_some()
    }

    /// Checks `token` and issues a grant to `operator`.
    ///
    /// # Errors
    ///
    /// Returns an error if bypass is not configured, the operator name is
    /// empty, or the token does not match.
    pub fn authorize(
        &self,
        operator: &str,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<BypassGrant, AuthorizationError> {
        let Some(expected) = &self.token_digest else {
            log::warn!(
                target: AUDIT_TARGET,
                "bypass DENIED operator={operator} reason=disabled"
            );
            return Err(AuthorizationError::Disabled);
        };

        let operator = operator.trim();
        if operator.is_empty() {
            return Err(AuthorizationError::MissingOperator);
        }

        let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
        if !digests_match(expected, &presented) {
            log::warn!(
                target: AUDIT_TARGET,
                "bypass DENIED operator={operator} reason=invalid_token"
            );
            return Err(AuthorizationError::InvalidToken);
        }

        let grant = BypassGrant {
            id: uuid::Uuid::new_v4().to_string(),
            operator: operator.to_string(),
            issued_at: now,
        };

        log::warn!(
            target: AUDIT_TARGET,
            "bypass ACTIVATED grant={} operator={} at={}",
            grant.id,
            grant.operator,
            now.to_rfc3339()
        );

        Ok(grant)
    }

    /// Ends a grant.
    pub fn revoke(&self, grant: BypassGrant, now: DateTime<Utc>) {
        log::info!(
            target: AUDIT_TARGET,
            "bypass DEACTIVATED grant={} operator={} at={}",
            grant.id,
            grant.operator,
            now.to_rfc3339()
        );
    }
}

fn digests_match(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
