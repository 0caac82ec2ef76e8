//! Login token claims
//!
//! The Identity Provider signs a small payload: the identity (`uid`) and the
//! validity window (`nbf`, `exp`). Anything else it chooses to include is
//! kept in `custom` and ignored by validation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Claim name carrying the identity the token was issued for.
pub const IDENTITY_CLAIM: &str = "uid";

/// Claims carried by an auto-login token.
///
/// `exp` and `nbf` are mandatory: a token without a validity window fails to
/// decode. `uid` is optional at the type level so that its absence can be
/// reported as [`crate::TokenError::MissingClaim`] rather than a decode
/// failure.
///
/// # Example
///
/// ```rust
/// use chrono::{Duration, Utc};
/// use jwtauth_token::LoginClaims;
///
/// let now = Utc::now();
/// let claims = LoginClaims::for_identity("alice", now, Duration::minutes(5));
/// assert_eq!(claims.identity(), Some("alice"));
/// assert!(claims.is_active_at(now, Duration::zero()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginClaims {
    /// Identity (user name on the host platform)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Extra claims set by the Identity Provider
    #[serde(default, flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl LoginClaims {
    /// Create claims for an identity, valid from `now` for `duration`.
    pub fn for_identity(uid: impl Into<String>, now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            uid: Some(uid.into()),
            exp: (now + duration).timestamp(),
            nbf: now.timestamp(),
            iat: Some(now.timestamp()),
            custom: HashMap::new(),
        }
    }

    /// The identity claim, if present.
    pub fn identity(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Get expiration as DateTime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Get not-before as DateTime.
    pub fn not_before(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.nbf, 0).unwrap_or_default()
    }

    /// Whether the expiration time has passed at `now`.
    ///
    /// A token is expired from the second named by `exp` onwards.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        now.timestamp() >= self.exp.saturating_add(leeway.num_seconds())
    }

    /// Whether the not-before time is still in the future at `now`.
    pub fn is_premature_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        now.timestamp().saturating_add(leeway.num_seconds()) < self.nbf
    }

    /// Whether `now` lies inside the validity window.
    pub fn is_active_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        !self.is_expired_at(now, leeway) && !self.is_premature_at(now, leeway)
    }
}
