//! Login token validation
//!
//! This module verifies tokens handed back by the Identity Provider using the
//! jsonwebtoken crate. Only HMAC algorithms are supported: the Identity
//! Provider and this system share a single secret.
//!
//! The validity window is checked against an injectable [`Clock`] rather than
//! by jsonwebtoken itself, which keeps validation a pure function of
//! `(token, secret, now)`.

use crate::claims::{LoginClaims, IDENTITY_CLAIM};
use crate::clock::{Clock, SystemClock};
use crate::error::{TokenError, TokenResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::Arc;

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    #[default]
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl JwtAlgorithm {
    /// Parse an algorithm name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "HS256" => Some(JwtAlgorithm::HS256),
            "HS384" => Some(JwtAlgorithm::HS384),
            "HS512" => Some(JwtAlgorithm::HS512),
            _ => None,
        }
    }
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// Validates auto-login tokens and extracts the identity they carry.
pub struct TokenValidator {
    algorithm: JwtAlgorithm,
    leeway: Duration,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenValidator")
            .field("algorithm", &self.algorithm)
            .field("leeway", &self.leeway)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl TokenValidator {
    /// Create a validator for the given shared secret and algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Config`] if the secret is empty.
    pub fn new(secret: &str, algorithm: JwtAlgorithm) -> TokenResult<Self> {
        if secret.is_empty() {
            return Err(TokenError::Config("Shared secret must not be empty".to_string()));
        }

        Ok(Self {
            algorithm,
            leeway: Duration::zero(),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            clock: Arc::new(SystemClock),
        })
    }

    /// Create with a simple secret (HS256).
    pub fn with_secret(secret: &str) -> TokenResult<Self> {
        Self::new(secret, JwtAlgorithm::HS256)
    }

    /// Tolerate clock skew between this host and the Identity Provider.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Configured algorithm.
    pub fn algorithm(&self) -> JwtAlgorithm {
        self.algorithm
    }

    /// Validate a token against the validator's clock.
    pub fn validate(&self, token: &str) -> TokenResult<LoginClaims> {
        self.validate_at(token, self.clock.now())
    }

    /// Validate a token as of `now`.
    ///
    /// Checks, in order: structure and signature, expiration, not-before,
    /// presence of the identity claim.
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<LoginClaims> {
        let mut validation = Validation::new(self.algorithm.into());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "nbf".to_string()]);

        let token_data: TokenData<LoginClaims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(claim.clone()),
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let claims = token_data.claims;

        if claims.is_expired_at(now, self.leeway) {
            return Err(TokenError::Expired);
        }
        if claims.is_premature_at(now, self.leeway) {
            return Err(TokenError::NotYetValid);
        }
        if claims.uid.is_none() {
            return Err(TokenError::MissingClaim(IDENTITY_CLAIM.to_string()));
        }

        Ok(claims)
    }

    /// Validate a token and return the identity it was issued for.
    ///
    /// Every failure yields `None`; callers treat that as "start the
    /// auto-login cycle over". The reason is logged at debug level.
    pub fn parse_validated_token(&self, token: &str) -> Option<String> {
        self.parse_validated_token_at(token, self.clock.now())
    }

    /// [`Self::parse_validated_token`] as of `now`.
    pub fn parse_validated_token_at(&self, token: &str, now: DateTime<Utc>) -> Option<String> {
        match self.validate_at(token, now) {
            Ok(claims) => claims.uid,
            Err(e) => {
                tracing::debug!(
                    reason = e.reason(),
                    error = %e,
                    token = %token_fingerprint(token),
                    "Rejected login token"
                );
                None
            }
        }
    }
}

/// Short, non-reversible identifier for a token, safe to put in logs.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut encoded = URL_SAFE_NO_PAD.encode(digest);
    encoded.truncate(12);
    encoded
}
