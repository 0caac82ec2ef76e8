//! # JWT Auth Token
//!
//! Validation of the signed tokens an Identity Provider hands back to
//! complete an auto-login.
//!
//! ## Overview
//!
//! A token is trusted only after all of these pass:
//! - **Signature**: HMAC over the shared secret (HS256 by default)
//! - **Expiration**: `exp` lies in the future
//! - **Not before**: `nbf` has been reached
//! - **Identity**: the `uid` claim is present
//!
//! The validator never propagates an error to the login flow.
//! [`TokenValidator::parse_validated_token`] returns `None` on any failure, which
//! the caller answers by restarting the auto-login cycle.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jwtauth_token::TokenValidator;
//!
//! let validator = TokenValidator::with_secret("shared-secret").unwrap();
//!
//! match validator.parse_validated_token("eyJ...") {
//!     Some(uid) => println!("token issued for {uid}"),
//!     None => println!("start over"),
//! }
//! ```

pub mod claims;
pub mod clock;
pub mod error;
pub mod jwt;

// Re-export main types
pub use claims::{LoginClaims, IDENTITY_CLAIM};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{TokenError, TokenResult};
pub use jwt::{token_fingerprint, JwtAlgorithm, TokenValidator};
