//! Configuration for the auto-login flow.
//!
//! Loaded once at startup and immutable afterwards. Values come either from
//! the host platform's system configuration (the `jwtauth` object, keyed the
//! way the host stores it) or from environment variables.

use jwtauth_token::JwtAlgorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder in the auto-login trigger template that receives the
/// URL-encoded target path.
pub const TARGET_PATH_PLACEHOLDER: &str = "__TARGET_PATH__";

/// Default login surface.
pub const DEFAULT_LOGIN_PATH_PREFIX: &str = "/login";

/// Key of the auto-login section in the host's system configuration.
pub const SYSTEM_CONFIG_KEY: &str = "jwtauth";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required value is missing.
    #[error("Missing required configuration value: {0}")]
    MissingValue(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Auto-login configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct JwtAuthConfig {
    /// Secret shared with the Identity Provider for token signatures.
    pub shared_secret: String,

    /// Identity Provider URL that starts an auto-login. May contain
    /// [`TARGET_PATH_PLACEHOLDER`].
    pub auto_login_trigger_uri: String,

    /// Identity Provider URL confirming a logout.
    pub logout_confirmation_uri: String,

    /// Path prefix of the host's login page.
    #[serde(default = "default_login_path_prefix")]
    pub login_path_prefix: String,

    /// Token signature algorithm.
    #[serde(default)]
    pub algorithm: JwtAlgorithm,

    /// Tolerated clock skew in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

fn default_login_path_prefix() -> String {
    DEFAULT_LOGIN_PATH_PREFIX.to_string()
}

impl std::fmt::Debug for JwtAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtAuthConfig")
            .field("shared_secret", &"[REDACTED]")
            .field("auto_login_trigger_uri", &self.auto_login_trigger_uri)
            .field("logout_confirmation_uri", &self.logout_confirmation_uri)
            .field("login_path_prefix", &self.login_path_prefix)
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

impl JwtAuthConfig {
    /// Create a configuration with defaults for the optional values.
    pub fn new(
        shared_secret: impl Into<String>,
        auto_login_trigger_uri: impl Into<String>,
        logout_confirmation_uri: impl Into<String>,
    ) -> Self {
        Self {
            shared_secret: shared_secret.into(),
            auto_login_trigger_uri: auto_login_trigger_uri.into(),
            logout_confirmation_uri: logout_confirmation_uri.into(),
            login_path_prefix: default_login_path_prefix(),
            algorithm: JwtAlgorithm::default(),
            leeway_secs: 0,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JWTAUTH_SHARED_SECRET`: shared secret (required)
    /// - `JWTAUTH_AUTO_LOGIN_TRIGGER_URI`: trigger URL template (required)
    /// - `JWTAUTH_LOGOUT_CONFIRMATION_URI`: logout confirmation URL (required)
    /// - `JWTAUTH_LOGIN_PATH_PREFIX`: login surface (default: /login)
    /// - `JWTAUTH_ALGORITHM`: HS256, HS384 or HS512 (default: HS256)
    /// - `JWTAUTH_LEEWAY_SECS`: clock skew tolerance (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingValue(key.to_string()));

        let mut config = Self::new(
            required("JWTAUTH_SHARED_SECRET")?,
            required("JWTAUTH_AUTO_LOGIN_TRIGGER_URI")?,
            required("JWTAUTH_LOGOUT_CONFIRMATION_URI")?,
        );

        if let Some(prefix) = lookup("JWTAUTH_LOGIN_PATH_PREFIX") {
            config.login_path_prefix = prefix;
        }
        if let Some(alg) = lookup("JWTAUTH_ALGORITHM") {
            config.algorithm = JwtAlgorithm::parse(&alg).ok_or_else(|| ConfigError::InvalidValue {
                key: "JWTAUTH_ALGORITHM".to_string(),
                message: format!("unsupported algorithm '{}'", alg),
            })?;
        }
        if let Some(leeway) = lookup("JWTAUTH_LEEWAY_SECS") {
            config.leeway_secs = leeway.parse().map_err(|_| ConfigError::InvalidValue {
                key: "JWTAUTH_LEEWAY_SECS".to_string(),
                message: format!("expected a number of seconds, got '{}'", leeway),
            })?;
        }

        Ok(config)
    }

    /// Read the `jwtauth` section of the host's system configuration.
    pub fn from_system_config(system_config: &serde_json::Value) -> Result<Self, ConfigError> {
        let section = system_config
            .get(SYSTEM_CONFIG_KEY)
            .ok_or_else(|| ConfigError::MissingValue(SYSTEM_CONFIG_KEY.to_string()))?;

        serde_json::from_value(section.clone()).map_err(|e| ConfigError::InvalidValue {
            key: SYSTEM_CONFIG_KEY.to_string(),
            message: e.to_string(),
        })
    }

    /// Check the configuration before the flow is wired up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shared_secret.is_empty() {
            return Err(ConfigError::MissingValue("SharedSecret".to_string()));
        }
        if self.auto_login_trigger_uri.trim().is_empty() {
            return Err(ConfigError::MissingValue("AutoLoginTriggerUri".to_string()));
        }
        if self.logout_confirmation_uri.trim().is_empty() {
            return Err(ConfigError::MissingValue("LogoutConfirmationUri".to_string()));
        }
        if !self.login_path_prefix.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                key: "LoginPathPrefix".to_string(),
                message: "must start with '/'".to_string(),
            });
        }
        if !self.auto_login_trigger_uri.contains(TARGET_PATH_PLACEHOLDER) {
            tracing::warn!(
                placeholder = TARGET_PATH_PLACEHOLDER,
                "Auto-login trigger URI has no target path placeholder; users will not return to their original page"
            );
        }
        Ok(())
    }

    /// Tolerated clock skew as a Duration.
    pub fn leeway(&self) -> chrono::Duration {
        let secs = i64::try_from(self.leeway_secs).unwrap_or(i64::MAX).min(i64::MAX / 1000);
        chrono::Duration::seconds(secs)
    }
}
