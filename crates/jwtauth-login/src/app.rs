//! Application wiring.
//!
//! Builds every component from one validated [`JwtAuthConfig`]. The
//! configuration and the components derived from it are immutable and
//! shared read-only across requests.

use crate::config::{ConfigError, JwtAuthConfig};
use crate::controller::LoginController;
use crate::host::{HostSession, UserDirectory};
use crate::interceptor::LoginPageInterceptor;
use crate::pipeline::LoginPipeline;
use crate::redirect::RedirectUrlGenerator;
use crate::request::RequestContext;
use crate::response::Outcome;
use jwtauth_token::{Clock, SystemClock, TokenValidator};
use std::sync::Arc;

/// The auto-login application.
#[derive(Debug, Clone)]
pub struct JwtAuthApp {
    config: Arc<JwtAuthConfig>,
    validator: Arc<TokenValidator>,
    urls: Arc<RedirectUrlGenerator>,
    interceptor: LoginPageInterceptor,
}

impl JwtAuthApp {
    /// Build the application from configuration.
    pub fn new(config: JwtAuthConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build the application with a custom time source.
    pub fn with_clock(config: JwtAuthConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let validator = TokenValidator::new(&config.shared_secret, config.algorithm)
            .map_err(|e| ConfigError::InvalidValue {
                key: "SharedSecret".to_string(),
                message: e.to_string(),
            })?
            .with_leeway(config.leeway())
            .with_clock(clock);

        let urls = Arc::new(RedirectUrlGenerator::new(
            config.auto_login_trigger_uri.clone(),
            config.logout_confirmation_uri.clone(),
        ));
        let interceptor = LoginPageInterceptor::new(urls.clone(), config.login_path_prefix.clone());

        tracing::info!(
            login_path_prefix = %config.login_path_prefix,
            algorithm = ?config.algorithm,
            "JWT auto-login configured"
        );

        Ok(Self {
            config: Arc::new(config),
            validator: Arc::new(validator),
            urls,
            interceptor,
        })
    }

    /// Build the application from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(JwtAuthConfig::from_env()?)
    }

    /// Build the application from the host's system configuration.
    pub fn from_system_config(system_config: &serde_json::Value) -> Result<Self, ConfigError> {
        Self::new(JwtAuthConfig::from_system_config(system_config)?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtAuthConfig {
        &self.config
    }

    /// Token validator.
    pub fn validator(&self) -> &TokenValidator {
        &self.validator
    }

    /// URL generator.
    pub fn url_generator(&self) -> &RedirectUrlGenerator {
        &self.urls
    }

    /// Login page interceptor.
    pub fn interceptor(&self) -> &LoginPageInterceptor {
        &self.interceptor
    }

    /// Run the interceptor for a request.
    pub fn intercept(&self, request: &RequestContext, session: &mut dyn HostSession) -> Outcome {
        self.interceptor.intercept(request, session)
    }

    /// Callback controller bound to the host's directory and pipeline.
    pub fn login_controller(
        &self,
        directory: Arc<dyn UserDirectory>,
        pipeline: Arc<LoginPipeline>,
    ) -> LoginController {
        LoginController::new(self.validator.clone(), directory, pipeline)
    }
}
