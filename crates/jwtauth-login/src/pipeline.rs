//! Session-establishment pipeline.
//!
//! The host finalizes a login through several steps: pre-login hooks,
//! completing the session, issuing a session token, clearing lost-password
//! tokens, updating the last password confirmation, finishing a remembered
//! login. Here they are an ordered list run by one orchestrator. Each step
//! receives the login record by value and hands it back (possibly updated)
//! for the next step, or stops the pipeline with a [`StepError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jwtauth_login::pipeline::{CompleteLoginStep, LoginPipeline};
//! # use jwtauth_login::pipeline::{LoginData, LoginStep, StepResult};
//! # use jwtauth_login::host::HostSession;
//! # struct CreateSessionToken;
//! # impl LoginStep for CreateSessionToken {
//! #     fn name(&self) -> &'static str { "create_session_token" }
//! #     fn process(&self, data: LoginData, _: &mut dyn HostSession) -> StepResult { Ok(data) }
//! # }
//!
//! let pipeline = LoginPipeline::new()
//!     .with_step(CompleteLoginStep)
//!     .with_step(CreateSessionToken);
//!
//! assert_eq!(pipeline.step_names(), vec!["complete_login", "create_session_token"]);
//! ```

use crate::host::{HostSession, UserRecord};
use crate::request::{RequestContext, TargetPath};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Login record handed through the pipeline.
///
/// Built once per callback request and consumed by a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginData {
    /// Correlates log lines of one login attempt
    pub attempt_id: Uuid,

    /// User name the login is for
    pub username: String,

    /// Always empty: trust comes from the token signature
    pub password: String,

    /// Where the user goes afterwards
    pub redirect_url: TargetPath,

    /// Browser timezone (unknown on this path)
    pub timezone: String,

    /// Browser timezone offset (unknown on this path)
    pub timezone_offset: String,

    /// Resolved user, pre-populated before the pipeline runs
    pub user: Option<UserRecord>,

    /// Originating request
    pub request: RequestContext,
}

impl LoginData {
    /// Create a login record with an empty credential.
    pub fn new(request: RequestContext, username: impl Into<String>, redirect_url: TargetPath) -> Self {
        Self {
            attempt_id: Uuid::now_v7(),
            username: username.into(),
            password: String::new(),
            redirect_url,
            timezone: String::new(),
            timezone_offset: String::new(),
            user: None,
            request,
        }
    }

    /// Pre-populate the resolved user.
    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.user = Some(user);
        self
    }
}

/// Failure reported by a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StepError(pub String);

impl StepError {
    /// Create a step error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Result of a single step.
pub type StepResult = Result<LoginData, StepError>;

/// One step of the session-establishment pipeline.
pub trait LoginStep: Send + Sync {
    /// Stable step name, used in logs and failures.
    fn name(&self) -> &'static str;

    /// Run the step.
    fn process(&self, data: LoginData, session: &mut dyn HostSession) -> StepResult;
}

/// Result of a full pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every step succeeded.
    Success(LoginData),

    /// A step failed; later steps did not run.
    Failure {
        /// Name of the failing step
        step: &'static str,
        /// What went wrong
        error: StepError,
    },
}

impl PipelineOutcome {
    /// Whether the pipeline completed.
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }
}

/// Ordered list of login steps.
#[derive(Default)]
pub struct LoginPipeline {
    steps: Vec<Box<dyn LoginStep>>,
}

impl std::fmt::Debug for LoginPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginPipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}

impl LoginPipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Pipeline that only completes the login on the session.
    pub fn standard() -> Self {
        Self::new().with_step(CompleteLoginStep)
    }

    /// Append a step.
    pub fn with_step(mut self, step: impl LoginStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the pipeline has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order, stopping at the first failure.
    pub fn process(&self, data: LoginData, session: &mut dyn HostSession) -> PipelineOutcome {
        let attempt_id = data.attempt_id;
        let mut data = data;

        for step in &self.steps {
            debug!(attempt_id = %attempt_id, step = step.name(), "Running login step");
            data = match step.process(data, session) {
                Ok(next) => next,
                Err(error) => {
                    return PipelineOutcome::Failure {
                        step: step.name(),
                        error,
                    }
                }
            };
        }

        PipelineOutcome::Success(data)
    }
}

/// Logs the session in as the pre-populated user.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteLoginStep;

impl LoginStep for CompleteLoginStep {
    fn name(&self) -> &'static str {
        "complete_login"
    }

    fn process(&self, data: LoginData, session: &mut dyn HostSession) -> StepResult {
        let user = data
            .user
            .as_ref()
            .ok_or_else(|| StepError::new("login record has no user"))?;

        session.login_as(user);
        Ok(data)
    }
}
