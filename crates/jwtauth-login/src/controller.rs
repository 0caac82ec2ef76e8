//! Return leg of the auto-login cycle.
//!
//! The Identity Provider sends the browser back to the callback endpoint with
//! a signed token and the target path. [`LoginController::complete_login`]
//! turns a verified token into exactly one logged-in session on the host:
//!
//! 1. Invalid token: redirect to `/`, which restarts the cycle.
//! 2. Sanitize the target path.
//! 3. Unknown user: fatal, no redirect (it would loop forever).
//! 4. Session already belongs to the user: redirect, nothing else.
//! 5. Session belongs to someone else: log them out first.
//! 6. Run the login pipeline with the user pre-populated and no password.
//! 7. Pipeline failure: fatal.
//! 8. Redirect to the target path.

use crate::error::{LoginError, LoginResult};
use crate::host::{HostSession, UserDirectory};
use crate::pipeline::{LoginData, LoginPipeline, PipelineOutcome};
use crate::request::{RequestContext, TargetPath, TARGET_PATH_PARAM, TOKEN_PARAM};
use crate::response::Response;
use jwtauth_token::{token_fingerprint, TokenValidator};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Completes logins for tokens issued by the Identity Provider.
#[derive(Clone)]
pub struct LoginController {
    validator: Arc<TokenValidator>,
    directory: Arc<dyn UserDirectory>,
    pipeline: Arc<LoginPipeline>,
}

impl std::fmt::Debug for LoginController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginController")
            .field("validator", &self.validator)
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl LoginController {
    /// Create a controller over the host's directory and login pipeline.
    pub fn new(
        validator: Arc<TokenValidator>,
        directory: Arc<dyn UserDirectory>,
        pipeline: Arc<LoginPipeline>,
    ) -> Self {
        Self {
            validator,
            directory,
            pipeline,
        }
    }

    /// Handle a callback request, reading `token` and `targetPath` from its
    /// query. Missing parameters count as empty.
    pub fn auth(&self, request: &RequestContext, session: &mut dyn HostSession) -> LoginResult<Response> {
        let token = request.query_value(TOKEN_PARAM).unwrap_or_default();
        let target_path = request.query_value(TARGET_PATH_PARAM).unwrap_or_default();
        self.complete_login(request, token, target_path, session)
    }

    /// Establish a session for the identity in `token` and redirect to
    /// `target_path`.
    ///
    /// # Errors
    ///
    /// [`LoginError::UnknownUser`] if the token names a user the directory
    /// does not know, [`LoginError::PipelineFailed`] if a login step fails.
    /// Invalid tokens are not errors; they yield a redirect to `/`.
    #[instrument(
        skip(self, request, token, target_path, session),
        fields(path = %request.path, token = %token_fingerprint(token))
    )]
    pub fn complete_login(
        &self,
        request: &RequestContext,
        token: &str,
        target_path: &str,
        session: &mut dyn HostSession,
    ) -> LoginResult<Response> {
        let Some(username) = self.validator.parse_validated_token(token) else {
            // Likely expired in transit. The root page sends the browser back
            // to the login surface, which starts a fresh attempt.
            debug!("Restarting auto-login after token rejection");
            return Ok(Response::see_other(TargetPath::root().as_str()));
        };

        let target = TargetPath::sanitize(target_path);

        let user = self.directory.get(&username).ok_or_else(|| {
            error!(uid = %username, "Token issued for a user that does not exist");
            LoginError::UnknownUser(username.clone())
        })?;

        match session.current_user() {
            Some(current) if current == user.uid => {
                debug!(uid = %user.uid, "Already logged in");
                return Ok(Response::see_other(target.as_str()));
            }
            Some(current) => {
                // Logging in on top of another user's session would leave
                // that session's cookies in place and the old identity active.
                warn!(current = %current, uid = %user.uid, "Ending session of a different user");
                session.logout();
            }
            None => {}
        }

        let data = LoginData::new(request.clone(), username, target.clone()).with_user(user);
        let attempt_id = data.attempt_id;
        let uid = data.username.clone();

        match self.pipeline.process(data, session) {
            PipelineOutcome::Success(_) => {
                info!(attempt_id = %attempt_id, uid = %uid, target = %target, "Login completed");
                Ok(Response::see_other(target.as_str()))
            }
            PipelineOutcome::Failure { step, error } => {
                error!(attempt_id = %attempt_id, uid = %uid, step, error = %error, "Login pipeline failed");
                Err(LoginError::PipelineFailed {
                    step: step.to_string(),
                    reason: error.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::UserRecord;
    use crate::pipeline::{LoginStep, StepError, StepResult};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use jwtauth_token::FixedClock;
    use serde_json::json;
    use std::collections::HashMap;

    const SECRET: &str = "controller-test-secret";
    const NOW: i64 = 1_700_000_000;

    #[derive(Default)]
    struct TestSession {
        user: Option<String>,
        logouts: usize,
        logins: Vec<String>,
    }

    impl HostSession for TestSession {
        fn current_user(&self) -> Option<String> {
            self.user.clone()
        }
        fn logout(&mut self) {
            self.logouts += 1;
            self.user = None;
        }
        fn login_as(&mut self, user: &UserRecord) {
            self.logins.push(user.uid.clone());
            self.user = Some(user.uid.clone());
        }
        fn contains(&self, _key: &str) -> bool {
            false
        }
        fn remove(&mut self, _key: &str) {}
    }

    struct Directory(HashMap<String, UserRecord>);

    impl UserDirectory for Directory {
        fn get(&self, uid: &str) -> Option<UserRecord> {
            self.0.get(uid).cloned()
        }
    }

    struct FailingStep;

    impl LoginStep for FailingStep {
        fn name(&self) -> &'static str {
            "create_session_token"
        }
        fn process(&self, _data: LoginData, _session: &mut dyn HostSession) -> StepResult {
            Err(StepError::new("token store unavailable"))
        }
    }

    fn token(uid: &str, nbf: i64, exp: i64) -> String {
        encode(
            &Header::default(),
            &json!({"uid": uid, "nbf": nbf, "exp": exp}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn valid(uid: &str) -> String {
        token(uid, NOW - 5, NOW + 120)
    }

    fn controller(pipeline: LoginPipeline) -> LoginController {
        let validator = TokenValidator::with_secret(SECRET)
            .unwrap()
            .with_clock(Arc::new(FixedClock::at_timestamp(NOW)));
        let users = ["alice", "bob"]
            .iter()
            .map(|u| (u.to_string(), UserRecord::new(*u)))
            .collect();

        LoginController::new(Arc::new(validator), Arc::new(Directory(users)), Arc::new(pipeline))
    }

    fn request() -> RequestContext {
        RequestContext::new("/apps/jwtauth/")
    }

    #[test]
    fn test_fresh_login() {
        let mut session = TestSession::default();
        let response = controller(LoginPipeline::standard())
            .complete_login(&request(), &valid("alice"), "/dashboard", &mut session)
            .unwrap();

        assert_eq!(response, Response::see_other("/dashboard"));
        assert_eq!(session.user.as_deref(), Some("alice"));
        assert_eq!(session.logouts, 0);
    }

    #[test]
    fn test_expired_token_restarts_cycle() {
        let mut session = TestSession::default();
        let response = controller(LoginPipeline::standard())
            .complete_login(&request(), &token("alice", NOW - 600, NOW - 1), "/dashboard", &mut session)
            .unwrap();

        assert_eq!(response.location(), Some("/"));
        assert!(session.logins.is_empty());
    }

    #[test]
    fn test_invalid_token_leaves_existing_session() {
        let mut session = TestSession {
            user: Some("bob".to_string()),
            ..Default::default()
        };
        let response = controller(LoginPipeline::standard())
            .complete_login(&request(), "garbage", "/dashboard", &mut session)
            .unwrap();

        assert_eq!(response.location(), Some("/"));
        assert_eq!(session.user.as_deref(), Some("bob"));
        assert_eq!(session.logouts, 0);
    }

    #[test]
    fn test_unknown_user_is_fatal() {
        let mut session = TestSession::default();
        let result = controller(LoginPipeline::standard())
            .complete_login(&request(), &valid("mallory"), "/", &mut session);

        assert_eq!(result, Err(LoginError::UnknownUser("mallory".to_string())));
        assert!(session.logins.is_empty());
    }

    #[test]
    fn test_already_logged_in_is_idempotent() {
        let mut session = TestSession {
            user: Some("alice".to_string()),
            ..Default::default()
        };
        let controller = controller(LoginPipeline::standard());

        for _ in 0..2 {
            let response = controller
                .complete_login(&request(), &valid("alice"), "/files", &mut session)
                .unwrap();
            assert_eq!(response.location(), Some("/files"));
        }

        assert_eq!(session.logouts, 0);
        assert!(session.logins.is_empty());
    }

    #[test]
    fn test_other_user_session_is_replaced() {
        let mut session = TestSession {
            user: Some("bob".to_string()),
            ..Default::default()
        };
        let response = controller(LoginPipeline::standard())
            .complete_login(&request(), &valid("alice"), "/dashboard", &mut session)
            .unwrap();

        assert_eq!(response.location(), Some("/dashboard"));
        assert_eq!(session.logouts, 1);
        assert_eq!(session.logins, vec!["alice".to_string()]);
        assert_eq!(session.user.as_deref(), Some("alice"));
    }

    #[test]
    fn test_pipeline_failure_is_fatal() {
        let pipeline = LoginPipeline::standard().with_step(FailingStep);
        let result = controller(pipeline).complete_login(&request(), &valid("alice"), "/", &mut TestSession::default());

        assert_eq!(
            result,
            Err(LoginError::PipelineFailed {
                step: "create_session_token".to_string(),
                reason: "token store unavailable".to_string(),
            })
        );
    }

    #[test]
    fn test_unsafe_target_collapses_to_root() {
        let response = controller(LoginPipeline::standard())
            .complete_login(&request(), &valid("alice"), "https://evil.example.com/", &mut TestSession::default())
            .unwrap();

        assert_eq!(response.location(), Some("/"));
    }

    #[test]
    fn test_auth_reads_query() {
        let request = RequestContext::new("/apps/jwtauth/")
            .with_query("token", valid("bob"))
            .with_query("targetPath", "/apps/files/");
        let mut session = TestSession::default();

        let response = controller(LoginPipeline::standard()).auth(&request, &mut session).unwrap();

        assert_eq!(response.location(), Some("/apps/files/"));
        assert_eq!(session.user.as_deref(), Some("bob"));
    }

    #[test]
    fn test_auth_without_token() {
        let response = controller(LoginPipeline::standard())
            .auth(&request(), &mut TestSession::default())
            .unwrap();

        assert_eq!(response, Response::see_other("/"));
    }
}
