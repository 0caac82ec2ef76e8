//! Login page interception.
//!
//! Every request passes through [`LoginPageInterceptor::intercept`] before the
//! host routes it. Requests to the login surface never reach the host's
//! login form: they are sent to the Identity Provider instead, except for the
//! page users land on after logging out, which is answered inline.
//!
//! ```text
//! path outside login surface  -> PassThrough
//! ?forceStay                  -> PassThrough
//! ?clear                      -> clear browser storage inline, then logout confirmation
//! anything else               -> 302 to the Identity Provider's auto-login URL
//! ```

use crate::host::{HostSession, CLEARING_MARKER};
use crate::redirect::RedirectUrlGenerator;
use crate::request::{RequestContext, TargetPath, CLEAR_PARAM, FORCE_STAY_PARAM, REDIRECT_URL_PARAM};
use crate::response::{Outcome, Response};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// How an inbound request is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Path is outside the login surface.
    NotLoginSurface,
    /// Login surface, but the bypass flag is set.
    ForcedBypass,
    /// Landing page after a logout.
    LogoutClear,
    /// Genuine login page hit.
    AutoLogin,
}

/// Diverts login page hits to the Identity Provider.
#[derive(Debug, Clone)]
pub struct LoginPageInterceptor {
    urls: Arc<RedirectUrlGenerator>,
    login_path_prefix: String,
}

impl LoginPageInterceptor {
    /// Create an interceptor for the given login surface.
    pub fn new(urls: Arc<RedirectUrlGenerator>, login_path_prefix: impl Into<String>) -> Self {
        Self {
            urls,
            login_path_prefix: login_path_prefix.into(),
        }
    }

    /// Decide how a request is handled, without side effects.
    pub fn classify(&self, request: &RequestContext) -> RequestKind {
        if !request.path.starts_with(&self.login_path_prefix) {
            RequestKind::NotLoginSurface
        } else if request.has_query(FORCE_STAY_PARAM) {
            RequestKind::ForcedBypass
        } else if request.has_query(CLEAR_PARAM) {
            RequestKind::LogoutClear
        } else {
            RequestKind::AutoLogin
        }
    }

    /// Handle a request. Halting outcomes must be sent as-is with no further
    /// host processing.
    #[instrument(skip(self, request, session), fields(path = %request.path))]
    pub fn intercept(&self, request: &RequestContext, session: &mut dyn HostSession) -> Outcome {
        match self.classify(request) {
            RequestKind::NotLoginSurface => Outcome::PassThrough,
            RequestKind::ForcedBypass => {
                debug!("Login page bypass requested");
                Outcome::PassThrough
            }
            RequestKind::LogoutClear => Outcome::Halt(self.clear_sequence(session)),
            RequestKind::AutoLogin => Outcome::Halt(self.auto_login_sequence(request)),
        }
    }

    /// Clear browser storage inline and move on to the logout confirmation.
    ///
    /// Letting the host render its own clearing page would send the browser
    /// back to the login surface afterwards and start another auto-login.
    fn clear_sequence(&self, session: &mut dyn HostSession) -> Response {
        let marker_present = session.contains(CLEARING_MARKER);
        session.remove(CLEARING_MARKER);

        let logout_url = self.urls.generate_logout_confirmation_url();
        info!(marker_present, logout_url = %logout_url, "Clearing browser storage after logout");

        Response::html(clear_page_html(&logout_url))
    }

    fn auto_login_sequence(&self, request: &RequestContext) -> Response {
        let target = TargetPath::from_optional(request.query_value(REDIRECT_URL_PARAM));
        let url = self.urls.generate_auto_login_url(target.as_str());

        debug!(target = %target, "Redirecting login page hit to the Identity Provider");
        Response::found(url)
    }
}

/// Page that clears `localStorage` and `sessionStorage`, then navigates to
/// `redirect_to`.
pub fn clear_page_html(redirect_to: &str) -> String {
    let literal = serde_json::to_string(redirect_to)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace("</", "<\\/");

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body>
<script>
	try {{
		window.localStorage.clear();
		window.sessionStorage.clear();
		console.debug("Browser storage cleared");
	}} catch (e) {{
		console.error("Could not clear browser storage", e);
	}}

	window.location.href = {};
</script>
</body>
</html>
"#,
        literal
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::UserRecord;
    use std::collections::HashSet;

    #[derive(Default)]
    struct MarkerSession {
        values: HashSet<String>,
        removed: Vec<String>,
        logouts: usize,
    }

    impl HostSession for MarkerSession {
        fn current_user(&self) -> Option<String> {
            None
        }
        fn logout(&mut self) {
            self.logouts += 1;
        }
        fn login_as(&mut self, _user: &UserRecord) {}
        fn contains(&self, key: &str) -> bool {
            self.values.contains(key)
        }
        fn remove(&mut self, key: &str) {
            self.values.remove(key);
            self.removed.push(key.to_string());
        }
    }

    fn interceptor() -> LoginPageInterceptor {
        LoginPageInterceptor::new(
            Arc::new(RedirectUrlGenerator::new(
                "https://idp.example.com/auto?next=__TARGET_PATH__",
                "https://idp.example.com/logged-out",
            )),
            "/login",
        )
    }

    #[test]
    fn test_classify() {
        let i = interceptor();

        assert_eq!(i.classify(&RequestContext::from_uri("/apps/files")), RequestKind::NotLoginSurface);
        assert_eq!(i.classify(&RequestContext::from_uri("/login?forceStay=1")), RequestKind::ForcedBypass);
        assert_eq!(i.classify(&RequestContext::from_uri("/login?forceStay&clear=1")), RequestKind::ForcedBypass);
        assert_eq!(i.classify(&RequestContext::from_uri("/login?clear=1")), RequestKind::LogoutClear);
        assert_eq!(i.classify(&RequestContext::from_uri("/login")), RequestKind::AutoLogin);
        assert_eq!(i.classify(&RequestContext::from_uri("/login/flow")), RequestKind::AutoLogin);
    }

    #[test]
    fn test_pass_through_leaves_session_alone() {
        let mut session = MarkerSession::default();
        session.values.insert(CLEARING_MARKER.to_string());

        let outcome = interceptor().intercept(&RequestContext::from_uri("/index.php/apps/files?clear=1"), &mut session);

        assert!(outcome.is_pass_through());
        assert!(session.removed.is_empty());
        assert!(session.contains(CLEARING_MARKER));
    }

    #[test]
    fn test_auto_login_default_target() {
        let mut session = MarkerSession::default();
        let outcome = interceptor().intercept(&RequestContext::from_uri("/login"), &mut session);

        assert_eq!(
            outcome,
            Outcome::Halt(Response::found("https://idp.example.com/auto?next=%2F"))
        );
        assert_eq!(session.logouts, 0);
        assert!(session.removed.is_empty());
    }

    #[test]
    fn test_auto_login_with_target() {
        let outcome = interceptor().intercept(
            &RequestContext::from_uri("/login?redirect_url=/files/doc.txt"),
            &mut MarkerSession::default(),
        );

        assert_eq!(
            outcome.response().and_then(Response::location),
            Some("https://idp.example.com/auto?next=%2Ffiles%2Fdoc.txt")
        );
    }

    #[test]
    fn test_auto_login_unsafe_target_collapses_to_root() {
        let outcome = interceptor().intercept(
            &RequestContext::from_uri("/login?redirect_url=https%3A%2F%2Fevil.example.com%2F"),
            &mut MarkerSession::default(),
        );

        assert_eq!(
            outcome.response().and_then(Response::location),
            Some("https://idp.example.com/auto?next=%2F")
        );
    }

    #[test]
    fn test_clear_sequence() {
        let mut session = MarkerSession::default();
        session.values.insert(CLEARING_MARKER.to_string());

        let outcome = interceptor().intercept(&RequestContext::from_uri("/login?clear=1"), &mut session);

        let response = outcome.response().expect("clear sequence halts");
        assert!(!response.is_redirect());
        assert!(response.body().contains("window.localStorage.clear()"));
        assert!(response.body().contains("window.sessionStorage.clear()"));
        assert!(response
            .body()
            .contains(r#"window.location.href = "https://idp.example.com/logged-out";"#));
        assert!(!session.contains(CLEARING_MARKER));
        assert_eq!(session.removed, vec![CLEARING_MARKER.to_string()]);
    }

    #[test]
    fn test_clear_page_escapes_script_terminator() {
        let html = clear_page_html("https://idp.example.com/</script><script>alert(1)");

        assert!(!html.contains("</script><script>alert"));
        assert!(html.contains(r#"<\/script><script>alert(1)"#));
    }
}
