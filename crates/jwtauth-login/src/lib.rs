//! # JWT Auth Login
//!
//! Token-gated auto-login for a self-hosted collaboration platform. Users
//! never see the platform's login form: hits to the login page are sent to
//! an external Identity Provider, which sends the browser back with a signed
//! token that completes the login.
//!
//! ## Overview
//!
//! ```text
//! browser ── GET /login?redirect_url=/files ──▶ LoginPageInterceptor
//!         ◀── 302 https://idp/auto?target=%2Ffiles
//! browser ── IdP authenticates ──▶ GET /apps/jwtauth/?token=..&targetPath=/files
//!                                      LoginController
//!                                        ├─ TokenValidator (signature, exp, nbf, uid)
//!                                        ├─ UserDirectory lookup
//!                                        ├─ end conflicting session
//!                                        └─ LoginPipeline
//!         ◀── 303 /files
//! ```
//!
//! After a logout the host lands on `/login?clear=1`; the interceptor clears
//! browser storage inline and forwards to the Identity Provider's logout
//! confirmation, so the login page never renders and no new auto-login
//! starts.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use jwtauth_login::{JwtAuthApp, LoginPipeline, Outcome, RequestContext};
//! # use jwtauth_login::{HostSession, UserDirectory, UserRecord};
//! # use std::sync::Arc;
//! # struct Users;
//! # impl UserDirectory for Users { fn get(&self, uid: &str) -> Option<UserRecord> { Some(UserRecord::new(uid)) } }
//! # fn session() -> Box<dyn HostSession> { unimplemented!() }
//!
//! let app = JwtAuthApp::from_env().unwrap();
//! let mut session = session();
//!
//! let request = RequestContext::from_uri("/login?redirect_url=/apps/files");
//! match app.intercept(&request, session.as_mut()) {
//!     Outcome::PassThrough => { /* continue with normal routing */ }
//!     Outcome::Halt(response) => { /* send response, stop */ }
//! }
//!
//! let controller = app.login_controller(Arc::new(Users), Arc::new(LoginPipeline::standard()));
//! let callback = RequestContext::from_uri("/apps/jwtauth/?token=eyJ...&targetPath=/apps/files");
//! let response = controller.auth(&callback, session.as_mut());
//! ```
//!
//! ## Errors
//!
//! Rejected tokens and unsafe target paths are expected and answered with a
//! redirect. [`LoginError`] is reserved for conditions that would otherwise
//! loop forever: a token for an unknown user, or a failing login pipeline.

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod host;
pub mod interceptor;
pub mod pipeline;
pub mod redirect;
pub mod request;
pub mod response;

// Re-export main types
pub use app::JwtAuthApp;
pub use config::{ConfigError, JwtAuthConfig, TARGET_PATH_PLACEHOLDER};
pub use controller::LoginController;
pub use error::{LoginError, LoginResult};
pub use host::{HostSession, UserDirectory, UserRecord, CLEARING_MARKER};
pub use interceptor::{LoginPageInterceptor, RequestKind};
pub use pipeline::{
    CompleteLoginStep, LoginData, LoginPipeline, LoginStep, PipelineOutcome, StepError, StepResult,
};
pub use redirect::RedirectUrlGenerator;
pub use request::{RequestContext, TargetPath};
pub use response::{Outcome, Response};

pub use jwtauth_token::{JwtAlgorithm, TokenValidator};
