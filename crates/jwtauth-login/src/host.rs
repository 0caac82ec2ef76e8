//! Interfaces to the host platform.
//!
//! The user directory and the session layer belong to the host. The login
//! flow only reads and mutates them through these traits.

use serde::{Deserialize, Serialize};

/// Session marker the host sets on logout so its login page clears browser
/// storage. The logout-clear sequence removes it after clearing inline.
pub const CLEARING_MARKER: &str = "clearingExecutionContexts";

/// A user known to the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRecord {
    /// Unique user id; matches the token's `uid` claim
    pub uid: String,

    /// Display name, if the host has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl UserRecord {
    /// Create a record with no display name.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
        }
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Host user directory.
pub trait UserDirectory: Send + Sync {
    /// Look up a user by id.
    fn get(&self, uid: &str) -> Option<UserRecord>;
}

/// The session attached to the current request.
pub trait HostSession {
    /// Id of the logged-in user, if any.
    fn current_user(&self) -> Option<String>;

    /// End the current session.
    fn logout(&mut self);

    /// Log the session in as `user`.
    fn login_as(&mut self, user: &UserRecord);

    /// Whether a session value is set.
    fn contains(&self, key: &str) -> bool;

    /// Remove a session value.
    fn remove(&mut self, key: &str);
}
