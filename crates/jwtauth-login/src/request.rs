//! Request context and target path sanitizing
//!
//! Everything the flow needs to know about an inbound request is carried in
//! a [`RequestContext`] value passed down explicitly. Query values are
//! percent-decoded on construction.

use serde::{Deserialize, Serialize};
use url::Url;

/// Query flag that skips interception and shows the host's own login page.
pub const FORCE_STAY_PARAM: &str = "forceStay";

/// Query flag set by the host on the page users land on after a logout.
pub const CLEAR_PARAM: &str = "clear";

/// Query parameter carrying the page to return to after logging in.
pub const REDIRECT_URL_PARAM: &str = "redirect_url";

/// Callback parameter carrying the signed token.
pub const TOKEN_PARAM: &str = "token";

/// Callback parameter carrying the target path.
pub const TARGET_PATH_PARAM: &str = "targetPath";

/// Inbound request data consumed by the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Request path, without query string
    pub path: String,

    /// Decoded query parameters, in request order
    #[serde(default)]
    pub query: Vec<(String, String)>,

    /// Client address, for logging only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

impl RequestContext {
    /// Create a context for a path with no query parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            remote_addr: None,
        }
    }

    /// Build a context from a request URI (`/login?redirect_url=%2Ffiles`).
    ///
    /// Unparseable URIs produce a context for `/` with no parameters.
    pub fn from_uri(uri: &str) -> Self {
        let base = Url::parse("http://localhost/").ok();
        let parsed = base.and_then(|b| b.join(uri).ok());

        match parsed {
            Some(url) => Self {
                path: url.path().to_string(),
                query: url.query_pairs().into_owned().collect(),
                remote_addr: None,
            },
            None => Self::new("/"),
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set the client address.
    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    /// Whether a query parameter is present, whatever its value.
    pub fn has_query(&self, name: &str) -> bool {
        self.query.iter().any(|(k, _)| k == name)
    }

    /// Value of a query parameter. The last occurrence wins.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A sanitized, in-site destination.
///
/// Always starts with a single `/`. Anything that would leave the site, or
/// that cannot be parsed, becomes the site root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetPath(String);

impl TargetPath {
    /// The site root.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Sanitize a raw value taken from a request.
    ///
    /// Characters that are not legal in a URL are dropped first. The result
    /// is resolved against the site; if it names another host, uses a
    /// non-http scheme, or has an empty path, the root is returned. Path and
    /// query are kept; fragments are dropped.
    pub fn sanitize(raw: &str) -> Self {
        let cleaned: String = raw.chars().filter(|c| is_url_char(*c)).collect();
        if cleaned.is_empty() {
            return Self::root();
        }

        let Ok(base) = Url::parse("http://localhost/") else {
            return Self::root();
        };
        let Ok(resolved) = base.join(&cleaned) else {
            return Self::root();
        };

        if resolved.origin() != base.origin() || !cleaned.starts_with('/') || cleaned.starts_with("//") {
            return Self::root();
        }

        let path = resolved.path();
        if path.is_empty() || !path.starts_with('/') || path.starts_with("//") {
            return Self::root();
        }

        match resolved.query() {
            Some(q) if !q.is_empty() => Self(format!("{}?{}", path, q)),
            _ => Self(path.to_string()),
        }
    }

    /// Sanitize an optional value; absent means root.
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map(Self::sanitize).unwrap_or_else(Self::root)
    }

    /// The path as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the site root.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }
}

impl Default for TargetPath {
    fn default() -> Self {
        Self::root()
    }
}

impl std::fmt::Display for TargetPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Characters allowed to survive URL sanitizing: ASCII letters, digits and
/// URL punctuation.
fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "$-_.+!*'(),{}|\\^~[]`<>#%\";/?:@&=".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri() {
        let ctx = RequestContext::from_uri("/login?redirect_url=%2Ffiles%2Fdoc.txt&clear=1");

        assert_eq!(ctx.path, "/login");
        assert_eq!(ctx.query_value("redirect_url"), Some("/files/doc.txt"));
        assert!(ctx.has_query("clear"));
        assert!(!ctx.has_query("forceStay"));
    }

    #[test]
    fn test_flag_without_value() {
        let ctx = RequestContext::from_uri("/login?forceStay");
        assert!(ctx.has_query(FORCE_STAY_PARAM));
        assert_eq!(ctx.query_value(FORCE_STAY_PARAM), Some(""));
    }

    #[test]
    fn test_last_value_wins() {
        let ctx = RequestContext::new("/login")
            .with_query("redirect_url", "/a")
            .with_query("redirect_url", "/b");
        assert_eq!(ctx.query_value("redirect_url"), Some("/b"));
    }

    #[test]
    fn test_sanitize_plain_paths() {
        assert_eq!(TargetPath::sanitize("/files/doc.txt").as_str(), "/files/doc.txt");
        assert_eq!(TargetPath::sanitize("/dashboard").as_str(), "/dashboard");
        assert_eq!(
            TargetPath::sanitize("/apps/files/?dir=/Photos").as_str(),
            "/apps/files/?dir=/Photos"
        );
    }

    #[test]
    fn test_sanitize_drops_fragment_and_illegal_chars() {
        assert_eq!(TargetPath::sanitize("/apps/files#section").as_str(), "/apps/files");
        assert_eq!(TargetPath::sanitize("/my docs\n/é").as_str(), "/mydocs/");
    }

    #[test]
    fn test_sanitize_collapses_to_root() {
        assert!(TargetPath::sanitize("").is_root());
        assert!(TargetPath::sanitize("   ").is_root());
        assert!(TargetPath::sanitize("https://evil.example.com/steal").is_root());
        assert!(TargetPath::sanitize("//evil.example.com/steal").is_root());
        assert!(TargetPath::sanitize("javascript:alert(1)").is_root());
        assert!(TargetPath::sanitize("relative/path").is_root());
        assert!(TargetPath::sanitize("/\\evil.example.com").is_root());
    }

    #[test]
    fn test_sanitize_normalizes_dot_segments() {
        assert_eq!(TargetPath::sanitize("/a/../b").as_str(), "/b");
        assert_eq!(TargetPath::sanitize("/../../etc").as_str(), "/etc");
    }

    #[test]
    fn test_from_optional() {
        assert!(TargetPath::from_optional(None).is_root());
        assert_eq!(TargetPath::from_optional(Some("/x")).as_str(), "/x");
    }
}
