//! Outbound Identity Provider URLs.

use crate::config::TARGET_PATH_PLACEHOLDER;
use url::form_urlencoded;

/// Builds the auto-login and logout-confirmation URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectUrlGenerator {
    auto_login_trigger_uri: String,
    logout_confirmation_uri: String,
}

impl RedirectUrlGenerator {
    /// Create a generator from the trigger template and the logout URL.
    pub fn new(
        auto_login_trigger_uri: impl Into<String>,
        logout_confirmation_uri: impl Into<String>,
    ) -> Self {
        Self {
            auto_login_trigger_uri: auto_login_trigger_uri.into(),
            logout_confirmation_uri: logout_confirmation_uri.into(),
        }
    }

    /// URL that starts an auto-login at the Identity Provider.
    ///
    /// The placeholder is replaced with the form-encoded target path. A
    /// template without the placeholder is returned unchanged.
    pub fn generate_auto_login_url(&self, target_path: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(target_path.as_bytes()).collect();
        self.auto_login_trigger_uri
            .replacen(TARGET_PATH_PLACEHOLDER, &encoded, 1)
    }

    /// URL confirming a completed logout, verbatim from configuration.
    pub fn generate_logout_confirmation_url(&self) -> String {
        self.logout_confirmation_uri.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> RedirectUrlGenerator {
        RedirectUrlGenerator::new(
            "https://idp.example.com/auto-login?target=__TARGET_PATH__&app=cloud",
            "https://idp.example.com/logged-out",
        )
    }

    #[test]
    fn test_root_target() {
        assert_eq!(
            generator().generate_auto_login_url("/"),
            "https://idp.example.com/auto-login?target=%2F&app=cloud"
        );
    }

    #[test]
    fn test_target_is_encoded() {
        assert_eq!(
            generator().generate_auto_login_url("/apps/files/?dir=/My Photos&x=1"),
            "https://idp.example.com/auto-login?target=%2Fapps%2Ffiles%2F%3Fdir%3D%2FMy+Photos%26x%3D1&app=cloud"
        );
    }

    #[test]
    fn test_only_placeholder_changes() {
        let generated = generator().generate_auto_login_url("/files/doc.txt");
        let (prefix, suffix) = (
            "https://idp.example.com/auto-login?target=",
            "&app=cloud",
        );

        assert!(generated.starts_with(prefix));
        assert!(generated.ends_with(suffix));
        assert_eq!(
            &generated[prefix.len()..generated.len() - suffix.len()],
            "%2Ffiles%2Fdoc.txt"
        );
    }

    #[test]
    fn test_template_without_placeholder() {
        let generator = RedirectUrlGenerator::new("https://idp.example.com/auto-login", "x");
        assert_eq!(
            generator.generate_auto_login_url("/files"),
            "https://idp.example.com/auto-login"
        );
    }

    #[test]
    fn test_logout_confirmation_verbatim() {
        assert_eq!(
            generator().generate_logout_confirmation_url(),
            "https://idp.example.com/logged-out"
        );
    }
}
