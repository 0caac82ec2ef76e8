//! Terminal results of the login flow.
//!
//! Nothing in the flow writes to the client or stops the process. Handlers
//! return a [`Response`] (or [`Outcome::PassThrough`]) and the host decides
//! how to deliver it.

use serde::{Deserialize, Serialize};

/// HTTP 200 OK.
pub const STATUS_OK: u16 = 200;

/// HTTP 302 Found.
pub const STATUS_FOUND: u16 = 302;

/// HTTP 303 See Other.
pub const STATUS_SEE_OTHER: u16 = 303;

/// A response that ends the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Redirect the browser.
    Redirect {
        /// Redirect status (302 or 303)
        status: u16,
        /// Location header value
        location: String,
    },

    /// Render an HTML page inline.
    Html {
        /// Page body
        body: String,
    },
}

impl Response {
    /// A `302 Found` redirect.
    pub fn found(location: impl Into<String>) -> Self {
        Response::Redirect {
            status: STATUS_FOUND,
            location: location.into(),
        }
    }

    /// A `303 See Other` redirect.
    pub fn see_other(location: impl Into<String>) -> Self {
        Response::Redirect {
            status: STATUS_SEE_OTHER,
            location: location.into(),
        }
    }

    /// An inline HTML page.
    pub fn html(body: impl Into<String>) -> Self {
        Response::Html { body: body.into() }
    }

    /// HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Response::Redirect { status, .. } => *status,
            Response::Html { .. } => STATUS_OK,
        }
    }

    /// Redirect target, if this is a redirect.
    pub fn location(&self) -> Option<&str> {
        match self {
            Response::Redirect { location, .. } => Some(location),
            Response::Html { .. } => None,
        }
    }

    /// Whether this response is a redirect.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Response::Redirect { .. })
    }

    /// Content-Type header value.
    pub fn content_type(&self) -> &'static str {
        match self {
            Response::Redirect { .. } => "text/plain; charset=utf-8",
            Response::Html { .. } => "text/html; charset=utf-8",
        }
    }

    /// Response body. Redirects carry a short human-readable note.
    pub fn body(&self) -> String {
        match self {
            Response::Redirect { location, .. } => format!("Redirecting you to: {}", location),
            Response::Html { body } => body.clone(),
        }
    }
}

/// What the host should do with a request after interception.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not ours; continue with normal request handling.
    PassThrough,

    /// Send this response and stop processing the request.
    Halt(Response),
}

impl Outcome {
    /// Whether the request continues to the host.
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Outcome::PassThrough)
    }

    /// The halting response, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::PassThrough => None,
            Outcome::Halt(response) => Some(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_statuses() {
        assert_eq!(Response::found("/x").status_code(), 302);
        assert_eq!(Response::see_other("/x").status_code(), 303);
        assert_eq!(Response::html("<p></p>").status_code(), 200);
    }

    #[test]
    fn test_redirect_body() {
        let response = Response::found("https://idp.example.com/auto");

        assert_eq!(response.location(), Some("https://idp.example.com/auto"));
        assert_eq!(response.body(), "Redirecting you to: https://idp.example.com/auto");
        assert!(response.is_redirect());
    }

    #[test]
    fn test_html_response() {
        let response = Response::html("<script></script>");

        assert_eq!(response.location(), None);
        assert_eq!(response.content_type(), "text/html; charset=utf-8");
        assert_eq!(response.body(), "<script></script>");
    }

    #[test]
    fn test_outcome() {
        assert!(Outcome::PassThrough.is_pass_through());
        assert_eq!(Outcome::PassThrough.response(), None);

        let halt = Outcome::Halt(Response::found("/"));
        assert!(!halt.is_pass_through());
        assert_eq!(halt.response().and_then(Response::location), Some("/"));
    }
}
