//! Session acquisition. Loads the portal's report page to collect session cookies
//! and the anti-forgery token embedded in its HTML.
//!
//! A session is acquired fresh per logical operation and dropped after it.

use crate::adapters::portal::client::PortalClient;
use crate::domain::DomainError;
use regex::Regex;
use reqwest::header::SET_COOKIE;
use std::sync::{Arc, LazyLock};
use tracing::debug;

static META_CSRF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="csrf-token"\s+content="([^"]+)""#).expect("meta csrf pattern")
});

static INPUT_CSRF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<input[^>]+name="_token"[^>]+value="([^"]+)""#).expect("input csrf pattern")
});

/// Token extractors, tried in order. Each is a pure function over the raw HTML body.
const CSRF_EXTRACTORS: &[fn(&str) -> Option<String>] = &[meta_csrf_token, input_csrf_token];

fn meta_csrf_token(html: &str) -> Option<String> {
    META_CSRF.captures(html).map(|c| c[1].to_string())
}

fn input_csrf_token(html: &str) -> Option<String> {
    INPUT_CSRF.captures(html).map(|c| c[1].to_string())
}

/// First token any extractor finds. None is an acceptable outcome, not an error.
pub fn extract_csrf_token(html: &str) -> Option<String> {
    CSRF_EXTRACTORS.iter().find_map(|extract| extract(html))
}

/// `name=value` part of a `Set-Cookie` header value (attributes dropped).
fn cookie_pair(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    (!pair.is_empty()).then(|| pair.to_string())
}

/// Cookies and CSRF token for one logical operation. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    /// `name=value` strings in the order the server sent them. Duplicate names are kept.
    pub cookies: Vec<String>,
    pub csrf_token: Option<String>,
}

impl SessionContext {
    /// Value for a `Cookie` request header.
    pub fn cookie_header(&self) -> String {
        self.cookies.join("; ")
    }

    /// Token to echo back in forms; empty when the page carried none.
    pub fn token(&self) -> &str {
        self.csrf_token.as_deref().unwrap_or_default()
    }
}

/// Obtains a `SessionContext` from the portal's session page.
pub struct SessionAcquirer {
    client: Arc<PortalClient>,
}

impl SessionAcquirer {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }

    /// Network failure is a hard `Unreachable` error; a missing token is not.
    pub async fn acquire(&self) -> Result<SessionContext, DomainError> {
        let url = self.client.url(&self.client.endpoints().session_page);
        let response = self
            .client
            .http()
            .get(&url)
            .send()
            .await
            .map_err(|e| DomainError::Unreachable(format!("session page: {}", e)))?;

        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(cookie_pair)
            .collect();

        let html = response
            .text()
            .await
            .map_err(|e| DomainError::Unreachable(format!("session page body: {}", e)))?;
        let csrf_token = extract_csrf_token(&html);

        debug!(
            cookies = cookies.len(),
            csrf = csrf_token.is_some(),
            "acquired portal session"
        );
        Ok(SessionContext {
            cookies,
            csrf_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_token_wins_over_input() {
        let html = r#"<html><head><meta name="csrf-token" content="meta123"></head>
            <body><form><input type="hidden" name="_token" value="input456"></form></body></html>"#;
        assert_eq!(extract_csrf_token(html), Some("meta123".to_string()));
    }

    #[test]
    fn test_input_token_fallback() {
        let html = r#"<form method="post"><input type="hidden" name="_token" value="abc"></form>"#;
        assert_eq!(extract_csrf_token(html), Some("abc".to_string()));
    }

    #[test]
    fn test_missing_token_is_none() {
        assert_eq!(extract_csrf_token("<html><body>maintenance</body></html>"), None);
        let session = SessionContext::default();
        assert_eq!(session.token(), "");
    }

    #[test]
    fn test_cookie_pair_strips_attributes() {
        assert_eq!(
            cookie_pair("XSRF-TOKEN=abc%3D; expires=Fri, 01 Jan 2027 00:00:00 GMT; path=/"),
            Some("XSRF-TOKEN=abc%3D".to_string())
        );
        assert_eq!(cookie_pair(""), None);
    }

    #[test]
    fn test_cookie_header_keeps_order_and_duplicates() {
        let session = SessionContext {
            cookies: vec!["a=1".into(), "b=2".into(), "a=3".into()],
            csrf_token: None,
        };
        assert_eq!(session.cookie_header(), "a=1; b=2; a=3");
    }
}
