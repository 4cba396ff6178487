//! Shared HTTP plumbing for the portal: base URL, browser-like headers, cookie replay,
//! status and JSON handling. Maps reqwest/serde failures into DomainError.

use crate::adapters::portal::session::SessionContext;
use crate::domain::DomainError;
use crate::shared::config::{PortalConfig, PortalEndpoints};
use reqwest::header::{ACCEPT, COOKIE, REFERER};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Low-level portal client. One per process; cheap to share via Arc.
pub struct PortalClient {
    http: Client,
    base_url: String,
    endpoints: PortalEndpoints,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> Result<Self, DomainError> {
        let http = Client::builder()
            .user_agent(config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::Unreachable(format!("build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: config.base_url,
            endpoints: config.endpoints,
        })
    }

    pub fn endpoints(&self) -> &PortalEndpoints {
        &self.endpoints
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Authenticated GET with query parameters. Returns parsed JSON.
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(&str, &str)],
        session: &SessionContext,
    ) -> Result<Value, DomainError> {
        let request = self.http.get(self.url(path)).query(query);
        self.send_json(with_session(request, session), path).await
    }

    /// CSRF-bearing form POST (the caller includes `_token` in `form`). Returns parsed JSON.
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
        session: &SessionContext,
    ) -> Result<Value, DomainError> {
        let request = self
            .http
            .post(self.url(path))
            .header(REFERER, self.url(&self.endpoints.session_page))
            .form(form);
        self.send_json(with_session(request, session), path).await
    }

    async fn send_json(&self, request: RequestBuilder, path: &str) -> Result<Value, DomainError> {
        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Unreachable(format!("{}: {}", path, e)))?;

        let status = response.status();
        debug!(endpoint = path, status = status.as_u16(), "portal responded");
        if !status.is_success() {
            return Err(DomainError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| DomainError::Unreachable(format!("{}: read body: {}", path, e)))?;
        serde_json::from_str(&text).map_err(|e| {
            debug!(
                endpoint = path,
                body = %text.chars().take(300).collect::<String>(),
                "portal body is not JSON"
            );
            DomainError::MalformedJson(e.to_string())
        })
    }
}

/// Replays the session cookies and marks the request as the portal's own XHR.
fn with_session(request: RequestBuilder, session: &SessionContext) -> RequestBuilder {
    let request = request
        .header("X-Requested-With", "XMLHttpRequest")
        .header(ACCEPT, "application/json");
    if session.cookies.is_empty() {
        request
    } else {
        request.header(COOKIE, session.cookie_header())
    }
}
