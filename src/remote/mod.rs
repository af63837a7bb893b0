//! Clients for the hosted auth and table APIs.
//!
//! ## Endpoints used
//!
//! - `POST /auth/v1/token?grant_type=password` - Password sign-in
//! - `POST /auth/v1/token?grant_type=refresh_token` - Token refresh
//! - `GET /auth/v1/user` - Validate a token and read its user
//! - `POST /auth/v1/logout` - Revoke the session
//! - `GET /rest/v1/{table}?id=eq.{id}` - Profile rows

mod auth;
mod profile;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::GateError;
use crate::Result;

pub use auth::RestAuthProvider;
pub use profile::RestProfileStore;

/// Default request timeout for provider calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection settings for a hosted provider project.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent as `apikey` on every request.
    pub anon_key: String,
    /// Table holding user profiles.
    pub profile_table: String,
    /// Where to persist the signed-in session between runs.
    pub session_file: Option<PathBuf>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            profile_table: "profiles".to_string(),
            session_file: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_profile_table(mut self, table: impl Into<String>) -> Self {
        self.profile_table = table.into();
        self
    }

    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = Some(path.into());
        self
    }

    /// Join a path onto the project URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("session-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(GateError::Http)
    }
}

/// Turn a non-success response into [`GateError::Provider`].
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(GateError::Provider {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Pull a human-readable message out of a provider error body.
fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|json| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        let config = ProviderConfig::new("https://example.test/", "key");
        assert_eq!(
            config.endpoint("/auth/v1/user"),
            "https://example.test/auth/v1/user"
        );
        assert_eq!(
            config.endpoint("rest/v1/profiles"),
            "https://example.test/rest/v1/profiles"
        );
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::new("https://example.test", "key");
        assert_eq!(config.profile_table, "profiles");
        assert!(config.session_file.is_none());
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_error_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(error_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(r#"{"msg":"bad jwt"}"#), "bad jwt");
        assert_eq!(error_message(r#"{"code":"PGRST205","message":"missing table"}"#), "missing table");
        assert_eq!(error_message("  plain failure \n"), "plain failure");
    }
}
