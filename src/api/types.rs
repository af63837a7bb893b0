//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::gate::{GateState, NavigationMode};
use crate::session::{ProfileEntry, User};

/// Current navigation as seen by clients.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationResponse {
    /// Subtree to render.
    pub mode: NavigationMode,
    /// Gate state name.
    pub state: &'static str,
    /// Authenticated user, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl NavigationResponse {
    pub fn from_state(state: &GateState) -> Self {
        Self {
            mode: state.navigation(),
            state: state.name(),
            user: state.user().cloned(),
        }
    }
}

/// Profile of the authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    /// Fetch status; absent when no fetch was dispatched yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileEntry>,
}

/// Request to sign in with a password.
#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response for a successful sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

/// Generic API error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "NOT_AUTHENTICATED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_authenticated() -> Self {
        Self::new("NOT_AUTHENTICATED", "No authenticated user")
    }

    pub fn invalid_credentials() -> Self {
        Self::new("INVALID_CREDENTIALS", "Email or password rejected")
    }

    pub fn provider_error(message: impl Into<String>) -> Self {
        Self::new("PROVIDER_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

/// WebSocket message types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Navigation changed (also sent on connect).
    Navigation(NavigationResponse),
    /// The gate stopped; the socket closes after this.
    Stopped,
    /// Error message.
    Error { code: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_response_authenticated() {
        let state = GateState::Authenticated(User::new("u-1").with_email("a@b.c"));
        let json = serde_json::to_value(NavigationResponse::from_state(&state)).unwrap();
        assert_eq!(json["mode"], "main");
        assert_eq!(json["state"], "authenticated");
        assert_eq!(json["user"]["id"], "u-1");
    }

    #[test]
    fn test_navigation_response_loading_omits_user() {
        let json =
            serde_json::to_value(NavigationResponse::from_state(&GateState::Loading)).unwrap();
        assert_eq!(json["mode"], "loading");
        assert!(json.get("user").is_none());
    }

    #[test]
    fn test_sign_in_request() {
        let req: SignInRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#).unwrap();
        assert_eq!(req.email, "a@b.c");
    }

    #[test]
    fn test_error_response_serialization() {
        let json = serde_json::to_string(&ErrorResponse::not_authenticated()).unwrap();
        assert!(json.contains("NOT_AUTHENTICATED"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_ws_message_tagging() {
        let msg = WsMessage::Navigation(NavigationResponse::from_state(
            &GateState::Unauthenticated,
        ));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "navigation");
        assert_eq!(json["mode"], "auth");

        let stopped = serde_json::to_value(WsMessage::Stopped).unwrap();
        assert_eq!(stopped["type"], "stopped");
    }
}
