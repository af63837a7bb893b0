//! Session, user and change-notification types.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-issued identifier.
    pub id: UserId,
    /// Email address, when the provider exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Credential bundle issued by the auth provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for provider calls.
    pub access_token: String,
    /// Token used to obtain a new access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
    /// Signed-in user, if the provider attached one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
            user: None,
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Check expiry against the given unix timestamp.
    pub fn is_expired_at(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Check expiry against the system clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Current seconds since the unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Presence or absence of a session, as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionSnapshot {
    /// A session is active.
    Present(Session),
    /// No session (signed out, expired, never signed in).
    #[default]
    Absent,
}

impl SessionSnapshot {
    /// User of a present session.
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Present(session) => session.user.as_ref(),
            Self::Absent => None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Present(session) => Some(session),
            Self::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl From<Option<Session>> for SessionSnapshot {
    fn from(value: Option<Session>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Kind of change reported alongside a session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InitialSession => "INITIAL_SESSION",
            Self::SignedIn => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed => "TOKEN_REFRESHED",
            Self::UserUpdated => "USER_UPDATED",
        };
        f.write_str(name)
    }
}

/// A session change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: AuthEvent,
    pub session: SessionSnapshot,
}

impl SessionChange {
    pub fn new(event: AuthEvent, session: SessionSnapshot) -> Self {
        Self { event, session }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(AuthEvent::SignedIn, SessionSnapshot::Present(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEvent::SignedOut, SessionSnapshot::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_for(id: &str) -> Session {
        Session::new("token").with_user(User::new(id))
    }

    #[test]
    fn test_snapshot_user() {
        let present = SessionSnapshot::Present(session_for("u-1"));
        assert_eq!(present.user().map(|u| u.id.as_str()), Some("u-1"));

        let no_user = SessionSnapshot::Present(Session::new("token"));
        assert!(no_user.is_present());
        assert!(no_user.user().is_none());

        assert!(SessionSnapshot::Absent.user().is_none());
        assert!(!SessionSnapshot::Absent.is_present());
    }

    #[test]
    fn test_snapshot_from_option() {
        assert_eq!(SessionSnapshot::from(None), SessionSnapshot::Absent);
        let snapshot = SessionSnapshot::from(Some(session_for("u-2")));
        assert!(snapshot.is_present());
    }

    #[test]
    fn test_expiry() {
        let session = Session::new("t").with_expires_at(100);
        assert!(!session.is_expired_at(99));
        assert!(session.is_expired_at(100));
        assert!(!Session::new("t").is_expired_at(u64::MAX));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let session = Session::new("secret-access").with_refresh_token("secret-refresh");
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_session_deserializes_provider_payload() {
        let json = r#"{
            "access_token": "abc",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700000000,
            "refresh_token": "def",
            "user": {"id": "8d0f", "email": "a@b.c", "role": "authenticated"}
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.access_token, "abc");
        assert_eq!(session.expires_at, Some(1_700_000_000));
        assert_eq!(session.user.unwrap().email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn test_auth_event_display_matches_serde() {
        let json = serde_json::to_string(&AuthEvent::TokenRefreshed).unwrap();
        assert_eq!(json, format!("\"{}\"", AuthEvent::TokenRefreshed));
    }
}
