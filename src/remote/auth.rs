//! Auth provider backed by the hosted auth REST API.

use std::path::Path;
use std::sync::RwLock;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{check_response, ProviderConfig};
use crate::error::GateError;
use crate::session::{
    unix_now, AuthEvent, AuthProvider, Session, SessionChange, SessionChannel, SessionControl,
    SessionSnapshot, Subscription, User,
};
use crate::Result;

/// Token endpoint payload.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<u64>,
    #[serde(default)]
    user: Option<User>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| unix_now().saturating_add(secs)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Auth provider talking to the hosted auth API.
///
/// The signed-in session lives in memory and, when a session file is
/// configured, on disk. Every change is broadcast to subscribers.
#[derive(Debug)]
pub struct RestAuthProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    session: RwLock<Option<Session>>,
    channel: SessionChannel,
}

impl RestAuthProvider {
    /// Create a provider, restoring a persisted session if one exists.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a provider with a preconfigured HTTP client.
    pub fn with_client(client: reqwest::Client, config: ProviderConfig) -> Self {
        let restored = config.session_file.as_deref().and_then(load_session);
        if restored.is_some() {
            info!("restored persisted session");
        }
        Self {
            client,
            config,
            session: RwLock::new(restored),
            channel: SessionChannel::new(),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Currently stored session, without refreshing.
    pub fn stored_session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    /// Access token of the stored session.
    pub fn access_token(&self) -> Option<String> {
        self.stored_session().map(|s| s.access_token)
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .post(self.config.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = match check_response(response).await {
            Ok(response) => response,
            Err(GateError::Provider { status: 400 | 401, message }) => {
                debug!("sign-in rejected: {}", message);
                return Err(GateError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let session = response.json::<TokenResponse>().await?.into_session();
        if session.user.is_none() {
            return Err(GateError::UnexpectedResponse(
                "token response without user".into(),
            ));
        }
        self.store(Some(session.clone()), AuthEvent::SignedIn)?;
        info!("signed in");
        Ok(session)
    }

    /// Exchange the stored refresh token for a new session.
    pub async fn refresh_session(&self) -> Result<Session> {
        let previous = self.stored_session().ok_or(GateError::NotSignedIn)?;
        let refresh_token = previous
            .refresh_token
            .clone()
            .ok_or(GateError::NotSignedIn)?;

        let response = self
            .client
            .post(self.config.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.config.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let response = check_response(response).await?;

        let mut session = response.json::<TokenResponse>().await?.into_session();
        if session.user.is_none() {
            // Refresh answers may omit the user; it does not change.
            session.user = previous.user;
        }
        if session.user.is_none() {
            return Err(GateError::UnexpectedResponse(
                "refreshed session without user".into(),
            ));
        }
        self.store(Some(session.clone()), AuthEvent::TokenRefreshed)?;
        debug!("session refreshed");
        Ok(session)
    }

    /// Validate the stored token and return its user.
    pub async fn get_user(&self) -> Result<User> {
        let token = self.access_token().ok_or(GateError::NotSignedIn)?;
        let response = self
            .client
            .get(self.config.endpoint("/auth/v1/user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.json::<User>().await?)
    }

    /// Revoke and clear the stored session.
    ///
    /// The revoke call is best effort; the local session is cleared even
    /// when it fails.
    pub async fn sign_out(&self) -> Result<()> {
        let Some(token) = self.access_token() else {
            return Ok(());
        };

        let result = self
            .client
            .post(self.config.endpoint("/auth/v1/logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await;
        match result {
            Ok(response) => {
                if let Err(e) = check_response(response).await {
                    warn!("logout call failed: {}", e);
                }
            }
            Err(e) => warn!("logout call failed: {}", e),
        }

        self.store(None, AuthEvent::SignedOut)?;
        info!("signed out");
        Ok(())
    }

    /// Replace the stored session, persist it and notify subscribers.
    fn store(&self, session: Option<Session>, event: AuthEvent) -> Result<()> {
        {
            let mut current = self.session.write().map_err(|_| GateError::LockPoisoned)?;
            current.clone_from(&session);
        }

        if let Some(path) = self.config.session_file.as_deref() {
            if let Err(e) = persist_session(path, session.as_ref()) {
                warn!(path = %path.display(), "failed to persist session: {}", e);
            }
        }

        let snapshot = SessionSnapshot::from(session);
        self.channel.emit(SessionChange::new(event, snapshot));
        Ok(())
    }
}

impl AuthProvider for RestAuthProvider {
    async fn current_session(&self) -> Result<SessionSnapshot> {
        let Some(session) = self.stored_session() else {
            return Ok(SessionSnapshot::Absent);
        };
        if !session.is_expired() {
            return Ok(SessionSnapshot::Present(session));
        }

        if session.refresh_token.is_none() {
            debug!("stored session expired without refresh token");
            self.store(None, AuthEvent::SignedOut)?;
            return Ok(SessionSnapshot::Absent);
        }

        match self.refresh_session().await {
            Ok(session) => Ok(SessionSnapshot::Present(session)),
            Err(GateError::Provider { status, message }) if status < 500 => {
                warn!(status, "refresh rejected, clearing session: {}", message);
                self.store(None, AuthEvent::SignedOut)?;
                Ok(SessionSnapshot::Absent)
            }
            Err(e) => Err(e),
        }
    }

    fn on_session_change(&self) -> Subscription {
        self.channel.subscribe()
    }
}

impl SessionControl for RestAuthProvider {
    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<Session>> {
        self.sign_in_with_password(email, password).boxed()
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<()>> {
        RestAuthProvider::sign_out(self).boxed()
    }
}

fn load_session(path: &Path) -> Option<Session> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), "failed to read session file: {}", e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(path = %path.display(), "ignoring unreadable session file: {}", e);
            None
        }
    }
}

fn persist_session(path: &Path, session: Option<&Session>) -> Result<()> {
    match session {
        Some(session) => {
            let json = serde_json::to_string_pretty(session)?;
            std::fs::write(path, json)?;
        }
        None => match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        },
    }
    Ok(())
}
