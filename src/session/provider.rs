//! Collaborator interfaces consumed by the session gate.

use std::future::Future;

use futures_util::future::BoxFuture;

use super::{Session, SessionSnapshot, Subscription, UserId};
use crate::Result;

/// Source of sessions and session change notifications.
pub trait AuthProvider: Send + Sync + 'static {
    /// Fetch the current session once.
    fn current_session(&self) -> impl Future<Output = Result<SessionSnapshot>> + Send;

    /// Subscribe to session changes for as long as the handle lives.
    fn on_session_change(&self) -> Subscription;
}

/// Sink for profile fetch requests.
///
/// Fetching is fire-and-forget: the result lands wherever the store keeps
/// profiles, never back in the caller.
pub trait ProfileStore: Send + Sync + 'static {
    fn fetch_profile(&self, user_id: &UserId);

    /// Discard anything kept for a user who signed out or was replaced.
    fn forget_profile(&self, user_id: &UserId);
}

/// Sign-in/sign-out operations exposed to the HTTP layer.
pub trait SessionControl: Send + Sync {
    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<Session>>;

    fn sign_out(&self) -> BoxFuture<'_, Result<()>>;
}
