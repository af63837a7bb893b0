//! In-process auth provider and profile store.
//!
//! Used for development builds (no hosted provider configured) and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::{debug, warn};

use super::{
    AuthEvent, AuthProvider, Profile, ProfileCache, ProfileEntry, ProfileStore, Session,
    SessionChange, SessionChannel, SessionControl, SessionSnapshot, Subscription, User, UserId,
};
use crate::error::GateError;
use crate::Result;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: User,
}

/// Auth provider that keeps its session in memory.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    current: RwLock<SessionSnapshot>,
    accounts: RwLock<HashMap<String, Account>>,
    channel: SessionChannel,
    fetch_delay: Option<Duration>,
    fail_fetch: AtomicBool,
    fetch_count: AtomicUsize,
    token_counter: AtomicU64,
}

impl MemoryAuthProvider {
    /// Create a provider with no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given session already active.
    pub fn with_session(self, session: Session) -> Self {
        if let Ok(mut current) = self.current.write() {
            *current = SessionSnapshot::Present(session);
        }
        self
    }

    /// Register an account for [`MemoryAuthProvider::sign_in`].
    pub fn with_account(self, email: impl Into<String>, password: impl Into<String>, user: User) -> Self {
        if let Ok(mut accounts) = self.accounts.write() {
            accounts.insert(
                email.into(),
                Account {
                    password: password.into(),
                    user,
                },
            );
        }
        self
    }

    /// Delay every `current_session` answer.
    ///
    /// The snapshot is taken when the call starts, so a delayed answer can
    /// be older than notifications emitted meanwhile.
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Make subsequent `current_session` calls fail.
    pub fn set_fetch_failure(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Replace the session and notify subscribers.
    pub fn set_session(&self, event: AuthEvent, snapshot: SessionSnapshot) -> Result<()> {
        {
            let mut current = self.current.write().map_err(|_| GateError::LockPoisoned)?;
            *current = snapshot.clone();
        }
        let delivered = self.channel.emit(SessionChange::new(event, snapshot));
        debug!(%event, delivered, "memory provider session changed");
        Ok(())
    }

    /// Sign in against the registered accounts.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let account = {
            let accounts = self.accounts.read().map_err(|_| GateError::LockPoisoned)?;
            accounts.get(email).cloned()
        };
        let account = match account {
            Some(account) if account.password == password => account,
            _ => return Err(GateError::InvalidCredentials),
        };

        let n = self.token_counter.fetch_add(1, Ordering::Relaxed);
        let session = Session::new(format!("mem-{n:08x}")).with_user(account.user);
        self.set_session(AuthEvent::SignedIn, SessionSnapshot::Present(session.clone()))?;
        Ok(session)
    }

    /// Clear the session.
    pub fn sign_out(&self) -> Result<()> {
        self.set_session(AuthEvent::SignedOut, SessionSnapshot::Absent)
    }

    /// Snapshot without going through the async fetch path.
    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let current = self.current.read().map_err(|_| GateError::LockPoisoned)?;
        Ok(current.clone())
    }

    /// Number of live change subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    /// Number of `current_session` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl AuthProvider for MemoryAuthProvider {
    async fn current_session(&self) -> Result<SessionSnapshot> {
        let snapshot = self.snapshot()?;
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GateError::Provider {
                status: 503,
                message: "memory provider configured to fail".into(),
            });
        }
        Ok(snapshot)
    }

    fn on_session_change(&self) -> Subscription {
        self.channel.subscribe()
    }
}

impl SessionControl for MemoryAuthProvider {
    fn sign_in<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<Session>> {
        futures_util::future::ready(MemoryAuthProvider::sign_in(self, email, password)).boxed()
    }

    fn sign_out(&self) -> BoxFuture<'_, Result<()>> {
        futures_util::future::ready(MemoryAuthProvider::sign_out(self)).boxed()
    }
}

/// Profile store that answers from a fixed set of profiles.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    requests: Mutex<Vec<UserId>>,
    known: RwLock<HashMap<UserId, Profile>>,
    cache: Arc<ProfileCache>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a profile available to fetches.
    pub fn with_profile(self, profile: Profile) -> Self {
        if let Ok(mut known) = self.known.write() {
            known.insert(profile.id.clone(), profile);
        }
        self
    }

    /// Cache that fetch results are written to.
    pub fn cache(&self) -> Arc<ProfileCache> {
        Arc::clone(&self.cache)
    }

    /// Every requested user id, in dispatch order.
    pub fn requests(&self) -> Vec<UserId> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl ProfileStore for MemoryProfileStore {
    fn fetch_profile(&self, user_id: &UserId) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(user_id.clone());
        }

        let entry = match self.known.read() {
            Ok(known) => known
                .get(user_id)
                .cloned()
                .map_or(ProfileEntry::Missing, ProfileEntry::Loaded),
            Err(_) => ProfileEntry::Failed("profile table lock poisoned".into()),
        };

        if let Err(e) = self.cache.set(user_id.clone(), entry) {
            warn!(user = %user_id, "failed to record profile: {}", e);
        }
    }

    fn forget_profile(&self, user_id: &UserId) {
        if let Err(e) = self.cache.remove(user_id) {
            warn!(user = %user_id, "failed to forget profile: {}", e);
        }
    }
}
