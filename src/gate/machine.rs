//! Session gate runtime.
//!
//! The gate owns its state inside a single tokio task. The initial session
//! fetch and the change subscription both feed that task, so every update
//! goes through one serialized path and is published on a watch channel.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{GateEffect, GateState, NavigationMode, NavigationWatch};
use crate::error::GateError;
use crate::session::{AuthProvider, ProfileStore, SessionSnapshot, Subscription};
use crate::Result;

/// Startup options for a [`SessionGate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateConfig {
    /// Bypass login entirely and render the main subtree.
    pub dev_skip_login: bool,
}

impl GateConfig {
    pub fn dev_override() -> Self {
        Self {
            dev_skip_login: true,
        }
    }
}

/// Session-gated navigation state machine.
pub struct SessionGate<A, P> {
    provider: Arc<A>,
    profiles: Arc<P>,
    config: GateConfig,
}

impl<A: AuthProvider, P: ProfileStore> SessionGate<A, P> {
    pub fn new(provider: Arc<A>, profiles: Arc<P>, config: GateConfig) -> Self {
        Self {
            provider,
            profiles,
            config,
        }
    }

    /// Start the gate.
    ///
    /// With the development override the gate is `DevOverride` from the
    /// first observation and never talks to the provider. Otherwise it
    /// subscribes to changes, issues the initial fetch and returns while
    /// the gate is still `Loading`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> GateHandle {
        if self.config.dev_skip_login {
            warn!("development override active: login is bypassed");
            let (tx, rx) = watch::channel(GateState::DevOverride);
            return GateHandle {
                watch: NavigationWatch::new(rx),
                shutdown: None,
                task: None,
                retained: Some(tx),
            };
        }

        let (tx, rx) = watch::channel(GateState::Loading);
        let subscription = self.provider.on_session_change();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        debug!("session gate starting");
        let task = tokio::spawn(run_gate(
            self.provider,
            self.profiles,
            subscription,
            tx,
            shutdown_rx,
        ));

        GateHandle {
            watch: NavigationWatch::new(rx),
            shutdown: Some(shutdown_tx),
            task: Some(task),
            retained: None,
        }
    }
}

/// Owner of a running gate.
///
/// Dropping the handle tears the gate down; [`GateHandle::shutdown`] does the
/// same and waits for the update task to finish.
#[derive(Debug)]
pub struct GateHandle {
    watch: NavigationWatch,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    retained: Option<watch::Sender<GateState>>,
}

impl GateHandle {
    /// Observer for the gate's state.
    pub fn navigation(&self) -> NavigationWatch {
        self.watch.clone()
    }

    pub fn state(&self) -> GateState {
        self.watch.state()
    }

    pub fn mode(&self) -> NavigationMode {
        self.watch.mode()
    }

    /// Whether the update task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the gate and release its subscription.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.retained.take();
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| GateError::TaskFailed(e.to_string()))?;
        }
        debug!("session gate stopped");
        Ok(())
    }
}

impl Drop for GateHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn run_gate<A: AuthProvider, P: ProfileStore>(
    provider: Arc<A>,
    profiles: Arc<P>,
    mut subscription: Subscription,
    state: watch::Sender<GateState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let fetch = provider.current_session();
    tokio::pin!(fetch);
    let mut fetch_pending = true;
    let mut stream_open = true;

    loop {
        tokio::select! {
            biased;

            // Fires on explicit shutdown and when the handle is dropped.
            _ = &mut shutdown => break,

            result = &mut fetch, if fetch_pending => {
                fetch_pending = false;
                let snapshot = match result {
                    Ok(snapshot) => snapshot,
                    Err(e) => {
                        warn!("initial session fetch failed, treating as signed out: {}", e);
                        SessionSnapshot::Absent
                    }
                };
                apply_snapshot(&state, profiles.as_ref(), &snapshot, "initial_fetch");
            }

            change = subscription.next(), if stream_open => match change {
                Some(change) => {
                    debug!(event = %change.event, "session change received");
                    apply_snapshot(&state, profiles.as_ref(), &change.session, "change");
                }
                None => {
                    stream_open = false;
                    warn!("session change stream closed by provider");
                }
            },
        }
    }

    subscription.unsubscribe();
    debug!("session gate released its subscription");
}

/// Apply one snapshot and run the resulting effect.
fn apply_snapshot<P: ProfileStore>(
    state: &watch::Sender<GateState>,
    profiles: &P,
    snapshot: &SessionSnapshot,
    source: &'static str,
) {
    let mut effects = Vec::new();
    state.send_if_modified(|current| {
        let (next, requested) = current.apply(snapshot);
        effects = requested;
        if *current == next {
            return false;
        }
        info!(from = current.name(), to = next.name(), source, "gate transition");
        *current = next;
        true
    });

    for effect in effects {
        match effect {
            GateEffect::FetchProfile(user_id) => {
                debug!(user = %user_id, "dispatching profile fetch");
                profiles.fetch_profile(&user_id);
            }
            GateEffect::ForgetProfile(user_id) => {
                debug!(user = %user_id, "forgetting profile");
                profiles.forget_profile(&user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{
        AuthEvent, MemoryAuthProvider, MemoryProfileStore, Session, User, UserId,
    };
    use std::time::Duration;

    fn signed_in(id: &str) -> SessionSnapshot {
        SessionSnapshot::Present(Session::new("t").with_user(User::new(id)))
    }

    fn gate(
        provider: &Arc<MemoryAuthProvider>,
        profiles: &Arc<MemoryProfileStore>,
        config: GateConfig,
    ) -> SessionGate<MemoryAuthProvider, MemoryProfileStore> {
        SessionGate::new(Arc::clone(provider), Arc::clone(profiles), config)
    }

    #[tokio::test]
    async fn test_dev_override_skips_provider() {
        let provider = Arc::new(MemoryAuthProvider::new());
        let profiles = Arc::new(MemoryProfileStore::new());

        let handle = gate(&provider, &profiles, GateConfig::dev_override()).start();
        assert_eq!(handle.state(), GateState::DevOverride);
        assert_eq!(handle.mode(), NavigationMode::Main);
        assert_eq!(provider.subscriber_count(), 0);
        assert_eq!(provider.fetch_count(), 0);
        assert!(!handle.is_running());
    }

    #[tokio::test]
    async fn test_starts_loading() {
        let provider = Arc::new(MemoryAuthProvider::new().with_fetch_delay(Duration::from_secs(60)));
        let profiles = Arc::new(MemoryProfileStore::new());

        let handle = gate(&provider, &profiles, GateConfig::default()).start();
        assert_eq!(handle.mode(), NavigationMode::Loading);
        assert_eq!(provider.subscriber_count(), 1);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_failure_collapses_to_auth() {
        let provider = Arc::new(MemoryAuthProvider::new());
        provider.set_fetch_failure(true);
        let profiles = Arc::new(MemoryProfileStore::new());

        let handle = gate(&provider, &profiles, GateConfig::default()).start();
        let mut watch = handle.navigation();
        let state = watch.wait_for(|s| !s.is_loading()).await.unwrap();
        assert_eq!(state, GateState::Unauthenticated);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_releases_subscription() {
        let provider = Arc::new(MemoryAuthProvider::new());
        let profiles = Arc::new(MemoryProfileStore::new());

        let handle = gate(&provider, &profiles, GateConfig::default()).start();
        assert_eq!(provider.subscriber_count(), 1);
        handle.shutdown().await.unwrap();
        assert_eq!(provider.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_token_refresh_keeps_single_profile_fetch() {
        let provider = Arc::new(MemoryAuthProvider::new().with_session(
            Session::new("t1").with_user(User::new("u-1")),
        ));
        let profiles = Arc::new(MemoryProfileStore::new());

        let handle = gate(&provider, &profiles, GateConfig::default()).start();
        let mut watch = handle.navigation();
        watch.wait_for_mode(NavigationMode::Main).await.unwrap();

        provider
            .set_session(AuthEvent::TokenRefreshed, signed_in("u-1"))
            .unwrap();
        provider.set_session(AuthEvent::UserUpdated, SessionSnapshot::Absent).unwrap();
        watch.wait_for_mode(NavigationMode::Auth).await.unwrap();

        assert_eq!(profiles.requests(), vec![UserId::new("u-1")]);
        handle.shutdown().await.unwrap();
    }
}
