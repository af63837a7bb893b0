//! Gate state machine.

use serde::Serialize;

use crate::session::{SessionSnapshot, User, UserId};

/// Lifecycle state of the session gate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GateState {
    /// No session answer has arrived yet.
    #[default]
    Loading,
    /// A session with a user is active.
    Authenticated(User),
    /// No session, or a session without a user.
    Unauthenticated,
    /// Login bypassed for development builds. Absorbing.
    DevOverride,
}

/// Top-level navigation subtree derived from a [`GateState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// Loading placeholder, no navigation subtree.
    Loading,
    /// Main (authenticated) subtree.
    Main,
    /// Sign-in subtree.
    Auth,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEffect {
    /// Dispatch a profile fetch for this user.
    FetchProfile(UserId),
    /// Drop whatever was fetched for a user who is no longer authenticated.
    ForgetProfile(UserId),
}

impl GateState {
    /// Subtree rendered for this state.
    pub fn navigation(&self) -> NavigationMode {
        match self {
            GateState::Loading => NavigationMode::Loading,
            GateState::Authenticated(_) | GateState::DevOverride => NavigationMode::Main,
            GateState::Unauthenticated => NavigationMode::Auth,
        }
    }

    /// Authenticated user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            GateState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GateState::Loading)
    }

    /// Stable lowercase name, used in logs and the API.
    pub fn name(&self) -> &'static str {
        match self {
            GateState::Loading => "loading",
            GateState::Authenticated(_) => "authenticated",
            GateState::Unauthenticated => "unauthenticated",
            GateState::DevOverride => "dev_override",
        }
    }

    /// Compute the state that follows from observing `snapshot`.
    ///
    /// The result depends only on the snapshot, except that `DevOverride`
    /// never changes. When the authenticated user id changes, the previous
    /// user's profile is forgotten and the new user's profile is fetched,
    /// in that order.
    pub fn apply(&self, snapshot: &SessionSnapshot) -> (GateState, Vec<GateEffect>) {
        if matches!(self, GateState::DevOverride) {
            return (GateState::DevOverride, Vec::new());
        }

        let next = match snapshot.user() {
            Some(user) => GateState::Authenticated(user.clone()),
            None => GateState::Unauthenticated,
        };

        let mut effects = Vec::new();
        let previous = self.user().map(|u| &u.id);
        let current = next.user().map(|u| &u.id);
        if previous != current {
            if let Some(id) = previous {
                effects.push(GateEffect::ForgetProfile(id.clone()));
            }
            if let Some(id) = current {
                effects.push(GateEffect::FetchProfile(id.clone()));
            }
        }
        (next, effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn with_user(id: &str) -> SessionSnapshot {
        SessionSnapshot::Present(Session::new("t").with_user(User::new(id)))
    }

    #[test]
    fn test_rendering_contract() {
        assert_eq!(GateState::Loading.navigation(), NavigationMode::Loading);
        assert_eq!(GateState::DevOverride.navigation(), NavigationMode::Main);
        assert_eq!(
            GateState::Authenticated(User::new("u")).navigation(),
            NavigationMode::Main
        );
        assert_eq!(GateState::Unauthenticated.navigation(), NavigationMode::Auth);
    }

    #[test]
    fn test_loading_to_authenticated_requests_profile() {
        let (next, effect) = GateState::Loading.apply(&with_user("u-1"));
        assert_eq!(next, GateState::Authenticated(User::new("u-1")));
        assert_eq!(effect, vec![GateEffect::FetchProfile(UserId::new("u-1"))]);
    }

    #[test]
    fn test_absent_session_is_unauthenticated() {
        let (next, effect) = GateState::Loading.apply(&SessionSnapshot::Absent);
        assert_eq!(next, GateState::Unauthenticated);
        assert!(effect.is_empty());
    }

    #[test]
    fn test_session_without_user_is_unauthenticated() {
        let snapshot = SessionSnapshot::Present(Session::new("t"));
        let (next, effect) = GateState::Authenticated(User::new("u-1")).apply(&snapshot);
        assert_eq!(next, GateState::Unauthenticated);
        assert_eq!(effect, vec![GateEffect::ForgetProfile(UserId::new("u-1"))]);
    }

    #[test]
    fn test_same_user_does_not_refetch() {
        let state = GateState::Authenticated(User::new("u-1"));
        let (next, effect) = state.apply(&with_user("u-1"));
        assert_eq!(next, state);
        assert!(effect.is_empty());
    }

    #[test]
    fn test_user_switch_refetches() {
        let state = GateState::Authenticated(User::new("u-1"));
        let (_, effect) = state.apply(&with_user("u-2"));
        assert_eq!(
            effect,
            vec![
                GateEffect::ForgetProfile(UserId::new("u-1")),
                GateEffect::FetchProfile(UserId::new("u-2")),
            ]
        );
    }

    #[test]
    fn test_sign_out_forgets_profile() {
        let state = GateState::Authenticated(User::new("u-1"));
        let (next, effect) = state.apply(&SessionSnapshot::Absent);
        assert_eq!(next, GateState::Unauthenticated);
        assert_eq!(effect, vec![GateEffect::ForgetProfile(UserId::new("u-1"))]);
    }

    #[test]
    fn test_dev_override_is_absorbing() {
        for snapshot in [SessionSnapshot::Absent, with_user("u-1")] {
            let (next, effect) = GateState::DevOverride.apply(&snapshot);
            assert_eq!(next, GateState::DevOverride);
            assert!(effect.is_empty());
        }
    }

    #[test]
    fn test_outcome_depends_only_on_latest_snapshot() {
        let sequences = [
            vec![SessionSnapshot::Absent, with_user("u-1")],
            vec![with_user("u-2"), SessionSnapshot::Absent, with_user("u-1")],
            vec![with_user("u-1")],
        ];
        for events in sequences {
            let mut state = GateState::Loading;
            for snapshot in &events {
                state = state.apply(snapshot).0;
            }
            assert_eq!(state, GateState::Authenticated(User::new("u-1")));
        }
    }

    #[test]
    fn test_default_and_names() {
        assert!(GateState::default().is_loading());
        assert_eq!(GateState::DevOverride.name(), "dev_override");
        assert_eq!(
            serde_json::to_string(&NavigationMode::Auth).unwrap(),
            "\"auth\""
        );
    }
}
