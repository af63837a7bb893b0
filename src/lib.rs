//! # session-gate
//!
//! Session-gated navigation backed by a hosted auth provider.
//!
//! A [`SessionGate`] watches the sessions reported by an [`AuthProvider`]
//! and derives which top-level navigation subtree an application should
//! show: a loading placeholder, the sign-in flow, or the main screens.
//! Signing in dispatches a profile fetch to a [`ProfileStore`].
//!
//! ## Features
//!
//! - **Single-owner state**: one task applies every session update in order
//! - **Scoped subscriptions**: change subscriptions release exactly once
//! - **Development override**: skip login entirely for development builds
//! - **Hosted provider client**: password sign-in, refresh and profile rows
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_gate::{
//!     GateConfig, MemoryAuthProvider, MemoryProfileStore, NavigationMode, SessionGate,
//! };
//!
//! #[tokio::main]
//! async fn main() -> session_gate::Result<()> {
//!     session_gate::logging::try_init().ok();
//!
//!     let provider = Arc::new(MemoryAuthProvider::new());
//!     let profiles = Arc::new(MemoryProfileStore::new());
//!     let handle = SessionGate::new(provider, profiles, GateConfig::default()).start();
//!
//!     let mut navigation = handle.navigation();
//!     let state = navigation.wait_for(|s| !s.is_loading()).await?;
//!     assert_eq!(state.navigation(), NavigationMode::Auth);
//!
//!     handle.shutdown().await
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod logging;
pub mod remote;
pub mod session;

// Re-export commonly used types
pub use error::{GateError, Result};
pub use gate::{GateConfig, GateHandle, GateState, NavigationMode, NavigationWatch, SessionGate};
pub use remote::{ProviderConfig, RestAuthProvider, RestProfileStore};
pub use session::{
    AuthEvent, AuthProvider, MemoryAuthProvider, MemoryProfileStore, Profile, ProfileCache,
    ProfileEntry, ProfileStore, Session, SessionChange, SessionChannel, SessionControl,
    SessionSnapshot, Subscription, User, UserId,
};
