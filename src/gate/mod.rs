//! Session-gated navigation.
//!
//! A [`SessionGate`] decides which top-level navigation subtree is active
//! from the sessions an [`AuthProvider`](crate::session::AuthProvider)
//! reports. Consumers read the outcome through a [`NavigationWatch`].

mod machine;
mod state;
mod watch;

pub use machine::{GateConfig, GateHandle, SessionGate};
pub use state::{GateEffect, GateState, NavigationMode};
pub use watch::NavigationWatch;
