//! Session management module.
//!
//! This module provides the session model, the change subscription
//! machinery and the collaborator interfaces the gate consumes, along
//! with in-memory implementations of them.

mod channel;
mod memory;
mod model;
mod profile;
mod provider;

pub use channel::{SessionChannel, Subscription};
pub use memory::{MemoryAuthProvider, MemoryProfileStore};
pub use model::{AuthEvent, Session, SessionChange, SessionSnapshot, User, UserId};
pub(crate) use model::unix_now;
pub use profile::{Profile, ProfileCache, ProfileEntry};
pub use provider::{AuthProvider, ProfileStore, SessionControl};
