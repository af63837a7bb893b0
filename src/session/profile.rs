//! Profile records and the cache that profile fetches land in.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::UserId;
use crate::error::GateError;
use crate::Result;

/// A row of the profiles table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    /// Every other column, as returned by the table API.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Profile {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }
}

/// Fetch status of one user's profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ProfileEntry {
    Loading,
    Loaded(Profile),
    Missing,
    Failed(String),
}

/// Thread-safe map of profile fetch results.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: RwLock<HashMap<UserId, ProfileEntry>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome (or start) of a fetch.
    pub fn set(&self, user_id: UserId, entry: ProfileEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GateError::LockPoisoned)?;
        entries.insert(user_id, entry);
        Ok(())
    }

    pub fn get(&self, user_id: &UserId) -> Result<Option<ProfileEntry>> {
        let entries = self.entries.read().map_err(|_| GateError::LockPoisoned)?;
        Ok(entries.get(user_id).cloned())
    }

    /// Loaded profile for a user, if any.
    pub fn profile(&self, user_id: &UserId) -> Option<Profile> {
        match self.get(user_id) {
            Ok(Some(ProfileEntry::Loaded(profile))) => Some(profile),
            _ => None,
        }
    }

    pub fn remove(&self, user_id: &UserId) -> Result<Option<ProfileEntry>> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GateError::LockPoisoned)?;
        Ok(entries.remove(user_id))
    }

    pub fn count(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }
}
