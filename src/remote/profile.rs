//! Profile store backed by the hosted table API.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{check_response, RestAuthProvider};
use crate::session::{Profile, ProfileCache, ProfileEntry, ProfileStore, UserId};
use crate::Result;

/// Fully-owned description of one profile lookup, so it can move into a task.
struct ProfileRequest {
    client: reqwest::Client,
    url: String,
    anon_key: String,
    bearer: String,
    user_id: UserId,
}

impl ProfileRequest {
    async fn send(self) -> Result<Option<Profile>> {
        let filter = format!("eq.{}", self.user_id);
        let response = self
            .client
            .get(&self.url)
            .query(&[("id", filter.as_str()), ("select", "*")])
            .header("apikey", &self.anon_key)
            .header("Accept", "application/json")
            .bearer_auth(&self.bearer)
            .send()
            .await?;
        let response = check_response(response).await?;
        let mut rows: Vec<Profile> = response.json().await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }
}

/// Fetches profile rows into a shared [`ProfileCache`].
pub struct RestProfileStore {
    auth: Arc<RestAuthProvider>,
    cache: Arc<ProfileCache>,
}

impl RestProfileStore {
    /// Create a store that authenticates with the provider's session.
    pub fn new(auth: Arc<RestAuthProvider>) -> Self {
        Self {
            auth,
            cache: Arc::new(ProfileCache::new()),
        }
    }

    /// Cache that fetch results are written to.
    pub fn cache(&self) -> Arc<ProfileCache> {
        Arc::clone(&self.cache)
    }

    fn request(&self, user_id: &UserId) -> ProfileRequest {
        let config = self.auth.config();
        // Anonymous reads fall back to the anon key as bearer.
        let bearer = self
            .auth
            .access_token()
            .unwrap_or_else(|| config.anon_key.clone());
        ProfileRequest {
            client: self.auth.client().clone(),
            url: config.endpoint(&format!("/rest/v1/{}", config.profile_table)),
            anon_key: config.anon_key.clone(),
            bearer,
            user_id: user_id.clone(),
        }
    }

    /// Fetch a profile and wait for the answer, bypassing the cache.
    pub async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>> {
        self.request(user_id).send().await
    }
}

impl ProfileStore for RestProfileStore {
    fn fetch_profile(&self, user_id: &UserId) {
        if let Err(e) = self.cache.set(user_id.clone(), ProfileEntry::Loading) {
            warn!(user = %user_id, "failed to mark profile loading: {}", e);
        }

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(user = %user_id, "no runtime available for profile fetch");
                let failed = ProfileEntry::Failed("no async runtime".into());
                if let Err(e) = self.cache.set(user_id.clone(), failed) {
                    warn!(user = %user_id, "failed to record profile: {}", e);
                }
                return;
            }
        };

        let request = self.request(user_id);
        let cache = Arc::clone(&self.cache);
        handle.spawn(async move {
            let user_id = request.user_id.clone();
            let entry = match request.send().await {
                Ok(Some(profile)) => {
                    debug!(user = %user_id, "profile loaded");
                    ProfileEntry::Loaded(profile)
                }
                Ok(None) => {
                    debug!(user = %user_id, "no profile row");
                    ProfileEntry::Missing
                }
                Err(e) => {
                    warn!(user = %user_id, "profile fetch failed: {}", e);
                    ProfileEntry::Failed(e.to_string())
                }
            };
            if let Err(e) = cache.set(user_id.clone(), entry) {
                warn!(user = %user_id, "failed to record profile: {}", e);
            }
        });
    }

    fn forget_profile(&self, user_id: &UserId) {
        if let Err(e) = self.cache.remove(user_id) {
            warn!(user = %user_id, "failed to forget profile: {}", e);
        }
    }
}
