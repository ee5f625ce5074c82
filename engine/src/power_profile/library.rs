use std::sync::Arc;

use moka::future::Cache;

use crate::core::error::ProfileError;

use super::{PowerProfile, ProfileFingerprint, ProfileLoader};

/// Lazily loads and memoizes power profiles keyed by fingerprint. At most
/// one load is in flight per fingerprint: concurrent requesters share the
/// pending load and all receive the same result, success or failure.
/// Loads for distinct fingerprints never block each other. Loaded profiles
/// live until explicitly invalidated.
pub struct ProfileLibrary<L> {
    loader: L,
    profiles: Cache<ProfileFingerprint, Arc<PowerProfile>>,
}

impl<L: ProfileLoader> ProfileLibrary<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            profiles: Cache::builder().build(),
        }
    }

    pub async fn get_profile(&self, fingerprint: &ProfileFingerprint) -> Result<Arc<PowerProfile>, ProfileError> {
        self.profiles
            .try_get_with(fingerprint.clone(), async {
                tracing::debug!("No cached profile for {}, loading from library", fingerprint);
                let data = self.loader.load_model(fingerprint).await?;
                PowerProfile::from_model_data(fingerprint, data).map(Arc::new)
            })
            .await
            .map_err(|e: Arc<ProfileError>| {
                tracing::error!("Loading power profile for {} failed: {}", fingerprint, e);
                (*e).clone()
            })
    }

    /// Drops the cached profile, e.g. after a custom directory was
    /// reconfigured. The next request loads it again.
    pub async fn invalidate(&self, fingerprint: &ProfileFingerprint) {
        tracing::debug!("Invalidating cached profile for {}", fingerprint);
        self.profiles.invalidate(fingerprint).await;
    }
}
