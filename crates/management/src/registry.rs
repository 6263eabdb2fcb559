//! Process-wide store handle: initialized once at startup, torn down at exit.

use campaign_core::config::StoreConfig;
use campaign_core::error::{CampaignError, CampaignResult};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use crate::store::MemoryStore;

static STORE: RwLock<Option<Arc<MemoryStore>>> = parking_lot::const_rwlock(None);

/// Open the store. Calling again while a store is live returns that store.
pub fn init(config: &StoreConfig) -> Arc<MemoryStore> {
    let mut slot = STORE.write();
    if let Some(existing) = slot.as_ref() {
        warn!("Store already initialized; reusing existing handle");
        return existing.clone();
    }
    let store = Arc::new(MemoryStore::with_config(config));
    *slot = Some(store.clone());
    store
}

/// The live store, or `StoreUnavailable` before `init` / after `teardown`.
pub fn current() -> CampaignResult<Arc<MemoryStore>> {
    STORE.read().clone().ok_or_else(|| {
        CampaignError::StoreUnavailable("store has not been initialized".to_string())
    })
}

/// Close and release the store. Handles still held elsewhere start failing.
pub fn teardown() {
    if let Some(store) = STORE.write().take() {
        store.close();
        info!("Store torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_core::store::CustomerStore;

    // One test: the registry is global and tests run in parallel.
    #[tokio::test]
    async fn test_registry_lifecycle() {
        teardown();
        assert!(matches!(current(), Err(CampaignError::StoreUnavailable(_))));

        let first = init(&StoreConfig::default());
        let second = init(&StoreConfig::default());
        assert!(Arc::ptr_eq(&first, &second));
        assert!(current().is_ok());

        teardown();
        assert!(current().is_err());
        assert!(first.scan().await.is_err());

        let reopened = init(&StoreConfig::default());
        assert!(reopened.scan().await.is_ok());
        teardown();
    }
}
