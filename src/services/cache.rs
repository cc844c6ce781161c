use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::models::Candidate;
use crate::services::store::{CatalogStore, StoreError};

const CATALOG_KEY: &str = "catalog:tribes";

/// In-process TTL cache in front of a catalog store
///
/// The full tribe listing is read on every suggestion request but changes
/// rarely, so it is kept for `ttl_secs`. Single-tribe lookups go straight
/// to the inner store.
pub struct CachedCatalog {
    inner: Arc<dyn CatalogStore>,
    cache: moka::future::Cache<&'static str, Arc<Vec<Candidate>>>,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn CatalogStore>, capacity: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, cache }
    }
}

#[async_trait]
impl CatalogStore for CachedCatalog {
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        if let Some(tribes) = self.cache.get(CATALOG_KEY).await {
            tracing::trace!("Catalog cache hit");
            return Ok(tribes.as_ref().clone());
        }

        let tribes = self.inner.list_candidates().await?;
        self.cache.insert(CATALOG_KEY, Arc::new(tribes.clone())).await;
        tracing::trace!("Catalog cache miss, loaded {} tribes", tribes.len());

        Ok(tribes)
    }

    async fn find_candidate(&self, id: i64) -> Result<Option<Candidate>, StoreError> {
        self.inner.find_candidate(id).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}
