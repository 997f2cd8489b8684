use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::{CacheError, MokaTaggedCache, TagStamp, TaggedCache, DEFAULT_TTL};
use crate::dto::ProviderInput;
use crate::repository::InMemoryCatalog;

use super::{ProviderResource, ServiceResource};

/// Moka cache that remembers every tag it was asked to invalidate.
#[derive(Default)]
pub(crate) struct RecordingCache {
    pub(crate) inner: MokaTaggedCache,
    seen: Mutex<Vec<String>>,
}

impl RecordingCache {
    pub(crate) fn invalidated(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn reset(&self) {
        self.seen.lock().unwrap().clear();
    }
}

#[async_trait]
impl TaggedCache for RecordingCache {
    async fn stamp(&self, tags: &[&str]) -> TagStamp {
        self.inner.stamp(tags).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(key).await
    }

    async fn insert(&self, key: &str, value: String, stamp: TagStamp, ttl: Duration) -> Result<(), CacheError> {
        self.inner.insert(key, value, stamp, ttl).await
    }

    async fn invalidate_tags(&self, tags: &[&str]) -> Result<(), CacheError> {
        self.seen.lock().unwrap().extend(tags.iter().map(|t| t.to_string()));
        self.inner.invalidate_tags(tags).await
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.inner.clear_all().await
    }

    async fn entry_count(&self) -> u64 {
        self.inner.entry_count().await
    }
}

pub(crate) struct Fixture {
    pub(crate) store: Arc<InMemoryCatalog>,
    pub(crate) cache: Arc<RecordingCache>,
    pub(crate) providers: ProviderResource,
    pub(crate) services: ServiceResource,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let store = Arc::new(InMemoryCatalog::new());
        let cache = Arc::new(RecordingCache::default());
        let providers = ProviderResource::new(store.clone(), cache.clone(), DEFAULT_TTL);
        let services = ServiceResource::new(store.clone(), store.clone(), cache.clone(), DEFAULT_TTL);
        Self { store, cache, providers, services }
    }
}

pub(crate) fn jane(email: &str) -> ProviderInput {
    ProviderInput {
        name: Some("Jane Doe".into()),
        email: Some(email.into()),
        phone: Some("+15551234567".into()),
        address: Some("1 Main Street".into()),
    }
}
