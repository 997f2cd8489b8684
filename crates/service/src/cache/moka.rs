use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use dashmap::DashMap;
use ::moka::future::Cache;

use super::{CacheError, TagStamp, TaggedCache, DEFAULT_TTL};

#[derive(Debug)]
struct CachedSnapshot {
    value: String,
    stamp: TagStamp,
    expires_at: Instant,
}

/// In-process tagged cache on top of `moka`.
///
/// Tag generations live in a `DashMap`; bumping a generation is what actually
/// invalidates, removing the keys from moka only frees memory early.
pub struct MokaTaggedCache {
    entries: Cache<String, Arc<CachedSnapshot>>,
    generations: DashMap<String, u64>,
    tag_keys: DashMap<String, HashSet<String>>,
    epoch: AtomicU64,
}

impl Default for MokaTaggedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MokaTaggedCache {
    pub fn new() -> Self {
        Self::with_config(1024, DEFAULT_TTL)
    }

    /// `max_ttl` bounds how long moka keeps any entry; per-insert TTLs are
    /// enforced on read and may be shorter.
    pub fn with_config(max_capacity: u64, max_ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity.max(1))
            .time_to_live(max_ttl.max(Duration::from_secs(1)))
            .build();
        Self {
            entries,
            generations: DashMap::new(),
            tag_keys: DashMap::new(),
            epoch: AtomicU64::new(0),
        }
    }

    fn generation(&self, tag: &str) -> u64 {
        self.generations.get(tag).map(|g| *g).unwrap_or(0)
    }

    fn is_current(&self, stamp: &TagStamp) -> bool {
        stamp.epoch == self.epoch.load(Ordering::Acquire)
            && stamp.tags.iter().all(|(tag, gen)| self.generation(tag) == *gen)
    }
}

#[async_trait]
impl TaggedCache for MokaTaggedCache {
    async fn stamp(&self, tags: &[&str]) -> TagStamp {
        TagStamp {
            epoch: self.epoch.load(Ordering::Acquire),
            tags: tags.iter().map(|t| (t.to_string(), self.generation(t))).collect(),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let Some(snapshot) = self.entries.get(key).await else { return Ok(None) };
        if snapshot.expires_at <= Instant::now() || !self.is_current(&snapshot.stamp) {
            self.entries.invalidate(key).await;
            return Ok(None);
        }
        Ok(Some(snapshot.value.clone()))
    }

    async fn insert(&self, key: &str, value: String, stamp: TagStamp, ttl: Duration) -> Result<(), CacheError> {
        if !self.is_current(&stamp) {
            tracing::debug!(action = "cache_store_skipped", cache_key = %key, "snapshot computed before an invalidation");
            return Ok(());
        }
        for tag in stamp.tag_names() {
            self.tag_keys.entry(tag.to_string()).or_default().insert(key.to_string());
        }
        let snapshot = CachedSnapshot { value, stamp, expires_at: Instant::now() + ttl };
        self.entries.insert(key.to_string(), Arc::new(snapshot)).await;
        Ok(())
    }

    async fn invalidate_tags(&self, tags: &[&str]) -> Result<(), CacheError> {
        for tag in tags {
            *self.generations.entry(tag.to_string()).or_insert(0) += 1;
            common::metrics::record_invalidation(tag);
            let keys = self.tag_keys.remove(*tag).map(|(_, keys)| keys).unwrap_or_default();
            for key in keys {
                self.entries.invalidate(&key).await;
            }
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.tag_keys.clear();
        self.entries.invalidate_all();
        Ok(())
    }

    async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{PROVIDERS_LIST, PROVIDERS_TAG, SERVICES_LIST, SERVICES_TAG};

    async fn put(cache: &MokaTaggedCache, key: &str, value: &str, tags: &[&str]) {
        let stamp = cache.stamp(tags).await;
        cache.insert(key, value.to_string(), stamp, DEFAULT_TTL).await.unwrap();
    }

    #[tokio::test]
    async fn invalidating_one_tag_spares_unrelated_snapshots() {
        let cache = MokaTaggedCache::new();
        put(&cache, PROVIDERS_LIST, "[\"p\"]", &[PROVIDERS_TAG, SERVICES_TAG]).await;
        put(&cache, "only_providers", "[]", &[PROVIDERS_TAG]).await;

        cache.invalidate_tags(&[SERVICES_TAG]).await.unwrap();

        assert_eq!(cache.get(PROVIDERS_LIST).await.unwrap(), None);
        assert_eq!(cache.get("only_providers").await.unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn stamp_taken_before_invalidation_is_not_stored() {
        let cache = MokaTaggedCache::new();
        let stale = cache.stamp(&[SERVICES_TAG]).await;
        cache.invalidate_tags(&[SERVICES_TAG]).await.unwrap();
        cache.insert(SERVICES_LIST, "old".into(), stale, DEFAULT_TTL).await.unwrap();
        assert_eq!(cache.get(SERVICES_LIST).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_tag_is_a_noop() {
        let cache = MokaTaggedCache::new();
        put(&cache, PROVIDERS_LIST, "[]", &[PROVIDERS_TAG]).await;
        cache.invalidate_tags(&["never_used"]).await.unwrap();
        assert!(cache.get(PROVIDERS_LIST).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_all_drops_everything() {
        let cache = MokaTaggedCache::new();
        put(&cache, PROVIDERS_LIST, "[]", &[PROVIDERS_TAG]).await;
        put(&cache, SERVICES_LIST, "[]", &[SERVICES_TAG]).await;
        cache.clear_all().await.unwrap();
        assert_eq!(cache.get(PROVIDERS_LIST).await.unwrap(), None);
        assert_eq!(cache.get(SERVICES_LIST).await.unwrap(), None);
    }

    #[tokio::test]
    async fn per_entry_ttl_expires_before_cache_ttl() {
        let cache = MokaTaggedCache::new();
        let stamp = cache.stamp(&[PROVIDERS_TAG]).await;
        cache.insert(PROVIDERS_LIST, "[]".into(), stamp, Duration::from_millis(20)).await.unwrap();
        assert!(cache.get(PROVIDERS_LIST).await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get(PROVIDERS_LIST).await.unwrap(), None);
    }
}
