//! Tagged read-through cache for collection snapshots.
//!
//! Each logical collection (`providers_list`, `services_list`) is stored as a
//! serialized JSON snapshot carrying one or more tags. Invalidating a tag makes
//! every snapshot carrying it unreachable; the next read recomputes it.
//!
//! Snapshots remember the generation of each of their tags at the moment their
//! producer started. A snapshot whose producer raced an invalidation is never
//! served, even if it reached the store after the invalidation ran.

pub mod moka;

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub use self::moka::MokaTaggedCache;

pub const PROVIDERS_LIST: &str = "providers_list";
pub const SERVICES_LIST: &str = "services_list";
pub const PROVIDERS_TAG: &str = "providers_tag";
pub const SERVICES_TAG: &str = "services_tag";

/// Every tag known to the catalog; invalidating all of them clears the cache.
pub const ALL_TAGS: [&str; 2] = [PROVIDERS_TAG, SERVICES_TAG];

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Tag generations observed before a snapshot was computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStamp {
    pub epoch: u64,
    pub tags: Vec<(String, u64)>,
}

impl TagStamp {
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(t, _)| t.as_str())
    }
}

#[async_trait]
pub trait TaggedCache: Send + Sync {
    /// Capture the current generations of `tags`; pass the stamp to `insert`.
    async fn stamp(&self, tags: &[&str]) -> TagStamp;

    /// Fresh snapshot for `key`, or `None` when absent, expired or invalidated.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a snapshot under `key`. Dropped silently if `stamp` is already stale.
    async fn insert(&self, key: &str, value: String, stamp: TagStamp, ttl: Duration) -> Result<(), CacheError>;

    /// Make every snapshot carrying any of `tags` unreachable. Unknown tags are a no-op.
    async fn invalidate_tags(&self, tags: &[&str]) -> Result<(), CacheError>;

    async fn clear_all(&self) -> Result<(), CacheError>;

    async fn entry_count(&self) -> u64;
}

/// Return the cached snapshot for `key`, or run `producer`, store its output
/// under `tags` for `ttl` and return it.
///
/// Cache backend failures degrade to a recompute; only producer errors reach
/// the caller. Concurrent misses on the same key may each run the producer.
///
/// ```
/// use std::time::Duration;
/// use service::cache::{read_through, MokaTaggedCache, PROVIDERS_TAG};
///
/// let cache = MokaTaggedCache::new();
/// let first: Result<String, std::convert::Infallible> = tokio_test::block_on(
///     read_through(&cache, "demo", &[PROVIDERS_TAG], Duration::from_secs(60), || async { Ok("[1]".to_string()) }),
/// );
/// let second: Result<String, std::convert::Infallible> = tokio_test::block_on(
///     read_through(&cache, "demo", &[PROVIDERS_TAG], Duration::from_secs(60), || async { Ok("[2]".to_string()) }),
/// );
/// assert_eq!(first.unwrap(), "[1]");
/// assert_eq!(second.unwrap(), "[1]");
/// ```
pub async fn read_through<C, F, Fut, E>(
    cache: &C,
    key: &str,
    tags: &[&str],
    ttl: Duration,
    producer: F,
) -> Result<String, E>
where
    C: TaggedCache + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    match cache.get(key).await {
        Ok(Some(hit)) => {
            common::metrics::record_hit(key);
            debug!(action = "cache_hit", cache_key = %key, "serving cached snapshot");
            return Ok(hit);
        }
        Ok(None) => {}
        Err(e) => warn!(action = "cache_get_failed", cache_key = %key, error = %e, "cache read failed; recomputing"),
    }

    common::metrics::record_miss(key);
    debug!(action = "cache_miss", cache_key = %key, ttl_secs = ttl.as_secs(), tags = ?tags, "recomputing snapshot");
    let stamp = cache.stamp(tags).await;
    let fresh = producer().await?;
    if let Err(e) = cache.insert(key, fresh.clone(), stamp, ttl).await {
        warn!(action = "cache_store_failed", cache_key = %key, error = %e, "snapshot not cached");
    }
    Ok(fresh)
}

/// Invalidate `tags` after a committed write. Failures leave a stale snapshot
/// behind until its TTL runs out; they are logged, never returned.
pub async fn invalidate_after_write<C>(cache: &C, tags: &[&str], action: &'static str)
where
    C: TaggedCache + ?Sized,
{
    match cache.invalidate_tags(tags).await {
        Ok(()) => debug!(action, tags = ?tags, "cache invalidated"),
        Err(e) => warn!(action, tags = ?tags, error = %e, "cache invalidation failed; snapshot may be stale until expiry"),
    }
}
