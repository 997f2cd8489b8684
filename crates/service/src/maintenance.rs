//! Operator-triggered cache clearing.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{TaggedCache, ALL_TAGS};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearCacheRequest {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearCacheResponse {
    pub cleared: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClearScope {
    All,
    Tags(Vec<String>),
}

impl ClearCacheRequest {
    /// `all` wins over an explicit tag list; neither is a caller error.
    pub fn scope(self) -> Result<ClearScope, ServiceError> {
        if self.all {
            return Ok(ClearScope::All);
        }
        let tags: Vec<String> = self.tags.into_iter().map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect();
        if tags.is_empty() {
            return Err(ServiceError::invalid("tags", "Please specify tags to clear or use --all option."));
        }
        Ok(ClearScope::Tags(tags))
    }
}

/// Clear the requested scope. Unlike write-path invalidation, backend
/// failures are returned to the operator.
pub async fn clear(cache: &dyn TaggedCache, scope: ClearScope) -> Result<ClearCacheResponse, ServiceError> {
    let cleared = match scope {
        ClearScope::All => {
            info!(action = "cache_clear", mode = "all", "clearing all tagged cache");
            cache.invalidate_tags(&ALL_TAGS).await?;
            cache.clear_all().await?;
            ALL_TAGS.iter().map(|t| t.to_string()).collect()
        }
        ClearScope::Tags(tags) => {
            info!(action = "cache_clear", mode = "tags", tags = ?tags, "clearing tagged cache");
            let refs: Vec<&str> = tags.iter().map(String::as_str).collect();
            cache.invalidate_tags(&refs).await?;
            tags
        }
    };
    Ok(ClearCacheResponse { cleared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MokaTaggedCache, DEFAULT_TTL, PROVIDERS_LIST, PROVIDERS_TAG, SERVICES_LIST, SERVICES_TAG};

    async fn warm(cache: &MokaTaggedCache) {
        for (key, tag) in [(PROVIDERS_LIST, PROVIDERS_TAG), (SERVICES_LIST, SERVICES_TAG)] {
            let stamp = cache.stamp(&[tag]).await;
            cache.insert(key, "[]".into(), stamp, DEFAULT_TTL).await.unwrap();
        }
    }

    #[test]
    fn neither_tags_nor_all_is_rejected() {
        let err = ClearCacheRequest::default().scope().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
        let err = ClearCacheRequest { tags: vec!["  ".into()], all: false }.scope().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn all_overrides_tags() {
        let req = ClearCacheRequest { tags: vec!["x".into()], all: true };
        assert_eq!(req.scope().unwrap(), ClearScope::All);
    }

    #[tokio::test]
    async fn clearing_one_tag_keeps_the_other_collection() {
        let cache = MokaTaggedCache::new();
        warm(&cache).await;
        let out = clear(&cache, ClearScope::Tags(vec![SERVICES_TAG.into()])).await.unwrap();
        assert_eq!(out.cleared, vec![SERVICES_TAG]);
        assert!(cache.get(SERVICES_LIST).await.unwrap().is_none());
        assert!(cache.get(PROVIDERS_LIST).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_all_reports_both_tags() {
        let cache = MokaTaggedCache::new();
        warm(&cache).await;
        let out = clear(&cache, ClearScope::All).await.unwrap();
        assert_eq!(out.cleared, vec![PROVIDERS_TAG, SERVICES_TAG]);
        assert!(cache.get(PROVIDERS_LIST).await.unwrap().is_none());
        assert!(cache.get(SERVICES_LIST).await.unwrap().is_none());
    }
}
