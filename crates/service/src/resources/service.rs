use std::{sync::Arc, time::Duration};

use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::{invalidate_after_write, read_through, TaggedCache, PROVIDERS_TAG, SERVICES_LIST, SERVICES_TAG};
use crate::dto::{ServiceInput, ServiceUpdateInput, ServiceView};
use crate::errors::ServiceError;
use crate::repository::{ProviderRepository, ServiceRepository};
use crate::validation::{validate_service_create, validate_service_update};

use super::{describe_violations, provider::log_failure};

const RESOURCE: &str = "Service";

/// Provider read views embed services, so every service write stales both
/// collections.
const WRITE_TAGS: [&str; 2] = [SERVICES_TAG, PROVIDERS_TAG];

/// Service CRUD with the `services_list` read-through snapshot.
pub struct ServiceResource {
    services: Arc<dyn ServiceRepository>,
    providers: Arc<dyn ProviderRepository>,
    cache: Arc<dyn TaggedCache>,
    ttl: Duration,
}

impl ServiceResource {
    pub fn new(
        services: Arc<dyn ServiceRepository>,
        providers: Arc<dyn ProviderRepository>,
        cache: Arc<dyn TaggedCache>,
        ttl: Duration,
    ) -> Self {
        Self { services, providers, cache, ttl }
    }

    pub async fn list(&self) -> Result<String, ServiceError> {
        read_through(self.cache.as_ref(), SERVICES_LIST, &[SERVICES_TAG], self.ttl, || async {
            let rows = self.services.list_with_provider().await?;
            let views: Vec<ServiceView> = rows.into_iter().map(|(s, p)| ServiceView::from_parts(s, &p)).collect();
            info!(count = views.len(), "list services");
            Ok::<_, ServiceError>(serde_json::to_string(&views)?)
        })
        .await
        .map_err(|e| log_failure("service_list", e))
    }

    /// `NotFound` unless a service with `id` exists.
    pub async fn ensure_exists(&self, id: Uuid) -> Result<(), ServiceError> {
        self.services.find(id).await?.map(|_| ()).ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }

    pub async fn create(&self, input: ServiceInput) -> Result<ServiceView, ServiceError> {
        info!(action = "service_create_start", name = ?input.name, "creating service");
        let (provider_id, fields) = validate_service_create(&input).map_err(|e| rejected("service_create", e))?;
        let Some(owner) = self.providers.find(provider_id).await? else {
            warn!(action = "service_create_unknown_provider", provider_id = %provider_id, "provider not found");
            return Err(ServiceError::not_found("Provider", provider_id));
        };
        let created = self.services.create(owner.id, fields).await.map_err(|e| log_failure("service_create", e))?;
        invalidate_after_write(self.cache.as_ref(), &WRITE_TAGS, "service_create").await;
        info!(action = "service_create_success", id = %created.id, provider_id = %owner.id, "created service");
        Ok(ServiceView::from_parts(created, &owner))
    }

    pub async fn update(&self, id: Uuid, input: ServiceUpdateInput) -> Result<ServiceView, ServiceError> {
        info!(action = "service_update_start", id = %id, "updating service");
        let current = self.services.find(id).await?.ok_or_else(|| ServiceError::not_found(RESOURCE, id))?;
        let fields = validate_service_update(&input).map_err(|e| rejected("service_update", e))?;
        let owner = self
            .providers
            .find(current.provider_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Provider", current.provider_id))?;
        let updated = self.services.update(current, fields).await.map_err(|e| log_failure("service_update", e))?;
        invalidate_after_write(self.cache.as_ref(), &WRITE_TAGS, "service_update").await;
        info!(action = "service_update_success", id = %id, "updated service");
        Ok(ServiceView::from_parts(updated, &owner))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        info!(action = "service_delete_start", id = %id, "deleting service");
        if !self.services.delete(id).await.map_err(|e| log_failure("service_delete", e))? {
            return Err(ServiceError::not_found(RESOURCE, id));
        }
        invalidate_after_write(self.cache.as_ref(), &WRITE_TAGS, "service_delete").await;
        info!(action = "service_delete_success", id = %id, "deleted service");
        Ok(())
    }
}

fn rejected(action: &'static str, e: ServiceError) -> ServiceError {
    if let ServiceError::Validation(v) = &e {
        warn!(action, violations = %describe_violations(v), "service payload rejected");
    }
    e
}
