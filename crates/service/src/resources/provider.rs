use std::{sync::Arc, time::Duration};

use tracing::{error, info, warn};
use uuid::Uuid;

use common::utils::logging::mask_phone;

use crate::cache::{invalidate_after_write, read_through, TaggedCache, PROVIDERS_LIST, PROVIDERS_TAG, SERVICES_TAG};
use crate::dto::{ProviderInput, ProviderView};
use crate::errors::ServiceError;
use crate::repository::{ProviderFields, ProviderRepository};
use crate::validation::validate_provider;

use super::describe_violations;

const RESOURCE: &str = "Provider";

/// Provider CRUD with the `providers_list` read-through snapshot.
pub struct ProviderResource {
    providers: Arc<dyn ProviderRepository>,
    cache: Arc<dyn TaggedCache>,
    ttl: Duration,
}

impl ProviderResource {
    pub fn new(providers: Arc<dyn ProviderRepository>, cache: Arc<dyn TaggedCache>, ttl: Duration) -> Self {
        Self { providers, cache, ttl }
    }

    /// JSON array of provider read views, served from cache when fresh.
    pub async fn list(&self) -> Result<String, ServiceError> {
        read_through(self.cache.as_ref(), PROVIDERS_LIST, &[PROVIDERS_TAG], self.ttl, || async {
            let rows = self.providers.list_with_services().await?;
            let views: Vec<ProviderView> = rows.into_iter().map(|(p, s)| ProviderView::from_parts(p, s)).collect();
            info!(count = views.len(), "list providers");
            Ok::<_, ServiceError>(serde_json::to_string(&views)?)
        })
        .await
        .map_err(|e| log_failure("provider_list", e))
    }

    pub async fn get(&self, id: Uuid) -> Result<ProviderView, ServiceError> {
        let p = self.providers.find(id).await?.ok_or_else(|| ServiceError::not_found(RESOURCE, id))?;
        let services = self.providers.services_of(id).await?;
        Ok(ProviderView::from_parts(p, services))
    }

    /// `NotFound` unless a provider with `id` exists.
    pub async fn ensure_exists(&self, id: Uuid) -> Result<(), ServiceError> {
        self.providers.find(id).await?.map(|_| ()).ok_or_else(|| ServiceError::not_found(RESOURCE, id))
    }

    pub async fn create(&self, input: ProviderInput) -> Result<ProviderView, ServiceError> {
        info!(action = "provider_create_start", email = ?input.email, "creating provider");
        let fields = self.checked(&input, None).await?;
        let created = self.providers.create(fields).await.map_err(|e| log_failure("provider_create", e))?;
        invalidate_after_write(self.cache.as_ref(), &[PROVIDERS_TAG], "provider_create").await;
        info!(action = "provider_create_success", id = %created.id, "created provider");
        Ok(ProviderView::from_parts(created, Vec::new()))
    }

    pub async fn update(&self, id: Uuid, input: ProviderInput) -> Result<ProviderView, ServiceError> {
        info!(action = "provider_update_start", id = %id, "updating provider");
        let current = self.providers.find(id).await?.ok_or_else(|| ServiceError::not_found(RESOURCE, id))?;
        let fields = self.checked(&input, Some(id)).await?;
        let updated = self.providers.update(current, fields).await.map_err(|e| log_failure("provider_update", e))?;
        let services = self.providers.services_of(id).await?;
        invalidate_after_write(self.cache.as_ref(), owner_tags(!services.is_empty()), "provider_update").await;
        info!(action = "provider_update_success", id = %id, "updated provider");
        Ok(ProviderView::from_parts(updated, services))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        info!(action = "provider_delete_start", id = %id, "deleting provider");
        if self.providers.find(id).await?.is_none() {
            return Err(ServiceError::not_found(RESOURCE, id));
        }
        let had_services = !self.providers.services_of(id).await?.is_empty();
        if !self.providers.delete(id).await.map_err(|e| log_failure("provider_delete", e))? {
            return Err(ServiceError::not_found(RESOURCE, id));
        }
        invalidate_after_write(self.cache.as_ref(), owner_tags(had_services), "provider_delete").await;
        info!(action = "provider_delete_success", id = %id, "deleted provider");
        Ok(())
    }

    /// Validate `input` and reject an email held by another provider.
    async fn checked(&self, input: &ProviderInput, own_id: Option<Uuid>) -> Result<ProviderFields, ServiceError> {
        let fields = validate_provider(input).map_err(|e| {
            if let ServiceError::Validation(v) = &e {
                warn!(
                    action = "provider_validation_failed",
                    phone = %input.phone.as_deref().map(mask_phone).unwrap_or_default(),
                    violations = %describe_violations(v),
                    "provider payload rejected"
                );
            }
            e
        })?;
        if let Some(holder) = self.providers.find_by_email(&fields.email).await? {
            if Some(holder.id) != own_id {
                warn!(action = "provider_duplicate_email", email = %fields.email, "email already taken");
                return Err(ServiceError::duplicate_email());
            }
        }
        Ok(fields)
    }
}

/// Services embed a provider summary, so touching an owner of services
/// also stales `services_list`.
fn owner_tags(owns_services: bool) -> &'static [&'static str] {
    if owns_services {
        &[PROVIDERS_TAG, SERVICES_TAG]
    } else {
        &[PROVIDERS_TAG]
    }
}

pub(crate) fn log_failure(action: &'static str, e: ServiceError) -> ServiceError {
    if !e.is_client_error() {
        error!(action, err = %e, "operation failed");
    }
    e
}
