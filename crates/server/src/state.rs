use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;

use service::cache::TaggedCache;
use service::errors::ServiceError;
use service::repository::{ProviderRepository, SeaOrmProviderRepository, SeaOrmServiceRepository, ServiceRepository};
use service::resources::{ProviderResource, ServiceResource};

use crate::errors::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<ProviderResource>,
    pub services: Arc<ServiceResource>,
    pub provider_repo: Arc<dyn ProviderRepository>,
    pub cache: Arc<dyn TaggedCache>,
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(
        provider_repo: Arc<dyn ProviderRepository>,
        service_repo: Arc<dyn ServiceRepository>,
        cache: Arc<dyn TaggedCache>,
        ttl: Duration,
        expose_errors: bool,
    ) -> Self {
        let providers = Arc::new(ProviderResource::new(provider_repo.clone(), cache.clone(), ttl));
        let services = Arc::new(ServiceResource::new(service_repo, provider_repo.clone(), cache.clone(), ttl));
        Self { providers, services, provider_repo, cache, expose_errors }
    }

    pub fn with_database(db: DatabaseConnection, cache: Arc<dyn TaggedCache>, ttl: Duration, expose_errors: bool) -> Self {
        let provider_repo = Arc::new(SeaOrmProviderRepository { db: db.clone() });
        let service_repo = Arc::new(SeaOrmServiceRepository { db });
        Self::new(provider_repo, service_repo, cache, ttl, expose_errors)
    }

    /// Error mapper honoring the environment's detail policy.
    pub fn translate(&self) -> impl Fn(ServiceError) -> ApiError {
        let expose = self.expose_errors;
        move |e| ApiError::from_service(e, expose)
    }
}
