//! Entity store ports for providers and services.

pub mod memory;
pub mod seaorm;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use models::{provider, service};

use crate::errors::ServiceError;

pub use memory::InMemoryCatalog;
pub use seaorm::{SeaOrmProviderRepository, SeaOrmServiceRepository};

/// Validated provider attributes ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFields {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Validated service attributes; `price` already has scale 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFields {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
}

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// All providers in insertion order, each with its services.
    async fn list_with_services(&self) -> Result<Vec<(provider::Model, Vec<service::Model>)>, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<provider::Model>, ServiceError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<provider::Model>, ServiceError>;
    async fn services_of(&self, id: Uuid) -> Result<Vec<service::Model>, ServiceError>;
    /// Fails with `DUPLICATE_EMAIL` when the store already holds `fields.email`.
    async fn create(&self, fields: ProviderFields) -> Result<provider::Model, ServiceError>;
    async fn update(&self, current: provider::Model, fields: ProviderFields) -> Result<provider::Model, ServiceError>;
    /// Removes the provider and its services. `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
    /// All services in insertion order, each with its provider.
    async fn list_with_provider(&self) -> Result<Vec<(service::Model, provider::Model)>, ServiceError>;
    async fn find(&self, id: Uuid) -> Result<Option<service::Model>, ServiceError>;
    async fn create(&self, provider_id: Uuid, fields: ServiceFields) -> Result<service::Model, ServiceError>;
    async fn update(&self, current: service::Model, fields: ServiceFields) -> Result<service::Model, ServiceError>;
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}
