//! In-memory catalog used by service-layer and HTTP tests that run without
//! PostgreSQL. Mirrors the store constraints: unique provider email, services
//! bound to an existing provider, cascade delete.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use models::{provider, service};

use super::{ProviderFields, ProviderRepository, ServiceFields, ServiceRepository};
use crate::errors::ServiceError;

#[derive(Default)]
struct Tables {
    providers: Vec<provider::Model>,
    services: Vec<service::Model>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    tables: RwLock<Tables>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the database were down.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), ServiceError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ServiceError::Db("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderRepository for InMemoryCatalog {
    async fn list_with_services(&self) -> Result<Vec<(provider::Model, Vec<service::Model>)>, ServiceError> {
        self.ensure_available()?;
        let t = self.tables.read().await;
        Ok(t.providers
            .iter()
            .map(|p| {
                let owned = t.services.iter().filter(|s| s.provider_id == p.id).cloned().collect();
                (p.clone(), owned)
            })
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<provider::Model>, ServiceError> {
        self.ensure_available()?;
        Ok(self.tables.read().await.providers.iter().find(|p| p.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<provider::Model>, ServiceError> {
        self.ensure_available()?;
        Ok(self.tables.read().await.providers.iter().find(|p| p.email == email).cloned())
    }

    async fn services_of(&self, id: Uuid) -> Result<Vec<service::Model>, ServiceError> {
        self.ensure_available()?;
        Ok(self.tables.read().await.services.iter().filter(|s| s.provider_id == id).cloned().collect())
    }

    async fn create(&self, fields: ProviderFields) -> Result<provider::Model, ServiceError> {
        self.ensure_available()?;
        let mut t = self.tables.write().await;
        if t.providers.iter().any(|p| p.email == fields.email) {
            return Err(ServiceError::duplicate_email());
        }
        let now = Utc::now().into();
        let created = provider::Model {
            id: Uuid::new_v4(),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            address: fields.address,
            created_at: now,
            updated_at: now,
        };
        t.providers.push(created.clone());
        Ok(created)
    }

    async fn update(&self, current: provider::Model, fields: ProviderFields) -> Result<provider::Model, ServiceError> {
        self.ensure_available()?;
        let mut t = self.tables.write().await;
        if t.providers.iter().any(|p| p.id != current.id && p.email == fields.email) {
            return Err(ServiceError::duplicate_email());
        }
        let row = t
            .providers
            .iter_mut()
            .find(|p| p.id == current.id)
            .ok_or_else(|| ServiceError::not_found("Provider", current.id))?;
        row.name = fields.name;
        row.email = fields.email;
        row.phone = fields.phone;
        row.address = fields.address;
        row.updated_at = Utc::now().into();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.ensure_available()?;
        let mut t = self.tables.write().await;
        let before = t.providers.len();
        t.providers.retain(|p| p.id != id);
        if t.providers.len() == before {
            return Ok(false);
        }
        t.services.retain(|s| s.provider_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ServiceRepository for InMemoryCatalog {
    async fn list_with_provider(&self) -> Result<Vec<(service::Model, provider::Model)>, ServiceError> {
        self.ensure_available()?;
        let t = self.tables.read().await;
        Ok(t.services
            .iter()
            .filter_map(|s| t.providers.iter().find(|p| p.id == s.provider_id).map(|p| (s.clone(), p.clone())))
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<service::Model>, ServiceError> {
        self.ensure_available()?;
        Ok(self.tables.read().await.services.iter().find(|s| s.id == id).cloned())
    }

    async fn create(&self, provider_id: Uuid, fields: ServiceFields) -> Result<service::Model, ServiceError> {
        self.ensure_available()?;
        let mut t = self.tables.write().await;
        if !t.providers.iter().any(|p| p.id == provider_id) {
            return Err(ServiceError::Db("foreign key violation: fk_service_provider".into()));
        }
        let now = Utc::now().into();
        let created = service::Model {
            id: Uuid::new_v4(),
            provider_id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            created_at: now,
            updated_at: now,
        };
        t.services.push(created.clone());
        Ok(created)
    }

    async fn update(&self, current: service::Model, fields: ServiceFields) -> Result<service::Model, ServiceError> {
        self.ensure_available()?;
        let mut t = self.tables.write().await;
        let row = t
            .services
            .iter_mut()
            .find(|s| s.id == current.id)
            .ok_or_else(|| ServiceError::not_found("Service", current.id))?;
        row.name = fields.name;
        row.description = fields.description;
        row.price = fields.price;
        row.updated_at = Utc::now().into();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        self.ensure_available()?;
        let mut t = self.tables.write().await;
        let before = t.services.len();
        t.services.retain(|s| s.id != id);
        Ok(t.services.len() != before)
    }
}
