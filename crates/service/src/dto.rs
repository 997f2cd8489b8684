//! Write payloads and read views exchanged with HTTP clients.
//!
//! Write payloads keep every field optional so that a missing field becomes a
//! validation violation instead of a parse failure.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Service create payload. `price` may be a JSON string or number and
/// `providerId` a string; both are checked by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<serde_json::Value>,
    pub provider_id: Option<serde_json::Value>,
}

/// Service update payload; the owning provider cannot change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUpdateInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    pub services: Vec<ServiceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub provider: ProviderSummary,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<models::service::Model> for ServiceSummary {
    fn from(s: models::service::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            price: s.price,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

impl From<&models::provider::Model> for ProviderSummary {
    fn from(p: &models::provider::Model) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            email: p.email.clone(),
            phone: p.phone.clone(),
            address: p.address.clone(),
        }
    }
}

impl ProviderView {
    pub fn from_parts(p: models::provider::Model, services: Vec<models::service::Model>) -> Self {
        Self {
            id: p.id,
            name: p.name,
            email: p.email,
            phone: p.phone,
            address: p.address,
            created_at: p.created_at,
            updated_at: p.updated_at,
            services: services.into_iter().map(ServiceSummary::from).collect(),
        }
    }
}

impl ServiceView {
    pub fn from_parts(s: models::service::Model, provider: &models::provider::Model) -> Self {
        Self {
            id: s.id,
            name: s.name,
            description: s.description,
            price: s.price,
            provider: ProviderSummary::from(provider),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
