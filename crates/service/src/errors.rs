use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;

/// A single violated field constraint, rendered as `{"property", "message"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub property: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self { property: property.into(), message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),
    #[error("{message}")]
    Duplicate { code: &'static str, message: String },
    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: String },
    #[error("database error: {0}")]
    Db(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(resource: &'static str, id: impl Display) -> Self {
        Self::NotFound { resource, id: id.to_string() }
    }

    pub fn duplicate_email() -> Self {
        Self::Duplicate { code: "DUPLICATE_EMAIL", message: "Email already exists".into() }
    }

    pub fn invalid(property: &str, message: &str) -> Self {
        Self::Validation(vec![FieldViolation::new(property, message)])
    }

    /// Stable machine-readable code used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_FAILED",
            ServiceError::Duplicate { code, .. } => *code,
            ServiceError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            ServiceError::Db(_)
            | ServiceError::Serialization(_)
            | ServiceError::Cache(_)
            | ServiceError::Model(_) => "INTERNAL_ERROR",
        }
    }

    /// Caller errors pass through to the client unchanged; the rest are internal.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Validation(_) | ServiceError::Duplicate { .. } | ServiceError::NotFound { .. }
        )
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        ServiceError::Db(e.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Serialization(e.to_string())
    }
}
