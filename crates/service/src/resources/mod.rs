//! Resource services: validate, persist, invalidate, serialize.

pub mod provider;
pub mod service;
#[cfg(test)]
pub(crate) mod testkit;

use uuid::Uuid;

use crate::errors::{FieldViolation, ServiceError};

pub use provider::ProviderResource;
pub use service::ServiceResource;

/// Path identifiers that are not UUIDs cannot name an existing record.
pub fn parse_id(resource: &'static str, raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::not_found(resource, raw))
}

/// Single-line rendering of violations for log fields.
pub(crate) fn describe_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.property, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}
