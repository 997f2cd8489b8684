//! Service layer for the provider catalog.
//! - Validates write payloads against explicit rule tables.
//! - Persists through repository traits (SeaORM or in-memory).
//! - Serves collection reads through a tagged read-through cache and
//!   invalidates the affected tags after every committed write.

pub mod errors;
pub mod cache;
pub mod dto;
pub mod validation;
pub mod repository;
pub mod resources;
pub mod stats;
pub mod maintenance;
#[cfg(test)]
pub mod test_support;
