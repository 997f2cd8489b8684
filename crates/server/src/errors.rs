use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use service::errors::{FieldViolation, ServiceError};

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    pub error_code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldViolation>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>, errors: Vec<FieldViolation>) -> Self {
        Self { status, body: ErrorBody { status: "error", message: message.into(), error_code, errors } }
    }

    /// Translate a domain failure. Internal details reach the client only
    /// when `expose_details` is set (dev environment).
    pub fn from_service(e: ServiceError, expose_details: bool) -> Self {
        match e {
            ServiceError::Validation(errors) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Validation failed", errors)
            }
            ServiceError::Duplicate { code, message } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message, Vec::new())
            }
            e @ ServiceError::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND", e.to_string(), Vec::new())
            }
            other => {
                error!(err = %other, "internal error");
                let message = if expose_details { other.to_string() } else { "Internal server error".to_string() };
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message, Vec::new())
            }
        }
    }

    pub fn invalid_payload(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "INVALID_PAYLOAD",
            format!("Invalid JSON payload: {}", rejection.body_text()),
            Vec::new(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(e: &ApiError) -> serde_json::Value {
        serde_json::to_value(&e.body).unwrap()
    }

    #[test]
    fn validation_lists_violations() {
        let e = ApiError::from_service(ServiceError::invalid("name", "Name is required"), false);
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        let b = body(&e);
        assert_eq!(b["status"], "error");
        assert_eq!(b["errorCode"], "VALIDATION_FAILED");
        assert_eq!(b["errors"][0]["property"], "name");
        assert_eq!(b["errors"][0]["message"], "Name is required");
    }

    #[test]
    fn duplicate_is_unprocessable_without_errors_field() {
        let e = ApiError::from_service(ServiceError::duplicate_email(), false);
        assert_eq!(e.status, StatusCode::UNPROCESSABLE_ENTITY);
        let b = body(&e);
        assert_eq!(b["errorCode"], "DUPLICATE_EMAIL");
        assert!(b.get("errors").is_none());
    }

    #[test]
    fn internal_detail_only_in_dev() {
        let hidden = ApiError::from_service(ServiceError::Db("relation missing".into()), false);
        assert_eq!(hidden.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(hidden.body.message, "Internal server error");

        let shown = ApiError::from_service(ServiceError::Db("relation missing".into()), true);
        assert!(shown.body.message.contains("relation missing"));
    }

    #[test]
    fn not_found_names_resource() {
        let e = ApiError::from_service(ServiceError::not_found("Provider", "abc"), false);
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.body.message, "Provider with id abc not found");
    }
}
