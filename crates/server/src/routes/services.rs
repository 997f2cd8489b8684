use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use service::dto::{ServiceInput, ServiceUpdateInput};
use service::resources::parse_id;

use crate::errors::ApiError;
use crate::state::AppState;

use super::raw_json;

#[utoipa::path(get, path = "/api/services", tag = "services",
    responses(
        (status = 200, description = "All services with their provider", body = [crate::openapi::ServiceViewDoc]),
        (status = 500, description = "Internal error", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.services.list().await.map_err(state.translate())?;
    Ok(raw_json(body))
}

#[utoipa::path(post, path = "/api/services", tag = "services", request_body = crate::openapi::ServiceInputDoc,
    responses(
        (status = 201, description = "Service created", body = crate::openapi::ServiceViewDoc),
        (status = 400, description = "Validation failed", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Provider not found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ServiceInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload.map_err(ApiError::invalid_payload)?;
    let view = state.services.create(input).await.map_err(state.translate())?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[utoipa::path(put, path = "/api/services/{id}", tag = "services", request_body = crate::openapi::ServiceUpdateInputDoc,
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 200, description = "Service updated", body = crate::openapi::ServiceViewDoc),
        (status = 400, description = "Validation failed", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Service not found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ServiceUpdateInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id("Service", &id).map_err(state.translate())?;
    // an unknown id wins over an unreadable body
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => {
            state.services.ensure_exists(id).await.map_err(state.translate())?;
            return Err(ApiError::invalid_payload(rejection));
        }
    };
    let view = state.services.update(id, input).await.map_err(state.translate())?;
    Ok(Json(view).into_response())
}

#[utoipa::path(delete, path = "/api/services/{id}", tag = "services",
    params(("id" = String, Path, description = "Service id")),
    responses(
        (status = 204, description = "Service deleted"),
        (status = 404, description = "Service not found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id("Service", &id).map_err(state.translate())?;
    state.services.delete(id).await.map_err(state.translate())?;
    Ok(StatusCode::NO_CONTENT)
}
