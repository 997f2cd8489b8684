use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use service::dto::ProviderInput;
use service::resources::parse_id;

use crate::errors::ApiError;
use crate::state::AppState;

use super::raw_json;

#[utoipa::path(get, path = "/api/providers", tag = "providers",
    responses(
        (status = 200, description = "All providers with their services", body = [crate::openapi::ProviderViewDoc]),
        (status = 500, description = "Internal error", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state.providers.list().await.map_err(state.translate())?;
    Ok(raw_json(body))
}

#[utoipa::path(post, path = "/api/providers", tag = "providers", request_body = crate::openapi::ProviderInputDoc,
    responses(
        (status = 201, description = "Provider created", body = crate::openapi::ProviderViewDoc),
        (status = 400, description = "Validation failed", body = crate::openapi::ErrorBodyDoc),
        (status = 422, description = "Email already exists", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProviderInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload.map_err(ApiError::invalid_payload)?;
    let view = state.providers.create(input).await.map_err(state.translate())?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[utoipa::path(put, path = "/api/providers/{id}", tag = "providers", request_body = crate::openapi::ProviderInputDoc,
    params(("id" = String, Path, description = "Provider id")),
    responses(
        (status = 200, description = "Provider updated", body = crate::openapi::ProviderViewDoc),
        (status = 400, description = "Validation failed", body = crate::openapi::ErrorBodyDoc),
        (status = 404, description = "Provider not found", body = crate::openapi::ErrorBodyDoc),
        (status = 422, description = "Email already exists", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProviderInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id("Provider", &id).map_err(state.translate())?;
    // an unknown id wins over an unreadable body
    let input = match payload {
        Ok(Json(input)) => input,
        Err(rejection) => {
            state.providers.ensure_exists(id).await.map_err(state.translate())?;
            return Err(ApiError::invalid_payload(rejection));
        }
    };
    let view = state.providers.update(id, input).await.map_err(state.translate())?;
    Ok(Json(view).into_response())
}

#[utoipa::path(delete, path = "/api/providers/{id}", tag = "providers",
    params(("id" = String, Path, description = "Provider id")),
    responses(
        (status = 204, description = "Provider and its services deleted"),
        (status = 404, description = "Provider not found", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id("Provider", &id).map_err(state.translate())?;
    state.providers.delete(id).await.map_err(state.translate())?;
    Ok(StatusCode::NO_CONTENT)
}
