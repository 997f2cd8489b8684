use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::info;

use service::maintenance::{self, ClearCacheRequest, ClearCacheResponse};
use service::stats::{self, CatalogStats};

use crate::errors::ApiError;
use crate::state::AppState;

#[utoipa::path(get, path = "/admin/stats", tag = "admin",
    responses((status = 200, description = "Catalog statistics", body = crate::openapi::CatalogStatsDoc))
)]
pub async fn stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, ApiError> {
    let s = stats::generate(state.provider_repo.as_ref()).await.map_err(state.translate())?;
    Ok(Json(s))
}

#[utoipa::path(post, path = "/admin/cache/clear", tag = "admin", request_body = crate::openapi::ClearCacheRequestDoc,
    responses(
        (status = 200, description = "Tags cleared", body = crate::openapi::ClearCacheResponseDoc),
        (status = 400, description = "Neither tags nor all given", body = crate::openapi::ErrorBodyDoc)
    )
)]
pub async fn clear_cache(
    State(state): State<AppState>,
    payload: Result<Json<ClearCacheRequest>, JsonRejection>,
) -> Result<Json<ClearCacheResponse>, ApiError> {
    let Json(req) = payload.map_err(ApiError::invalid_payload)?;
    let scope = req.scope().map_err(state.translate())?;
    let out = maintenance::clear(state.cache.as_ref(), scope).await.map_err(state.translate())?;
    info!(cleared = ?out.cleared, "cache cleared by operator");
    Ok(Json(out))
}
