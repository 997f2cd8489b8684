use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema, Serialize)]
pub struct FieldViolationDoc { pub property: String, pub message: String }

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBodyDoc {
    /// Always `error`
    pub status: String,
    pub message: String,
    /// VALIDATION_FAILED, DUPLICATE_EMAIL, RESOURCE_NOT_FOUND, INVALID_PAYLOAD or INTERNAL_ERROR
    pub error_code: String,
    /// Present for validation failures only
    pub errors: Option<Vec<FieldViolationDoc>>,
}

#[derive(ToSchema, Serialize)]
pub struct ProviderInputDoc {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInputDoc {
    pub name: String,
    pub description: String,
    /// Positive decimal with at most two fractional digits, as string or number
    #[schema(example = "10.50")]
    pub price: String,
    pub provider_id: String,
}

#[derive(ToSchema, Serialize)]
pub struct ServiceUpdateInputDoc {
    pub name: String,
    pub description: String,
    #[schema(example = "10.50")]
    pub price: String,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummaryDoc {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "10.50")]
    pub price: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderViewDoc {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub services: Vec<ServiceSummaryDoc>,
}

#[derive(ToSchema, Serialize)]
pub struct ProviderSummaryDoc {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(ToSchema, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceViewDoc {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(example = "10.50")]
    pub price: String,
    pub provider: ProviderSummaryDoc,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ToSchema, Serialize)]
pub struct ClearCacheRequestDoc {
    /// Tags to invalidate, e.g. `providers_tag`, `services_tag`
    pub tags: Option<Vec<String>>,
    /// Clear every tag
    pub all: Option<bool>,
}

#[derive(ToSchema, Serialize)]
pub struct ClearCacheResponseDoc { pub cleared: Vec<String> }

#[derive(ToSchema, Serialize)]
pub struct CatalogStatsDoc {
    pub total_providers: u64,
    pub total_services: u64,
    pub avg_services_per_provider: f64,
    pub providers_without_services: u64,
    /// Decimal sum of all service prices
    pub total_service_value: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::providers::list,
        crate::routes::providers::create,
        crate::routes::providers::update,
        crate::routes::providers::delete,
        crate::routes::services::list,
        crate::routes::services::create,
        crate::routes::services::update,
        crate::routes::services::delete,
        crate::routes::admin::stats,
        crate::routes::admin::clear_cache,
    ),
    components(
        schemas(
            HealthResponse,
            FieldViolationDoc,
            ErrorBodyDoc,
            ProviderInputDoc,
            ServiceInputDoc,
            ServiceUpdateInputDoc,
            ServiceSummaryDoc,
            ProviderViewDoc,
            ProviderSummaryDoc,
            ServiceViewDoc,
            ClearCacheRequestDoc,
            ClearCacheResponseDoc,
            CatalogStatsDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "providers"),
        (name = "services"),
        (name = "admin")
    )
)]
pub struct ApiDoc;
