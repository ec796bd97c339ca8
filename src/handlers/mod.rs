//! HTTP handlers, one module per resource.
//!
//! Handlers never check roles themselves: by the time one runs, the gate has verified
//! the caller and the policy has enforced the route's role set. They only read the
//! caller through `AuthUser` for audit columns.

pub mod documents;
pub mod roles;
pub mod users;

/// health
///
/// [Public Route] Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// openapi_json
///
/// [Public Route] The generated OpenAPI document.
#[cfg(not(feature = "swagger-ui"))]
pub async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;

    axum::Json(crate::ApiDoc::openapi())
}
