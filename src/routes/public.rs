use axum::http::Method;

use super::RouteRegistrar;
use crate::{AppState, handlers};

/// Public Router Module
///
/// Endpoints reachable without a token. Registration and login are public too, but are
/// registered with the rest of `/user` in `users.rs`.
pub fn register(registrar: RouteRegistrar<AppState>) -> RouteRegistrar<AppState> {
    // GET /health
    // Used for monitoring and load balancer checks.
    let registrar = registrar.public(Method::GET, "/health", handlers::health);

    // GET /api-docs/openapi.json
    // With the `swagger-ui` feature, SwaggerUi serves this document itself.
    #[cfg(not(feature = "swagger-ui"))]
    let registrar = registrar.public(Method::GET, "/api-docs/openapi.json", handlers::openapi_json);

    registrar
}
