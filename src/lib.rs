use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::HeaderName,
};
use std::sync::Arc;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authentication gate, route table and role policy.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod storage;

// Route registration, one module per resource.
pub mod routes;
use routes::RouteRegistrar;

// --- Public Re-exports ---

pub use auth::{AccessGuard, AuthError, AuthUser, Identity, TokenCodec};
pub use config::AppConfig;
pub use error::AppError;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{DiskStorage, MockStorageService, StorageState};

/// ApiDoc
///
/// The OpenAPI document for every endpoint, built from the `#[utoipa::path]` and
/// `ToSchema` annotations. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::users::register_user, handlers::users::login,
        handlers::users::create_user_by_admin, handlers::users::assign_role,
        handlers::users::list_users, handlers::users::get_user,
        handlers::users::update_user, handlers::users::delete_user,
        handlers::roles::create_role, handlers::roles::list_roles, handlers::roles::get_role,
        handlers::roles::update_role, handlers::roles::delete_role,
        handlers::documents::upload_document, handlers::documents::list_documents,
        handlers::documents::download_document, handlers::documents::rename_document,
        handlers::documents::delete_document
    ),
    components(
        schemas(
            models::Role, models::RoleRecord, models::User, models::Document,
            models::RegisterUserRequest, models::CreateUserByAdminRequest, models::LoginRequest,
            models::LoginResponse, models::AssignRoleRequest, models::UpdateUserRequest,
            models::CreateRoleRequest, models::UpdateRoleRequest, models::RenameDocumentRequest,
            models::UploadDocumentForm, error::ErrorBody,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "dms", description = "Document Management API")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single, immutable container of shared services, cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, stubs in tests).
    pub repo: RepositoryState,
    /// Document blob storage (disk in production, in-memory mock in tests).
    pub storage: StorageState,
    pub config: AppConfig,
    /// Token issuing for login. The gate holds its own handle to the same codec.
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    /// Builds the state, deriving the token codec from `config.jwt_secret`.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let tokens = Arc::new(TokenCodec::new(&config.jwt_secret));
        Self {
            repo,
            storage,
            config,
            tokens,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(app_state: &AppState) -> Arc<TokenCodec> {
        app_state.tokens.clone()
    }
}

/// create_router
///
/// Assembles every route, wraps them in the authentication gate and role policy, and
/// adds the global observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Routes and their access table, registered together.
    let (routes, table) = routes::app_routes(RouteRegistrar::new()).finish();
    tracing::debug!(routes = table.len(), "route table built");

    // 3. Gate + policy on every registered route.
    let guard = AccessGuard::new(table, state.tokens.clone());
    let base_router = guard
        .apply(routes)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .with_state(state);

    // Documentation UI. Mounted after the guard, so it is reachable without a token.
    #[cfg(feature = "swagger-ui")]
    let base_router = base_router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    // 4. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 4a. Request ID Generation: a UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 4b. Request Tracing: one span per request, carrying the request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 4c. Request ID Propagation: echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 5. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span used by `TraceLayer`, tagging it with the method, URI
/// and `x-request-id` so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
