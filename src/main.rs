use dms_backend::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, RepositoryState},
    storage::{DiskStorage, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database, document storage and the HTTP
/// server, in that order. Any failure before the server is listening aborts startup.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    // Panics without DATABASE_URL or JWT_SECRET.
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate and request logs from tower-http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dms_backend=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (Postgres) and schema migrations
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to apply database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 5. Storage Initialization (local disk)
    let disk = DiskStorage::new(&config.upload_dir);
    disk.ensure_root_exists()
        .await
        .expect("FATAL: Failed to create the upload directory. Check UPLOAD_DIR.");
    tracing::info!(upload_dir = %disk.root().display(), "document storage ready");

    let storage = Arc::new(disk) as StorageState;

    // 6. Unified State Assembly
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app_state = AppState::new(repo, storage, config);

    // 7. Router and Server Startup
    let app = create_router(app_state);

    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("FATAL: Failed to bind {addr}: {e}"));

    tracing::info!("Listening on {addr}");
    #[cfg(feature = "swagger-ui")]
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:{}/api", addr.port());

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
