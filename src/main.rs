//! AssetDesk Server - IT asset inventory and issuance tracking
//!
//! REST API server for component maintenance and hardware issuance.

use axum::{
    routing::{get, patch, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assetdesk_server::{
    api,
    config::AppConfig,
    repository::Repository,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("assetdesk_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting AssetDesk Server v{}", env!("CARGO_PKG_VERSION"));

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect(&config.database.url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::info!("Database migrations completed");

    // Save server address before moving config
    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    // Create repository and services
    let repository = Repository::new(pool.clone());
    let services = Services::with_repository(repository, config.issuance.clone());

    tracing::info!(
        "Issuance numbers: prefix {}, policy {:?}",
        config.issuance.prefix,
        config.issuance.sequence_policy
    );

    // Create application state
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        pool,
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(server_host.parse()?, server_port);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Hardware components
        .route("/hardware/:id", get(api::hardware::get_hardware))
        .route("/hardware/:id/components/add", post(api::hardware::add_component))
        .route("/hardware/:id/components/remove", post(api::hardware::remove_component))
        .route("/hardware/:id/components/replace", post(api::hardware::replace_component))
        .route("/hardware/:id/parts/:part_id", patch(api::hardware::update_part))
        // Issuances
        .route(
            "/issuances/component-maintenance",
            post(api::issuances::create_component_maintenance),
        )
        .route("/issuances/whole-unit", post(api::issuances::create_whole_unit))
        .route("/issuances/:id", get(api::issuances::get_issuance))
        .route("/issuances/:id/acknowledge", post(api::issuances::acknowledge))
        .route(
            "/employees/:id/acknowledgements/pending",
            get(api::issuances::pending_acknowledgements),
        )
        // Inventory & audit
        .route("/parts/:id/inventory", get(api::inventory::get_part_inventory))
        .route("/activity-logs/:entity/:id", get(api::inventory::get_activity_logs))
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}
