//! services/api/src/bin/api.rs

use std::sync::Arc;

use api_lib::{
    adapters::db::DbAdapter,
    config::Config,
    error::ApiError,
    web::{self, auth::ensure_bootstrap_admin, rest::ApiDoc, state::AppState},
};
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use care_directory_core::availability::SystemClock;
use care_directory_core::services::{
    AvailabilityQueryService, CabinetService, DoctorService, PharmacyService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn cors_layer(config: &Config) -> Result<CorsLayer, ApiError> {
    let origin = match &config.cors_allowed_origin {
        Some(origin) => AllowOrigin::exact(origin.parse::<HeaderValue>().map_err(|e| {
            ApiError::Internal(format!("Invalid CORS_ALLOWED_ORIGIN '{}': {}", origin, e))
        })?),
        None => AllowOrigin::any(),
    };
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    if let Some(admin) = &config.bootstrap_admin {
        ensure_bootstrap_admin(db_adapter.as_ref(), admin).await?;
    }

    // --- 3. Build the Shared AppState ---
    let clock = Arc::new(SystemClock);
    let app_state = Arc::new(AppState {
        config: config.clone(),
        users: db_adapter.clone(),
        availability: AvailabilityQueryService::new(db_adapter.clone(), clock),
        pharmacies: PharmacyService::new(db_adapter.clone()),
        cabinets: CabinetService::new(db_adapter.clone()),
        doctors: DoctorService::new(db_adapter.clone(), db_adapter),
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(web::router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(&config)?)
        .layer(TraceLayer::new_for_http());

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
