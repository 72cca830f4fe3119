//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use learning::{InMemoryTokenStore, LearningConfig, LearningService, PgStore};
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

// Re-export unified error types for use in handlers
pub use kernel::error::{app_error::AppError, kind::ErrorKind};

type Service = LearningService<PgStore, InMemoryTokenStore>;

#[derive(Clone)]
struct AppState {
    service: Arc<Service>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,learning=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::debug!(config = ?config, "Configuration loaded");

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    // Learning service: store, locks, token store and config live as long
    // as the process
    let learning_config = Arc::new(match &config.password_pepper {
        Some(pepper) => LearningConfig::with_pepper(pepper.as_bytes()),
        None => LearningConfig::default(),
    });
    let tokens = Arc::new(InMemoryTokenStore::new(&learning_config));
    let service = LearningService::new(Arc::new(PgStore::new(pool)), tokens, learning_config);

    tracing::warn!("Session tokens are kept in memory; every session ends on restart");

    let state = AppState {
        service: Arc::new(service),
    };

    // Build router
    let app = Router::new()
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Liveness plus a round trip to the database
async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    sqlx::query("SELECT 1")
        .execute(state.service.store().pool())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Health check query failed");
            AppError::internal("database unavailable").with_source(e)
        })?;

    Ok(Json(json!({ "status": "ok" })))
}
