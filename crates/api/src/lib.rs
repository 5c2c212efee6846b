//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes
//! - Error responses

pub mod error;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vitrine_core::watermark::WatermarkOptions;
use vitrine_shared::WatermarkConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Watermark applied on request, `None` when watermarking is disabled.
    pub watermark: Option<Arc<WatermarkOptions>>,
}

impl AppState {
    /// Build state from a connection and the watermark settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, watermark: &WatermarkConfig) -> Self {
        Self {
            db: Arc::new(db),
            watermark: watermark
                .enabled
                .then(|| Arc::new(WatermarkOptions::from(watermark))),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
