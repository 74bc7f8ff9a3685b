//! Field API Service Library
//!
//! HTTP front end for the heatmap, animation and legend pipeline.

pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit;

    Router::new()
        // Rendering
        .route("/api/heatmap", post(handlers::heatmap::heatmap_handler))
        .route("/api/animate", post(handlers::animate::animate_handler))
        .route("/legend.png", get(handlers::legend::legend_handler))
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
