//! API route definitions and router builder.

pub mod auth;
pub mod generate;
pub mod health;
pub mod history;
pub mod knowledge;
pub mod staging;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Generation
        .route("/webhook", post(generate::webhook))
        .route("/generate-config", post(generate::generate_config))
        .route("/preview", post(generate::preview))
        // Review
        .route("/staging", get(staging::list_staging))
        .route("/staging/{id}", get(staging::get_staging))
        .route("/staging/{id}/approve", post(staging::push_staging))
        .route("/staging/{id}/push", post(staging::push_staging))
        .route("/staging/{id}/reject", post(staging::reject_staging))
        .route("/staging/{id}/feedback", get(staging::get_feedback))
        // Knowledge store
        .route("/knowledge", post(knowledge::insert_entry))
        .route("/knowledge/search", get(knowledge::search))
        .route("/history", get(history::weighted_history))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
