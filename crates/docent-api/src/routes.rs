//! API route definitions

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{chat, health, ingest};
use crate::state::AppState;

/// Build the CORS layer from configured origins; an empty list permits any
/// origin (development default).
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ingest", post(ingest::ingest_handler))
        .route("/chat", post(chat::chat_handler))
        .route("/chat/stream", post(chat::chat_stream_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
