//! Axum router setup for the DepViz server

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::{
    ServerState,
    handlers::{get_graph, get_scene, health_check},
    websocket::ws_handler,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    let router = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/graph", get(get_graph))
        .route("/api/scene", get(get_scene))
        .route("/api/health", get(health_check));

    let router = match &state.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router.layer(CorsLayer::permissive()).with_state(state)
}
