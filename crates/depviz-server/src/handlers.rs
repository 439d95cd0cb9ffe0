//! REST API handlers for the DepViz server

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
};
use depviz_core::{Artifacts, ViewState};
use depviz_layout::Scene;
use serde::Serialize;

use crate::ServerState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub nodes: usize,
    pub edges: usize,
}

#[derive(Debug, Serialize)]
pub struct SceneResponse {
    pub view: ViewState,
    pub scene: Scene,
}

/// Current graph as an import payload
pub async fn get_graph(State(state): State<Arc<ServerState>>) -> Json<Artifacts> {
    let session = state.session.lock().await;
    Json(session.store().to_artifacts())
}

/// Current draw list plus camera
pub async fn get_scene(State(state): State<Arc<ServerState>>) -> Json<SceneResponse> {
    let mut session = state.session.lock().await;
    session.frame();
    Json(SceneResponse {
        view: *session.view(),
        scene: session.scene().clone(),
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let session = state.session.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        nodes: session.store().node_count(),
        edges: session.store().edge_count(),
    })
}
