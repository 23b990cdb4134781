//! Router HTTP Routes
//!
//! The router role owns no data. It maps `(namespace, key)` to the node
//! owning the key and either reports that node or redirects the request to
//! it with `307`, so the method and body survive the hop.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;

use crate::observability::Event;
use crate::routing::{NodeAssignment, NodeTable};
use crate::service::ServiceResult;

// ==================
// Shared State
// ==================

/// Router state shared across handlers
pub struct RouterState {
    pub nodes: NodeTable,
}

impl RouterState {
    pub fn new(nodes: NodeTable) -> Self {
        Self { nodes }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct RouterStatusResponse {
    pub nodes: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LocateResponse {
    pub namespace: String,
    pub key: String,
    pub volume: NodeAssignment,
}

// ==================
// Router Routes
// ==================

/// Create router-role routes
pub fn router_routes(state: Arc<RouterState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        .route("/v1/nodes", get(nodes_handler))
        .route("/v1/locate/:ns/:key", get(locate_handler))
        .route("/:ns/:key", any(redirect_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

async fn status_handler(State(state): State<Arc<RouterState>>) -> Json<RouterStatusResponse> {
    Json(RouterStatusResponse {
        nodes: state.nodes.nodes().to_vec(),
    })
}

async fn nodes_handler(State(state): State<Arc<RouterState>>) -> Json<Vec<String>> {
    Json(state.nodes.nodes().to_vec())
}

async fn locate_handler(
    State(state): State<Arc<RouterState>>,
    Path((ns, key)): Path<(String, String)>,
) -> ServiceResult<Json<LocateResponse>> {
    let volume = state.nodes.owner(&key)?;
    Ok(Json(LocateResponse {
        namespace: ns,
        key,
        volume,
    }))
}

async fn redirect_handler(
    State(state): State<Arc<RouterState>>,
    Path((ns, key)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
) -> ServiceResult<Response> {
    let owner = state.nodes.owner(&key)?;
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| format!("/{}/{}", ns, key));
    let location = format!("{}{}", owner.address, path_and_query);

    tracing::debug!(
        event = %Event::Redirected,
        namespace = %ns,
        key = %key,
        bucket = owner.bucket,
        location = %location,
    );

    Ok((StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response())
}
