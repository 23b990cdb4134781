//! Volume HTTP Routes
//!
//! Endpoints of a storage node: object reads and writes, listings,
//! namespace management, hot backup and status.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::namespace::{KeyEntry, Page, Pagination, Record};
use crate::service::{ServiceError, ServiceResult, StatusReport, StorageService};

// ==================
// Shared State
// ==================

/// Volume state shared across handlers
pub struct VolumeState {
    pub service: StorageService,
}

impl VolumeState {
    pub fn new(service: StorageService) -> Self {
        Self { service }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub namespace: String,
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

/// Listing row with the payload base64-encoded
#[derive(Debug, Serialize)]
pub struct DataRow {
    #[serde(rename = "dataID")]
    pub key: String,
    pub data: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<Record> for DataRow {
    fn from(record: Record) -> Self {
        Self {
            key: record.key,
            data: STANDARD.encode(&record.data),
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateNamespaceRequest {
    pub name: String,
    #[serde(default)]
    pub stream: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BackupResponse {
    pub namespace: String,
    pub path: String,
}

// ==================
// Volume Routes
// ==================

/// Create volume routes
pub fn volume_routes(state: Arc<VolumeState>) -> Router {
    Router::new()
        .route("/status", get(status_handler))
        // Namespace management
        .route(
            "/v1/namespace",
            get(list_namespaces_handler).post(create_namespace_handler),
        )
        .route("/v1/namespace/:ns/_backup", get(backup_handler))
        // Listings
        .route("/v1/data/:ns", get(list_data_handler))
        .route("/v1/data/:ns/_list", get(list_keys_handler))
        .route("/:ns", get(list_data_handler))
        // Objects
        .route(
            "/:ns/:key",
            put(upsert_handler)
                .post(insert_handler)
                .get(get_handler)
                .delete(delete_handler),
        )
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

/// Page request from raw query values; absent values take the defaults
fn parse_pagination(query: &HashMap<String, String>) -> ServiceResult<Pagination> {
    let number = |name: &str, default: i64| -> ServiceResult<i64> {
        match query.get(name).map(|v| v.trim()) {
            None | Some("") => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ServiceError::InvalidArgument(format!("{} must be an integer, got '{}'", name, raw))),
        }
    };

    let page = number("page", 1)?;
    let limit = number("limit", Pagination::DEFAULT_LIMIT as i64)?;
    Ok(Pagination::new(page, limit)?)
}

// ==================
// Status Handler
// ==================

async fn status_handler(State(state): State<Arc<VolumeState>>) -> Json<StatusReport> {
    Json(state.service.status())
}

// ==================
// Object Handlers
// ==================

async fn upsert_handler(
    State(state): State<Arc<VolumeState>>,
    Path((ns, key)): Path<(String, String)>,
    body: Bytes,
) -> ServiceResult<(StatusCode, Json<WriteResponse>)> {
    state.service.upsert(&ns, &key, &body).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse { namespace: ns, key })))
}

async fn insert_handler(
    State(state): State<Arc<VolumeState>>,
    Path((ns, key)): Path<(String, String)>,
    body: Bytes,
) -> ServiceResult<(StatusCode, Json<WriteResponse>)> {
    state.service.insert(&ns, &key, &body).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse { namespace: ns, key })))
}

async fn get_handler(
    State(state): State<Arc<VolumeState>>,
    Path((ns, key)): Path<(String, String)>,
) -> ServiceResult<Response> {
    let data = state.service.get(&ns, &key).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], data).into_response())
}

async fn delete_handler(
    State(state): State<Arc<VolumeState>>,
    Path((ns, key)): Path<(String, String)>,
) -> ServiceResult<Json<MessageResponse>> {
    state.service.delete(&ns, &key).await?;
    Ok(Json(MessageResponse {
        msg: "ok".to_string(),
    }))
}

// ==================
// Listing Handlers
// ==================

async fn list_data_handler(
    State(state): State<Arc<VolumeState>>,
    Path(ns): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ServiceResult<Json<Page<DataRow>>> {
    let pagination = parse_pagination(&query)?;
    let page = state.service.list(&ns, pagination).await?;
    let page = page.try_map(|record| Ok::<_, ServiceError>(DataRow::from(record)))?;
    Ok(Json(page))
}

async fn list_keys_handler(
    State(state): State<Arc<VolumeState>>,
    Path(ns): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ServiceResult<Json<Page<KeyEntry>>> {
    let pagination = parse_pagination(&query)?;
    Ok(Json(state.service.list_keys(&ns, pagination).await?))
}

// ==================
// Namespace Handlers
// ==================

async fn list_namespaces_handler(State(state): State<Arc<VolumeState>>) -> Json<Vec<String>> {
    Json(state.service.namespaces())
}

async fn create_namespace_handler(
    State(state): State<Arc<VolumeState>>,
    body: Bytes,
) -> ServiceResult<(StatusCode, Json<Vec<String>>)> {
    let request: CreateNamespaceRequest = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::InvalidArgument(format!("invalid namespace request: {}", e)))?;

    let (created, names) = state
        .service
        .create_namespace(&request.name, request.stream)
        .await?;

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(names)))
}

async fn backup_handler(
    State(state): State<Arc<VolumeState>>,
    Path(ns): Path<String>,
) -> ServiceResult<Json<BackupResponse>> {
    let path = state.service.backup(&ns).await?;
    Ok(Json(BackupResponse {
        namespace: ns,
        path: path.display().to_string(),
    }))
}
