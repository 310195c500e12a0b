//! HTTP routing and JSON I/O for the task service.
//!
//! # Responsibility
//! - Translate HTTP requests into coordinator calls and results back into
//!   status codes and JSON bodies.
//! - Keep this layer mechanical; all consistency rules live in the core
//!   coordinator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use taskbox_core::{RepoError, TaskDraft, TaskId, TaskPatch, TaskRecord, TaskRepository, TaskService};

/// Shared coordinator handle injected into every handler.
pub type SharedService = Arc<TaskService<Box<dyn TaskRepository + Send + Sync>>>;

/// Builds the full application router.
pub fn build_router(service: SharedService) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/{id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/health", get(health))
        .with_state(service)
}

/// HTTP-facing error. Maps the core error taxonomy onto status codes.
#[derive(Debug)]
enum ApiError {
    Validation(String),
    NotFound(TaskId),
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(message) | Self::Internal(message) => write!(f, "{message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err.to_string()),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message),
            Self::NotFound(id) => (StatusCode::NOT_FOUND, format!("task not found: {id}")),
            Self::Internal(message) => {
                log::error!("event=request_failed module=server status=error error={message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// Store calls are synchronous; run them off the async worker threads.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, RepoError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(err) => Err(ApiError::Internal(format!("worker task failed: {err}"))),
    }
}

async fn list_tasks(State(service): State<SharedService>) -> Result<Json<Vec<TaskRecord>>, ApiError> {
    let records = run_blocking(move || service.list_all()).await?;
    Ok(Json(records))
}

async fn create_task(
    State(service): State<SharedService>,
    Json(draft): Json<TaskDraft>,
) -> Result<(StatusCode, Json<TaskRecord>), ApiError> {
    let record = run_blocking(move || service.create(&draft)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn get_task(
    State(service): State<SharedService>,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskRecord>, ApiError> {
    let record = run_blocking(move || service.get_one(id)).await?;
    record.map(Json).ok_or(ApiError::NotFound(id))
}

async fn update_task(
    State(service): State<SharedService>,
    Path(id): Path<TaskId>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<TaskRecord>, ApiError> {
    let record = run_blocking(move || service.update(id, &patch)).await?;
    Ok(Json(record))
}

async fn delete_task(
    State(service): State<SharedService>,
    Path(id): Path<TaskId>,
) -> Result<StatusCode, ApiError> {
    let deleted = run_blocking(move || service.delete(id)).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(id))
    }
}

/// Liveness probe: answers UP when a store read succeeds.
async fn health(State(service): State<SharedService>) -> Response {
    match run_blocking(move || service.list_all()).await {
        Ok(_) => (StatusCode::OK, Json(json!({ "status": "UP" }))).into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "DOWN", "error": err.to_string() })),
        )
            .into_response(),
    }
}
