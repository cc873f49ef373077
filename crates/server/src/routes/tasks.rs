use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use models::{NewTask, Task, TaskId, TaskStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::auth::{AuthUser, ServerState};
use super::JsonBody;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    #[serde(default)]
    pub status: String,
}

fn task_id(raw: &str) -> Result<TaskId, ApiError> {
    raw.parse().map_err(|_| ApiError::BadRequest("Invalid task ID".into()))
}

pub async fn list_tasks(State(state): State<ServerState>, Extension(user): Extension<AuthUser>) -> Json<Vec<Task>> {
    Json(state.store.list_tasks(user.user_id).await)
}

pub async fn create_task(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(input): JsonBody<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    input.validate().map_err(|_| ApiError::BadRequest("Title is required".into()))?;
    let task = state.store.insert_task(user.user_id, input.title, input.description).await;
    info!(user_id = user.user_id, task_id = task.id, "task_created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    JsonBody(payload): JsonBody<StatusPayload>,
) -> Result<Json<Value>, ApiError> {
    let id = task_id(&raw_id)?;
    let status: TaskStatus = payload
        .status
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid status value".into()))?;
    if !state.store.set_status(user.user_id, id, status).await {
        return Err(ApiError::NotFound("Task not found or you do not have permission to update it".into()));
    }
    info!(user_id = user.user_id, task_id = id, %status, "task_updated");
    Ok(Json(json!({"message": "Task updated successfully"})))
}

pub async fn delete_task(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = task_id(&raw_id)?;
    if !state.store.delete_task(user.user_id, id).await {
        return Err(ApiError::NotFound("Task not found or you do not have permission to delete it".into()));
    }
    info!(user_id = user.user_id, task_id = id, "task_deleted");
    Ok(Json(json!({"message": "Task deleted successfully"})))
}
