use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateTaskRequest, UpdateTaskRequest},
    repo_types::{NewTask, Task},
};
use crate::{
    auth::AuthUser,
    error::{required, ApiError, MessageBody},
    state::AppState,
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/tasks",
            get(list_tasks).post(create_task),
        )
        .route("/tasks/:id", put(update_task).delete(delete_task))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Path(project_id) = path?;
    let Json(payload) = payload?;
    let (title, description) = match (required(payload.title), required(payload.description)) {
        (Ok(t), Ok(d)) => (t, d),
        _ => {
            warn!(%project_id, "task fields missing");
            return Err(ApiError::validation("Please enter all required fields"));
        }
    };

    let task = state
        .store
        .insert_task(NewTask {
            project_id,
            title,
            description,
            status: payload.status.unwrap_or_default(),
            assignee: payload.assignee,
            due_date: payload.due_date,
        })
        .await?;

    info!(task_id = %task.id, %project_id, status = %task.status, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Path(project_id) = path?;
    Ok(Json(state.store.list_tasks_by_project(project_id).await?))
}

/// Partial update; only fields present in the body change.
#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
    if blank(&patch.title) || blank(&patch.description) {
        warn!(task_id = %id, "blank field in task update");
        return Err(ApiError::validation("Title and description cannot be empty"));
    }

    let task = state
        .store
        .update_task(id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    info!(task_id = %id, status = %task.status, "task updated");
    Ok(Json(task))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Path(id) = path?;
    if !state.store.delete_task(id).await? {
        return Err(ApiError::not_found("Task not found"));
    }
    info!(task_id = %id, "task deleted");
    Ok(Json(MessageBody::new("Task removed")))
}
