use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::CreateProjectRequest,
    repo_types::{NewProject, Project},
};
use crate::{
    auth::AuthUser,
    error::{required, ApiError, MessageBody},
    state::AppState,
};

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:id", get(get_project).delete(delete_project))
}

#[instrument(skip(state, payload))]
pub async fn create_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let Json(payload) = payload?;
    let (name, description) = match (required(payload.name), required(payload.description)) {
        (Ok(n), Ok(d)) => (n, d),
        _ => {
            warn!("project fields missing");
            return Err(ApiError::validation("Please enter all fields"));
        }
    };

    let project = state
        .store
        .insert_project(NewProject {
            name,
            description,
            created_by: user_id,
        })
        .await?;

    info!(project_id = %project.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// Projects owned by the caller.
#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.store.list_projects_by_owner(user_id).await?))
}

/// Any authenticated caller may fetch any project by id; ownership is not checked.
#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Project>, ApiError> {
    let Path(id) = path?;
    state
        .store
        .find_project(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// Unscoped like [`get_project`]. Tasks of the project are left in place.
#[instrument(skip(state))]
pub async fn delete_project(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageBody>, ApiError> {
    let Path(id) = path?;
    if !state.store.delete_project(id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    info!(project_id = %id, "project deleted");
    Ok(Json(MessageBody::new("Project removed")))
}
