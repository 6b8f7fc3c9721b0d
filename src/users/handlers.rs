use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::repo_types::User;
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/users", get(list_users))
}

/// All users, for assignee pickers. Password hashes are never serialized.
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.list_users().await?))
}
