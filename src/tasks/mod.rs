use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo_types;

pub use repo_types::{Task, TaskPatch, TaskStatus};

pub fn router() -> Router<AppState> {
    handlers::task_routes()
}
