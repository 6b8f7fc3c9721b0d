use crate::state::AppState;
use axum::Router;

pub mod handlers;
pub mod repo_types;

pub use repo_types::{PublicUser, User};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
