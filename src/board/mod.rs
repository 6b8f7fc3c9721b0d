//! Client-held board for one project: tasks split into Todo / In Progress /
//! Done columns, kept in step with the server.

use uuid::Uuid;

use crate::client::ClientError;

mod api;
mod model;
mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use api::TaskApi;
pub use model::{Board, MoveOutcome};
pub use state::{BoardState, BoardView, DropTarget, Position};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Api(#[from] ClientError),
    #[error("task {0} is not on the board")]
    UnknownTask(Uuid),
    #[error("no project loaded")]
    NotLoaded,
}

impl BoardError {
    /// The session is gone; the caller should log out.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BoardError::Api(e) if e.is_unauthorized())
    }
}
