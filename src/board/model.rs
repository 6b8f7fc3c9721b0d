use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as TaskLock, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    api::TaskApi,
    state::{BoardState, BoardView, DropTarget},
    BoardError,
};
use crate::tasks::{dto::CreateTaskRequest, Task, TaskPatch, TaskStatus};

/// Result of a drag end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Dropped outside any zone, on itself, or on something unknown.
    Ignored,
    /// Reordered inside its column; nothing was sent.
    Reordered,
    /// Status changed and confirmed by the server.
    Moved { from: TaskStatus, to: TaskStatus },
}

type TaskLocks = Mutex<HashMap<Uuid, Arc<TaskLock<()>>>>;

/// Exclusive access to one task for the length of a mutation.
///
/// On drop the lock is released and its map entry removed unless another
/// caller already holds a handle to it.
struct TaskGuard<'a> {
    locks: &'a TaskLocks,
    id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Waiters clone the handle under this map lock, so the count is stable here.
        if locks.get(&self.id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&self.id);
        }
    }
}

/// Client-side board for one project.
///
/// Reads never wait on the network: mutations apply optimistically where the
/// outcome is predictable and settle when the call returns. Mutating calls on
/// the same task run one at a time, in arrival order.
pub struct Board<A> {
    api: A,
    state: Mutex<BoardState>,
    task_locks: TaskLocks,
}

impl<A: TaskApi> Board<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(BoardState::new()),
            task_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn lock_task(&self, id: Uuid) -> TaskGuard<'_> {
        let lock = {
            let mut locks = self.task_locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(id).or_default().clone()
        };
        TaskGuard {
            locks: &self.task_locks,
            id,
            guard: Some(lock.lock_owned().await),
        }
    }

    #[cfg(test)]
    fn lock_entries(&self) -> usize {
        self.task_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.state().project_id()
    }

    pub fn view(&self) -> BoardView {
        self.state().view()
    }

    pub fn column(&self, status: TaskStatus) -> Vec<Task> {
        let state = self.state();
        state
            .column_ids(status)
            .iter()
            .filter_map(|id| state.task(*id).cloned())
            .collect()
    }

    pub fn column_ids(&self, status: TaskStatus) -> Vec<Uuid> {
        self.state().column_ids(status).to_vec()
    }

    pub fn task(&self, id: Uuid) -> Option<Task> {
        self.state().task(id).cloned()
    }

    /// Replaces the whole board with the server's tasks for `project_id`.
    pub async fn load(&self, project_id: Uuid) -> Result<(), BoardError> {
        let tasks = self.api.list_tasks(project_id).await?;
        let count = tasks.len();
        self.state().replace(project_id, tasks);
        debug!(%project_id, count, "board loaded");
        Ok(())
    }

    /// Invalidates local state and loads the current project again.
    pub async fn reload(&self) -> Result<(), BoardError> {
        let project_id = self.project_id().ok_or(BoardError::NotLoaded)?;
        self.load(project_id).await
    }

    /// Creates on the server, then appends the returned task to its column.
    pub async fn create_task(&self, draft: CreateTaskRequest) -> Result<Task, BoardError> {
        let project_id = self.project_id().ok_or(BoardError::NotLoaded)?;
        let task = self.api.create_task(project_id, &draft).await?;
        self.state().merge(task.clone());
        info!(task_id = %task.id, status = %task.status, "task created");
        Ok(task)
    }

    /// Sends the patch and takes the server's copy on success.
    pub async fn edit_task(&self, id: Uuid, patch: TaskPatch) -> Result<Task, BoardError> {
        let _guard = self.lock_task(id).await;
        if self.state().task(id).is_none() {
            return Err(BoardError::UnknownTask(id));
        }
        let task = self.api.update_task(id, &patch).await?;
        self.state().merge(task.clone());
        debug!(task_id = %id, "task edited");
        Ok(task)
    }

    /// Removes the card right away; puts it back in its old slot if the
    /// server refuses.
    pub async fn delete_task(&self, id: Uuid) -> Result<(), BoardError> {
        let _guard = self.lock_task(id).await;
        let snapshot = {
            let mut state = self.state();
            let snapshot = state.snapshot(id).ok_or(BoardError::UnknownTask(id))?;
            state.remove(id);
            snapshot
        };

        if let Err(e) = self.api.delete_task(id).await {
            let position = snapshot.position();
            let restored = self.state().restore(snapshot);
            warn!(
                task_id = %id,
                status = %position.status,
                index = position.index,
                restored,
                error = %e,
                "delete failed; rolled back"
            );
            return Err(e.into());
        }
        debug!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Drag end.
    ///
    /// Same column: local reorder, no request. Other column: the status
    /// changes locally first, then a status-only update is sent; on failure
    /// the card goes back to where it was and the error is returned.
    pub async fn move_task(
        &self,
        active: Uuid,
        target: Option<DropTarget>,
    ) -> Result<MoveOutcome, BoardError> {
        let Some(target) = target else {
            return Ok(MoveOutcome::Ignored);
        };
        let _guard = self.lock_task(active).await;

        let (snapshot, from, to) = {
            let mut state = self.state();
            let Some(from) = state.task(active).map(|t| t.status) else {
                debug!(task_id = %active, "drag of unknown task ignored");
                return Ok(MoveOutcome::Ignored);
            };
            let Some(to) = state.resolve_target(target) else {
                debug!(task_id = %active, ?target, "drop on unknown target ignored");
                return Ok(MoveOutcome::Ignored);
            };

            if from == to {
                let reordered = match target {
                    DropTarget::Task(over) => state.reorder(active, over),
                    DropTarget::Column(_) => false,
                };
                return Ok(if reordered {
                    MoveOutcome::Reordered
                } else {
                    MoveOutcome::Ignored
                });
            }

            let index = match target {
                DropTarget::Task(over) => state.position(over).map(|p| p.index),
                DropTarget::Column(_) => None,
            };
            let snapshot = state.snapshot(active).ok_or(BoardError::UnknownTask(active))?;
            state.set_status(active, to, index);
            (snapshot, from, to)
        };
        debug!(task_id = %active, %from, %to, "optimistic status change");

        match self.api.update_task(active, &TaskPatch::status_only(to)).await {
            Ok(task) => {
                self.state().merge(task);
                info!(task_id = %active, %from, %to, "task moved");
                Ok(MoveOutcome::Moved { from, to })
            }
            Err(e) => {
                let restored = self.state().restore(snapshot);
                warn!(task_id = %active, %from, %to, restored, error = %e, "move failed; rolled back");
                Err(e.into())
            }
        }
    }
}
