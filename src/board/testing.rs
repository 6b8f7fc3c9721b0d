//! Scripted [`TaskApi`] for board tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::TaskApi;
use crate::client::ClientError;
use crate::tasks::{dto::CreateTaskRequest, Task, TaskPatch, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Create(CreateTaskRequest),
    Update(Uuid, TaskPatch),
    Delete(Uuid),
}

/// Holds `update_task` calls until released.
pub struct Gate(Arc<Semaphore>);

impl Gate {
    pub fn release(&self) {
        self.0.close();
    }
}

#[derive(Default)]
pub struct FakeApi {
    tasks: Mutex<Vec<Task>>,
    calls: Mutex<Vec<Call>>,
    fail_next: Mutex<Option<ClientError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
    pending: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, project_id: Uuid, title: &str, status: TaskStatus) -> Uuid {
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title: title.into(),
            description: String::new(),
            status,
            assignee: None,
            due_date: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let id = task.id;
        self.tasks.lock().unwrap().push(task);
        id
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// The next call of any kind fails with `err`.
    pub fn fail_next(&self, err: ClientError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    pub fn hold_updates(&self) -> Gate {
        let sem = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(sem.clone());
        Gate(sem)
    }

    /// Updates currently parked at the gate.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn wait_for_pending(&self, n: usize) {
        while self.pending() < n {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: Call) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(call);
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TaskApi for FakeApi {
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, ClientError> {
        self.record(Call::List)?;
        let tasks = self.tasks.lock().unwrap();
        Ok(tasks.iter().filter(|t| t.project_id == project_id).cloned().collect())
    }

    async fn create_task(
        &self,
        project_id: Uuid,
        draft: &CreateTaskRequest,
    ) -> Result<Task, ClientError> {
        self.record(Call::Create(draft.clone()))?;
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            title: draft.title.clone().unwrap_or_default(),
            description: draft.description.clone().unwrap_or_default(),
            status: draft.status.unwrap_or_default(),
            assignee: draft.assignee,
            due_date: draft.due_date,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, ClientError> {
        self.record(Call::Update(id, patch.clone()))?;
        let gate = self.gate.lock().unwrap().clone();
        if let Some(sem) = gate {
            self.pending.fetch_add(1, Ordering::SeqCst);
            // A closed semaphore means the gate was released.
            let _ = sem.acquire().await;
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ClientError::NotFound("Task not found".into()))?;
        patch.apply_to(task);
        Ok(task.clone())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), ClientError> {
        self.record(Call::Delete(id))?;
        let mut tasks = self.tasks.lock().unwrap();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(ClientError::NotFound("Task not found".into()));
        }
        Ok(())
    }
}
