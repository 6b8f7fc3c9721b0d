use async_trait::async_trait;
use uuid::Uuid;

use crate::client::ClientError;
use crate::tasks::{dto::CreateTaskRequest, Task, TaskPatch};

/// The task endpoints the board talks to.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, project_id: Uuid) -> Result<Vec<Task>, ClientError>;
    async fn create_task(
        &self,
        project_id: Uuid,
        draft: &CreateTaskRequest,
    ) -> Result<Task, ClientError>;
    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> Result<Task, ClientError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), ClientError>;
}
