use async_trait::async_trait;
use uuid::Uuid;

use crate::projects::repo_types::{NewProject, Project};
use crate::tasks::repo_types::{NewTask, Task, TaskPatch};
use crate::users::repo_types::{NewUser, User};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence for users, projects and tasks.
///
/// Lists come back in store iteration order (insertion order for both
/// implementations). Task `project_id` is not checked against projects.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns `None` when the email is already registered.
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;

    async fn insert_project(&self, project: NewProject) -> anyhow::Result<Project>;
    async fn list_projects_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Project>>;
    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>>;
    /// Returns `false` when nothing was deleted.
    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn insert_task(&self, task: NewTask) -> anyhow::Result<Task>;
    async fn list_tasks_by_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Task>>;
    /// Returns the updated task, or `None` if it does not exist.
    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool>;
}
