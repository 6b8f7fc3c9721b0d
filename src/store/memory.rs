use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::DocumentStore;
use crate::projects::repo_types::{NewProject, Project};
use crate::tasks::repo_types::{NewTask, Task, TaskPatch};
use crate::users::repo_types::{NewUser, User};

/// Process-local store. Collections are kept in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    projects: RwLock<Vec<Project>>,
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("memory store lock poisoned")
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let mut users = self.users.write().map_err(poisoned)?;
        if users.iter().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            avatar: None,
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.read().map_err(poisoned)?.clone())
    }

    async fn insert_project(&self, project: NewProject) -> anyhow::Result<Project> {
        let project = Project {
            id: Uuid::new_v4(),
            name: project.name,
            description: project.description,
            created_by: project.created_by,
            created_at: OffsetDateTime::now_utc(),
        };
        self.projects.write().map_err(poisoned)?.push(project.clone());
        Ok(project)
    }

    async fn list_projects_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Project>> {
        let projects = self.projects.read().map_err(poisoned)?;
        Ok(projects.iter().filter(|p| p.created_by == owner).cloned().collect())
    }

    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let projects = self.projects.read().map_err(poisoned)?;
        Ok(projects.iter().find(|p| p.id == id).cloned())
    }

    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut projects = self.projects.write().map_err(poisoned)?;
        let before = projects.len();
        projects.retain(|p| p.id != id);
        Ok(projects.len() != before)
    }

    async fn insert_task(&self, task: NewTask) -> anyhow::Result<Task> {
        let task = Task {
            id: Uuid::new_v4(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            status: task.status,
            assignee: task.assignee,
            due_date: task.due_date,
            created_at: OffsetDateTime::now_utc(),
        };
        self.tasks.write().map_err(poisoned)?.push(task.clone());
        Ok(task)
    }

    async fn list_tasks_by_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.iter().filter(|t| t.project_id == project_id).cloned().collect())
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        Ok(tasks.iter_mut().find(|t| t.id == id).map(|task| {
            patch.apply_to(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }
}
