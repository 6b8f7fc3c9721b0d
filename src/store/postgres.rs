use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::DocumentStore;
use crate::projects::repo_types::{NewProject, Project};
use crate::tasks::repo_types::{NewTask, Task, TaskPatch, TaskRow};
use crate::users::repo_types::{NewUser, User};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const TASK_COLUMNS: &str =
    "id, project_id, title, description, status, assignee, due_date, created_at";

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING id, name, email, password_hash, avatar
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, avatar
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"SELECT id, name, email, password_hash, avatar FROM users ORDER BY seq"#,
        )
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn insert_project(&self, project: NewProject) -> anyhow::Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (id, name, description, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, created_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_by)
        .fetch_one(&self.db)
        .await
        .context("insert project")?;
        Ok(project)
    }

    async fn list_projects_by_owner(&self, owner: Uuid) -> anyhow::Result<Vec<Project>> {
        let rows = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, created_by, created_at
            FROM projects
            WHERE created_by = $1
            ORDER BY seq
            "#,
        )
        .bind(owner)
        .fetch_all(&self.db)
        .await
        .context("list projects by owner")?;
        Ok(rows)
    }

    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let row = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, name, description, created_by, created_at
            FROM projects
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find project")?;
        Ok(row)
    }

    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM projects WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete project")?;
        Ok(res.rows_affected() > 0)
    }

    async fn insert_task(&self, task: NewTask) -> anyhow::Result<Task> {
        let sql = format!(
            "INSERT INTO tasks (id, project_id, title, description, status, assignee, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(task.project_id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status.as_str())
            .bind(task.assignee)
            .bind(task.due_date)
            .fetch_one(&self.db)
            .await
            .context("insert task")?;
        row.try_into()
    }

    async fn list_tasks_by_project(&self, project_id: Uuid) -> anyhow::Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY seq");
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.db)
            .await
            .context("list tasks by project")?;
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>> {
        let sql = format!(
            "UPDATE tasks SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 status = COALESCE($4, status),
                 assignee = COALESCE($5, assignee),
                 due_date = COALESCE($6, due_date)
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(patch.status.map(|s| s.as_str()))
            .bind(patch.assignee)
            .bind(patch.due_date)
            .fetch_optional(&self.db)
            .await
            .context("update task")?;
        row.map(Task::try_from).transpose()
    }

    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query(r#"DELETE FROM tasks WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete task")?;
        Ok(res.rows_affected() > 0)
    }
}
