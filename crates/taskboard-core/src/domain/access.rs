//! Authorization gate
//!
//! Read-only predicates over membership and authorship. The `require_*`
//! helpers check existence first, then permission, so a missing resource is
//! always `NotFound` and an existing one the caller may not touch is
//! `Forbidden`.

use crate::domain::project::Project;
use crate::domain::task::Task;
use crate::error::{Error, Result};
use crate::storage::Database;

/// Membership and authorship checks
pub struct AccessGate<'a> {
    db: &'a Database,
}

impl<'a> AccessGate<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Whether `user_id` has a membership row in `project_id`
    pub async fn is_project_member(&self, project_id: &str, user_id: &str) -> Result<bool> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM project_members WHERE project_id = ? AND user_id = ?")
                .bind(project_id)
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;
        Ok(row.is_some())
    }

    /// Whether `user_id` created `project_id`
    pub async fn is_project_creator(&self, project_id: &str, user_id: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM projects WHERE id = ? AND created_by = ?")
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Whether `user_id` created `task_id`
    pub async fn is_task_creator(&self, task_id: &str, user_id: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM tasks WHERE id = ? AND created_by = ?")
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(row.is_some())
    }

    /// Load a project the caller belongs to
    pub async fn require_member(&self, project_id: &str, user_id: &str) -> Result<Project> {
        let project = self.load_project(project_id).await?;
        if !self.is_project_member(project_id, user_id).await? {
            return Err(Error::Forbidden(
                "You are not a member of this project".to_string(),
            ));
        }
        Ok(project)
    }

    /// Load a project the caller created
    pub async fn require_creator(&self, project_id: &str, user_id: &str) -> Result<Project> {
        let project = self.load_project(project_id).await?;
        if project.created_by != user_id {
            return Err(Error::Forbidden(
                "Only the project creator can modify this project".to_string(),
            ));
        }
        Ok(project)
    }

    /// Load a task whose parent project the caller belongs to
    pub async fn require_task_member(&self, task_id: &str, user_id: &str) -> Result<(Task, Project)> {
        let task = self.load_task(task_id).await?;
        let project = self.require_member(&task.project_id, user_id).await?;
        Ok((task, project))
    }

    /// Load a task the caller created
    pub async fn require_task_creator(&self, task_id: &str, user_id: &str) -> Result<Task> {
        let task = self.load_task(task_id).await?;
        if task.created_by != user_id {
            return Err(Error::Forbidden(
                "Only the task creator can delete this task".to_string(),
            ));
        }
        Ok(task)
    }

    async fn load_project(&self, project_id: &str) -> Result<Project> {
        crate::domain::project::ProjectRepository::new(self.db)
            .get(project_id)
            .await?
            .ok_or_else(|| Error::NotFound("Project not found".to_string()))
    }

    async fn load_task(&self, task_id: &str) -> Result<Task> {
        crate::domain::task::TaskRepository::new(self.db)
            .get(task_id)
            .await?
            .ok_or_else(|| Error::NotFound("Task not found".to_string()))
    }
}
