//! Task aggregate: tasks, subtasks, comments and their activity trail
//!
//! Every mutation follows the same shape: load the task, check the caller
//! against its project, write, touch `updated_at`, append one activity entry
//! and return the refreshed detail.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::info;

use super::validators::TaskValidator;
use crate::auth::AuthUser;
use crate::domain::access::AccessGate;
use crate::domain::activity::{
    ActivityAction, ActivityEntry, ActivityRepository, EntityType, preview,
};
use crate::domain::project::{ProjectRepository, ProjectWithMembers};
use crate::domain::task::{
    Comment, Subtask, Task, TaskDeleted, TaskDetail, TaskPriority, TaskRepository, TaskStatus,
    TaskView,
};
use crate::domain::user::{UserRef, UserRepository, UserSummary};
use crate::error::{Error, Result};
use crate::storage::Database;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default, rename = "dueDate", alias = "due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDescriptionRequest {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePriorityRequest {
    pub priority: TaskPriority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAssigneesRequest {
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddSubtaskRequest {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSubtaskRequest {
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

/// Task operations
#[derive(Clone)]
pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a task in `project_id`
    ///
    /// Assignee ids must name existing users; they are not checked against
    /// project membership.
    pub async fn create(&self, project_id: &str, caller: &AuthUser, request: CreateTaskRequest) -> Result<TaskDetail> {
        TaskValidator::validate_title(&request.title)?;
        AccessGate::new(&self.db).require_member(project_id, &caller.id).await?;

        let mut task = Task::new(project_id, request.title.trim(), &caller.id);
        task.description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        task.priority = request.priority;
        task.due_date = request.due_date;
        task.set_status(request.status, task.created_at);

        let assignees = dedup(request.assignees);
        let mut tx = self.db.pool().begin().await?;
        match self.write_new_task(&mut tx, &task, &assignees).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "Failed to roll back task creation");
                }
                return Err(e);
            }
        }

        self.record(caller, ActivityAction::CreatedTask, &task.id, format!("created task {}", task.title))
            .await?;
        info!(task_id = %task.id, project_id = %project_id, "Created task");

        self.detail(task).await
    }

    async fn write_new_task(&self, conn: &mut SqliteConnection, task: &Task, assignees: &[String]) -> Result<()> {
        let repo = TaskRepository::new(&self.db);
        repo.insert(&mut *conn, task).await?;
        if !assignees.is_empty() {
            repo.write_assignees(conn, &task.id, assignees).await?;
        }
        Ok(())
    }

    /// A task with its project, for members of that project
    pub async fn get(&self, task_id: &str, caller: &AuthUser) -> Result<TaskView> {
        let (task, project) = AccessGate::new(&self.db)
            .require_task_member(task_id, &caller.id)
            .await?;
        let members = ProjectRepository::new(&self.db).members(&project.id).await?;

        Ok(TaskView {
            task: self.detail(task).await?,
            project: ProjectWithMembers { project, members },
        })
    }

    pub async fn update_title(&self, task_id: &str, caller: &AuthUser, request: UpdateTitleRequest) -> Result<TaskDetail> {
        TaskValidator::validate_title(&request.title)?;
        let mut task = self.load_for_member(task_id, caller).await?;

        let old = std::mem::replace(&mut task.title, request.title.trim().to_string());
        let description = format!("updated task title from {} to {}", old, task.title);
        self.save_and_record(task, caller, description).await
    }

    pub async fn update_description(
        &self,
        task_id: &str,
        caller: &AuthUser,
        request: UpdateDescriptionRequest,
    ) -> Result<TaskDetail> {
        let mut task = self.load_for_member(task_id, caller).await?;

        let old = task.description.take().unwrap_or_default();
        let description = format!(
            "updated task description from {} to {}",
            preview(&old),
            preview(&request.description)
        );
        task.description = Some(request.description).filter(|d| !d.is_empty());
        self.save_and_record(task, caller, description).await
    }

    pub async fn update_status(&self, task_id: &str, caller: &AuthUser, request: UpdateStatusRequest) -> Result<TaskDetail> {
        let mut task = self.load_for_member(task_id, caller).await?;

        let old = task.status;
        task.set_status(request.status, Utc::now());
        let description = format!(
            "updated task status from {} to {}",
            old.as_str(),
            request.status.as_str()
        );
        self.save_and_record(task, caller, description).await
    }

    pub async fn update_priority(
        &self,
        task_id: &str,
        caller: &AuthUser,
        request: UpdatePriorityRequest,
    ) -> Result<TaskDetail> {
        let mut task = self.load_for_member(task_id, caller).await?;

        let old = std::mem::replace(&mut task.priority, request.priority);
        let description = format!(
            "updated task priority from {} to {}",
            old.as_str(),
            request.priority.as_str()
        );
        self.save_and_record(task, caller, description).await
    }

    /// Replace the assignee set
    pub async fn update_assignees(
        &self,
        task_id: &str,
        caller: &AuthUser,
        request: UpdateAssigneesRequest,
    ) -> Result<TaskDetail> {
        let task = self.load_for_member(task_id, caller).await?;
        let repo = TaskRepository::new(&self.db);

        let old = repo.assignees(&task.id).await?;
        repo.replace_assignees(&task.id, &dedup(request.assignees)).await?;
        let new = repo.assignees(&task.id).await?;

        let description = format!(
            "updated task assignees from {} to {}",
            assignee_names(&old),
            assignee_names(&new)
        );
        self.save_and_record(task, caller, description).await
    }

    pub async fn add_subtask(&self, task_id: &str, caller: &AuthUser, request: AddSubtaskRequest) -> Result<TaskDetail> {
        TaskValidator::validate_subtask_title(&request.title)?;
        let task = self.load_for_member(task_id, caller).await?;

        let subtask = Subtask::new(&task.id, request.title.trim());
        TaskRepository::new(&self.db).create_subtask(&subtask).await?;

        self.touch_and_record(task, caller, ActivityAction::CreatedSubtask, format!("created subtask {}", subtask.title))
            .await
    }

    /// Toggle a subtask
    ///
    /// Only existence is checked; every call is logged, even when the value
    /// does not change.
    pub async fn update_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        caller: &AuthUser,
        request: UpdateSubtaskRequest,
    ) -> Result<TaskDetail> {
        let repo = TaskRepository::new(&self.db);
        let task = repo
            .get(task_id)
            .await?
            .ok_or_else(|| Error::NotFound("Task not found".to_string()))?;
        let mut subtask = repo
            .get_subtask(task_id, subtask_id)
            .await?
            .ok_or_else(|| Error::NotFound("Subtask not found".to_string()))?;

        subtask.completed = request.completed;
        subtask.updated_at = Utc::now();
        repo.update_subtask(&subtask).await?;

        self.touch_and_record(task, caller, ActivityAction::UpdatedSubtask, format!("updated subtask {}", subtask.title))
            .await
    }

    pub async fn add_comment(&self, task_id: &str, caller: &AuthUser, request: AddCommentRequest) -> Result<Comment> {
        TaskValidator::validate_comment(&request.text)?;
        let task = self.load_for_member(task_id, caller).await?;

        let author = UserRef {
            id: caller.id.clone(),
            name: caller.name.clone(),
        };
        let comment = Comment::new(&task.id, author, request.text.trim());
        TaskRepository::new(&self.db).create_comment(&comment).await?;

        let description = format!("added comment {}", preview(&comment.text));
        self.touch_and_record(task, caller, ActivityAction::AddedComment, description)
            .await?;
        Ok(comment)
    }

    /// Comments on a task, newest first
    pub async fn list_comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        TaskRepository::new(&self.db).comments(task_id).await
    }

    /// Delete a task; only its creator may do so
    pub async fn delete(&self, task_id: &str, caller: &AuthUser) -> Result<TaskDeleted> {
        let task = AccessGate::new(&self.db)
            .require_task_creator(task_id, &caller.id)
            .await?;

        TaskRepository::new(&self.db).delete(&task.id).await?;
        self.record(caller, ActivityAction::DeletedTask, &task.id, format!("deleted task \"{}\"", task.title))
            .await?;
        info!(task_id = %task.id, project_id = %task.project_id, "Deleted task");

        Ok(TaskDeleted {
            message: "Task deleted successfully".to_string(),
            task_id: task.id,
            project_id: task.project_id,
        })
    }

    /// Activity about any entity, newest first
    pub async fn list_activity(&self, entity_id: &str) -> Result<Vec<ActivityEntry>> {
        ActivityRepository::new(&self.db).list_for_entity(entity_id).await
    }

    async fn load_for_member(&self, task_id: &str, caller: &AuthUser) -> Result<Task> {
        let (task, _) = AccessGate::new(&self.db)
            .require_task_member(task_id, &caller.id)
            .await?;
        Ok(task)
    }

    async fn save_and_record(&self, mut task: Task, caller: &AuthUser, description: String) -> Result<TaskDetail> {
        task.updated_at = Utc::now();
        TaskRepository::new(&self.db).update(&task).await?;

        self.record(caller, ActivityAction::UpdatedTask, &task.id, description).await?;
        info!(task_id = %task.id, user_id = %caller.id, "Updated task");

        self.detail(task).await
    }

    async fn touch_and_record(
        &self,
        mut task: Task,
        caller: &AuthUser,
        action: ActivityAction,
        description: String,
    ) -> Result<TaskDetail> {
        task.updated_at = Utc::now();
        TaskRepository::new(&self.db).update(&task).await?;

        self.record(caller, action, &task.id, description).await?;
        info!(task_id = %task.id, action = action.as_str(), "Task changed");

        self.detail(task).await
    }

    async fn record(&self, caller: &AuthUser, action: ActivityAction, task_id: &str, description: String) -> Result<()> {
        let entry = ActivityEntry::new(&caller.id, action, EntityType::Task, task_id, description);
        ActivityRepository::new(&self.db).record(&entry).await
    }

    async fn detail(&self, task: Task) -> Result<TaskDetail> {
        let repo = TaskRepository::new(&self.db);
        let created_by_user = UserRepository::new(&self.db)
            .get(&task.created_by)
            .await?
            .map(|u| u.summary());

        Ok(TaskDetail {
            created_by_user,
            assignees: repo.assignees(&task.id).await?,
            subtasks: repo.subtasks(&task.id).await?,
            task,
        })
    }
}

fn assignee_names(users: &[UserSummary]) -> String {
    if users.is_empty() {
        "Unassigned".to_string()
    } else {
        users.iter().map(|u| u.name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

fn dedup(mut ids: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));
    ids
}
