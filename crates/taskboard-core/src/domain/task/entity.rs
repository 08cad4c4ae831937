//! Task entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::project::ProjectWithMembers;
use crate::domain::user::{UserRef, UserSummary};

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Testing,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::Testing,
        TaskStatus::Done,
    ];

    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Testing => "Testing",
            TaskStatus::Done => "Done",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "To Do" => Some(TaskStatus::ToDo),
            "In Progress" => Some(TaskStatus::InProgress),
            "Testing" => Some(TaskStatus::Testing),
            "Done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(TaskPriority::Low),
            "Medium" => Some(TaskPriority::Medium),
            "High" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// A unit of work inside a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    /// Creator's user id; never changes
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set while the task sits in `Done`
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task in `project_id`
    pub fn new(
        project_id: impl Into<String>,
        title: impl Into<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            due_date: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Move to a new status, keeping `completed_at` in step
    pub fn set_status(&mut self, status: TaskStatus, at: DateTime<Utc>) {
        if status == TaskStatus::Done && self.status != TaskStatus::Done {
            self.completed_at = Some(at);
        } else if status != TaskStatus::Done {
            self.completed_at = None;
        }
        self.status = status;
    }

    pub fn brief(&self) -> TaskBrief {
        TaskBrief {
            id: self.id.clone(),
            title: self.title.clone(),
            status: self.status,
            priority: self.priority,
        }
    }
}

/// Compact task view used inside project details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBrief {
    pub id: String,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

/// Checklist item belonging to a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subtask {
    pub fn new(task_id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            title: title.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A comment left on a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub task_id: String,
    pub text: String,
    pub author: UserRef,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(task_id: impl Into<String>, author: UserRef, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            text: text.into(),
            author,
            created_at: Utc::now(),
        }
    }
}

/// Task row in a project's task board
#[derive(Debug, Clone, Serialize)]
pub struct TaskListItem {
    #[serde(flatten)]
    pub task: Task,
    pub assignees: Vec<UserRef>,
}

/// A task with everything needed to render it
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub created_by_user: Option<UserSummary>,
    pub assignees: Vec<UserSummary>,
    pub subtasks: Vec<Subtask>,
}

/// A task together with its parent project
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub task: TaskDetail,
    pub project: ProjectWithMembers,
}

/// Project board: the project, its members and all tasks
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTasks {
    pub project: ProjectWithMembers,
    pub tasks: Vec<TaskListItem>,
}

/// Confirmation returned after a task is removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDeleted {
    pub message: String,
    pub task_id: String,
    pub project_id: String,
}
