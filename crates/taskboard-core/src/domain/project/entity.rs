//! Project entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::task::TaskBrief;
use crate::domain::user::UserSummary;

/// Role a user holds inside one project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Admin,
    Manager,
    #[default]
    Member,
    Developer,
    Qa,
}

impl ProjectRole {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectRole::Admin => "admin",
            ProjectRole::Manager => "manager",
            ProjectRole::Member => "member",
            ProjectRole::Developer => "developer",
            ProjectRole::Qa => "qa",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(ProjectRole::Admin),
            "manager" => Some(ProjectRole::Manager),
            "member" => Some(ProjectRole::Member),
            "developer" => Some(ProjectRole::Developer),
            "qa" => Some(ProjectRole::Qa),
            _ => None,
        }
    }
}

/// Project lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    Planning,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "On Hold")]
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Cancelled => "Cancelled",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Planning" => Some(ProjectStatus::Planning),
            "In Progress" => Some(ProjectStatus::InProgress),
            "On Hold" => Some(ProjectStatus::OnHold),
            "Completed" => Some(ProjectStatus::Completed),
            "Cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }
}

/// A project owned by its creator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    /// Creator's user id; never changes
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project owned by `created_by`
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        created_by: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description,
            status: ProjectStatus::default(),
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Membership entry as supplied by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInput {
    #[serde(rename = "userId", alias = "user_id")]
    pub user_id: String,
    #[serde(default)]
    pub role: ProjectRole,
}

/// Membership row joined with the member's profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMember {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// One entry of the caller's project list
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub user_role: ProjectRole,
    pub created_by_user: Option<UserSummary>,
    pub members: Vec<ProjectMember>,
    pub task_count: i64,
}

/// A project as seen by one of its members
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub user_role: ProjectRole,
    pub members: Vec<ProjectMember>,
    pub tasks: Vec<TaskBrief>,
}

/// A project with its member list
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithMembers {
    #[serde(flatten)]
    pub project: Project,
    pub members: Vec<ProjectMember>,
}
