//! Activity log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    CreatedProject,
    UpdatedProject,
    CreatedTask,
    UpdatedTask,
    DeletedTask,
    CreatedSubtask,
    UpdatedSubtask,
    AddedComment,
}

impl ActivityAction {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::CreatedProject => "created_project",
            ActivityAction::UpdatedProject => "updated_project",
            ActivityAction::CreatedTask => "created_task",
            ActivityAction::UpdatedTask => "updated_task",
            ActivityAction::DeletedTask => "deleted_task",
            ActivityAction::CreatedSubtask => "created_subtask",
            ActivityAction::UpdatedSubtask => "updated_subtask",
            ActivityAction::AddedComment => "added_comment",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_project" => Some(ActivityAction::CreatedProject),
            "updated_project" => Some(ActivityAction::UpdatedProject),
            "created_task" => Some(ActivityAction::CreatedTask),
            "updated_task" => Some(ActivityAction::UpdatedTask),
            "deleted_task" => Some(ActivityAction::DeletedTask),
            "created_subtask" => Some(ActivityAction::CreatedSubtask),
            "updated_subtask" => Some(ActivityAction::UpdatedSubtask),
            "added_comment" => Some(ActivityAction::AddedComment),
            _ => None,
        }
    }
}

/// Kind of resource an entry is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityType {
    Task,
    Project,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Task => "Task",
            EntityType::Project => "Project",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Task" => Some(EntityType::Task),
            "Project" => Some(EntityType::Project),
            _ => None,
        }
    }
}

/// Display information about the actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
}

/// One immutable row of the activity log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub user_id: String,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub description: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    /// Filled in when listing; absent if the actor no longer resolves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Actor>,
}

impl ActivityEntry {
    /// Build an entry whose metadata mirrors the description
    pub fn new(
        user_id: impl Into<String>,
        action: ActivityAction,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let description = description.into();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            action,
            entity_type,
            entity_id: entity_id.into(),
            metadata: serde_json::json!({ "description": description }),
            description,
            created_at: Utc::now(),
            user: None,
        }
    }
}

/// Shorten free text for log descriptions: 50 characters, then `...`
pub fn preview(text: &str) -> String {
    const LIMIT: usize = 50;
    if text.chars().count() > LIMIT {
        let head: String = text.chars().take(LIMIT).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
