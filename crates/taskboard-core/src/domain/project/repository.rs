//! Project repository for database operations
//!
//! Writes that take part in a transaction accept any SQLite executor, so the
//! caller can pass either the pool or `&mut *tx`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqliteExecutor, SqliteRow};

use super::entity::{Project, ProjectMember, ProjectRole, ProjectStatus};
use crate::Result;
use crate::domain::user::UserSummary;
use crate::storage::Database;

const PROJECT_COLUMNS: &str =
    "p.id, p.title, p.description, p.status, p.created_by, p.created_at, p.updated_at";

/// Project repository for database operations
pub struct ProjectRepository<'a> {
    db: &'a Database,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new project repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a project row
    pub async fn insert<'e>(&self, executor: impl SqliteExecutor<'e>, project: &Project) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (id, title, description, status, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(&project.created_by)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Overwrite title, description and status
    pub async fn update_details<'e>(
        &self,
        executor: impl SqliteExecutor<'e>,
        project: &Project,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE projects
            SET title = ?, description = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.updated_at)
        .bind(&project.id)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Add a member; fails if the pair already exists
    pub async fn insert_member<'e>(
        &self,
        executor: impl SqliteExecutor<'e>,
        project_id: &str,
        user_id: &str,
        role: ProjectRole,
        joined_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(joined_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Add a member or change the role of an existing one
    pub async fn upsert_member<'e>(
        &self,
        executor: impl SqliteExecutor<'e>,
        project_id: &str,
        user_id: &str,
        role: ProjectRole,
        joined_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role, joined_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(project_id, user_id) DO UPDATE SET role = excluded.role
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(joined_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Remove every member except `keep_user_id`
    pub async fn remove_members_except<'e>(
        &self,
        executor: impl SqliteExecutor<'e>,
        project_id: &str,
        keep_user_id: &str,
    ) -> Result<u64> {
        let result = sqlx::query("DELETE FROM project_members WHERE project_id = ? AND user_id != ?")
            .bind(project_id)
            .bind(keep_user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Get a project by ID
    pub async fn get(&self, id: &str) -> Result<Option<Project>> {
        let row = sqlx::query(&format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| self.row_to_project(&r)))
    }

    /// Check if a project exists
    pub async fn exists(&self, id: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }

    /// Permanently delete a project; members and tasks cascade
    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Role of a user in a project, if they are a member
    pub async fn member_role(&self, project_id: &str, user_id: &str) -> Result<Option<ProjectRole>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT role FROM project_members WHERE project_id = ? AND user_id = ?")
                .bind(project_id)
                .bind(user_id)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(|(role,)| ProjectRole::parse(&role).unwrap_or_default()))
    }

    /// Members of a project in join order
    pub async fn members(&self, project_id: &str) -> Result<Vec<ProjectMember>> {
        let rows = sqlx::query(
            r#"
            SELECT m.project_id, m.user_id, m.role, m.joined_at, u.name, u.email
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = ?
            ORDER BY m.joined_at, m.rowid
            "#,
        )
        .bind(project_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(|r| self.row_to_member(r)).collect())
    }

    /// Projects the user belongs to, newest first, with the caller's role and the creator profile
    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<(Project, ProjectRole, Option<UserSummary>)>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}, m.role AS user_role, cu.name AS creator_name, cu.email AS creator_email
            FROM projects p
            JOIN project_members m ON m.project_id = p.id AND m.user_id = ?
            LEFT JOIN users cu ON cu.id = p.created_by
            ORDER BY p.created_at DESC, p.rowid DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|r| {
                let project = self.row_to_project(r);
                let role = ProjectRole::parse(r.get("user_role")).unwrap_or_default();
                let creator_name: Option<String> = r.get("creator_name");
                let creator_email: Option<String> = r.get("creator_email");
                let creator = creator_name.zip(creator_email).map(|(name, email)| UserSummary {
                    id: project.created_by.clone(),
                    name,
                    email,
                });
                (project, role, creator)
            })
            .collect())
    }

    /// Members of every project the user belongs to, keyed by project id
    pub async fn members_of_user_projects(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, Vec<ProjectMember>>> {
        let rows = sqlx::query(
            r#"
            SELECT m.project_id, m.user_id, m.role, m.joined_at, u.name, u.email
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id IN (SELECT project_id FROM project_members WHERE user_id = ?)
            ORDER BY m.joined_at, m.rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut by_project: HashMap<String, Vec<ProjectMember>> = HashMap::new();
        for row in &rows {
            let project_id: String = row.get("project_id");
            by_project
                .entry(project_id)
                .or_default()
                .push(self.row_to_member(row));
        }
        Ok(by_project)
    }

    /// Task counts of every project the user belongs to, keyed by project id
    pub async fn task_counts_of_user_projects(&self, user_id: &str) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT project_id, COUNT(*)
            FROM tasks
            WHERE project_id IN (SELECT project_id FROM project_members WHERE user_id = ?)
            GROUP BY project_id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Convert a database row to a Project
    fn row_to_project(&self, row: &SqliteRow) -> Project {
        Project {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            status: ProjectStatus::parse(row.get("status")).unwrap_or_default(),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_member(&self, row: &SqliteRow) -> ProjectMember {
        ProjectMember {
            user_id: row.get("user_id"),
            name: row.get("name"),
            email: row.get("email"),
            role: ProjectRole::parse(row.get("role")).unwrap_or_default(),
            joined_at: row.get("joined_at"),
        }
    }
}
