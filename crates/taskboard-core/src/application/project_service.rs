//! Project aggregate: creation, membership reconciliation and projections

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::info;

use super::validators::ProjectValidator;
use crate::auth::AuthUser;
use crate::domain::access::AccessGate;
use crate::domain::activity::{ActivityAction, ActivityEntry, ActivityRepository, EntityType};
use crate::domain::project::{
    MemberInput, Project, ProjectDetail, ProjectRepository, ProjectRole, ProjectStatus,
    ProjectSummary, ProjectWithMembers,
};
use crate::domain::task::{ProjectTasks, TaskListItem, TaskRepository};
use crate::error::{Error, Result};
use crate::storage::Database;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub members: Vec<MemberInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<ProjectStatus>,
    /// A non-empty list replaces every non-creator membership
    #[serde(default)]
    pub members: Option<Vec<MemberInput>>,
}

/// Project CRUD and membership
#[derive(Clone)]
pub struct ProjectService {
    db: Database,
}

impl ProjectService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a project; the caller becomes its admin
    ///
    /// The project row and every membership row are written in one
    /// transaction. Entries naming the caller are skipped.
    pub async fn create(&self, caller: &AuthUser, request: CreateProjectRequest) -> Result<ProjectDetail> {
        ProjectValidator::validate_title(&request.title)?;
        ProjectValidator::validate_members(&request.members)?;

        let project = Project::new(
            request.title.trim(),
            normalize_description(request.description),
            &caller.id,
        );

        let mut tx = self.db.pool().begin().await?;
        match self.write_new_project(&mut tx, &project, &request.members).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "Failed to roll back project creation");
                }
                return Err(e);
            }
        }

        self.record(caller, ActivityAction::CreatedProject, &project, format!("created project {}", project.title))
            .await?;
        info!(project_id = %project.id, user_id = %caller.id, "Created project");

        self.get(&project.id, caller).await
    }

    async fn write_new_project(
        &self,
        conn: &mut SqliteConnection,
        project: &Project,
        members: &[MemberInput],
    ) -> Result<()> {
        let repo = ProjectRepository::new(&self.db);
        let now = project.created_at;

        repo.insert(&mut *conn, project).await?;
        repo.insert_member(&mut *conn, &project.id, &project.created_by, ProjectRole::Admin, now)
            .await?;
        for member in members.iter().filter(|m| m.user_id != project.created_by) {
            repo.insert_member(&mut *conn, &project.id, &member.user_id, member.role, now)
                .await?;
        }
        Ok(())
    }

    /// Projects the caller belongs to, newest first
    pub async fn list(&self, caller: &AuthUser) -> Result<Vec<ProjectSummary>> {
        let repo = ProjectRepository::new(&self.db);
        let rows = repo.list_for_user(&caller.id).await?;
        let mut members = repo.members_of_user_projects(&caller.id).await?;
        let counts = repo.task_counts_of_user_projects(&caller.id).await?;

        Ok(rows
            .into_iter()
            .map(|(project, user_role, created_by_user)| ProjectSummary {
                members: members.remove(&project.id).unwrap_or_default(),
                task_count: counts.get(&project.id).copied().unwrap_or(0),
                project,
                user_role,
                created_by_user,
            })
            .collect())
    }

    /// A project the caller belongs to
    ///
    /// Missing projects and projects the caller is not part of both report
    /// `NotFound`.
    pub async fn get(&self, id: &str, caller: &AuthUser) -> Result<ProjectDetail> {
        let repo = ProjectRepository::new(&self.db);
        let not_found = || Error::NotFound("Project not found".to_string());

        let project = repo.get(id).await?.ok_or_else(not_found)?;
        let user_role = repo.member_role(id, &caller.id).await?.ok_or_else(not_found)?;

        Ok(ProjectDetail {
            members: repo.members(id).await?,
            tasks: TaskRepository::new(&self.db).briefs_for_project(id).await?,
            project,
            user_role,
        })
    }

    /// Update details and, when a member list is given, replace the membership set
    ///
    /// Replacement is destructive: every non-creator member not in the list
    /// loses access. The creator's admin row is re-asserted either way.
    pub async fn update(&self, id: &str, caller: &AuthUser, request: UpdateProjectRequest) -> Result<ProjectDetail> {
        ProjectValidator::validate_title(&request.title)?;
        if let Some(members) = &request.members {
            ProjectValidator::validate_members(members)?;
        }

        let mut project = AccessGate::new(&self.db).require_creator(id, &caller.id).await?;
        project.title = request.title.trim().to_string();
        project.description = normalize_description(request.description);
        if let Some(status) = request.status {
            project.status = status;
        }
        project.updated_at = Utc::now();

        let members = request.members.filter(|m| !m.is_empty());

        let mut tx = self.db.pool().begin().await?;
        match self.write_project_update(&mut tx, &project, members.as_deref()).await {
            Ok(()) => tx.commit().await?,
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "Failed to roll back project update");
                }
                return Err(e);
            }
        }

        self.record(caller, ActivityAction::UpdatedProject, &project, format!("updated project {}", project.title))
            .await?;
        info!(project_id = %project.id, replaced_members = members.is_some(), "Updated project");

        self.get(id, caller).await
    }

    async fn write_project_update(
        &self,
        conn: &mut SqliteConnection,
        project: &Project,
        members: Option<&[MemberInput]>,
    ) -> Result<()> {
        let repo = ProjectRepository::new(&self.db);
        let now = project.updated_at;

        repo.update_details(&mut *conn, project).await?;

        if let Some(members) = members {
            repo.remove_members_except(&mut *conn, &project.id, &project.created_by)
                .await?;
            for member in members.iter().filter(|m| m.user_id != project.created_by) {
                repo.upsert_member(&mut *conn, &project.id, &member.user_id, member.role, now)
                    .await?;
            }
        }

        repo.upsert_member(&mut *conn, &project.id, &project.created_by, ProjectRole::Admin, now)
            .await?;
        Ok(())
    }

    /// Delete a project and everything in it; creator only
    pub async fn delete(&self, id: &str, caller: &AuthUser) -> Result<()> {
        let project = AccessGate::new(&self.db).require_creator(id, &caller.id).await?;
        ProjectRepository::new(&self.db).delete(&project.id).await?;

        info!(project_id = %project.id, user_id = %caller.id, "Deleted project");
        Ok(())
    }

    /// The project board: members plus every task with its assignees
    pub async fn tasks(&self, id: &str, caller: &AuthUser) -> Result<ProjectTasks> {
        let project = AccessGate::new(&self.db).require_member(id, &caller.id).await?;

        let tasks_repo = TaskRepository::new(&self.db);
        let mut assignees = tasks_repo.assignees_for_project(id).await?;
        let tasks = tasks_repo
            .list_for_project(id)
            .await?
            .into_iter()
            .map(|task| TaskListItem {
                assignees: assignees.remove(&task.id).unwrap_or_default(),
                task,
            })
            .collect();

        Ok(ProjectTasks {
            project: ProjectWithMembers {
                members: ProjectRepository::new(&self.db).members(id).await?,
                project,
            },
            tasks,
        })
    }

    async fn record(
        &self,
        caller: &AuthUser,
        action: ActivityAction,
        project: &Project,
        description: String,
    ) -> Result<()> {
        let entry = ActivityEntry::new(&caller.id, action, EntityType::Project, &project.id, description);
        ActivityRepository::new(&self.db).record(&entry).await
    }
}

fn normalize_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::{AccountRole, User, UserRepository};

    async fn seed(db: &Database, name: &str) -> AuthUser {
        let user = User::new(format!("{}@example.com", name.to_lowercase()), name, AccountRole::Member);
        UserRepository::new(db).create(&user, "hash").await.unwrap();
        AuthUser::from(user)
    }

    fn member(user: &AuthUser, role: ProjectRole) -> MemberInput {
        MemberInput {
            user_id: user.id.clone(),
            role,
        }
    }

    fn create_request(title: &str, members: Vec<MemberInput>) -> CreateProjectRequest {
        CreateProjectRequest {
            title: title.into(),
            description: None,
            members,
        }
    }

    #[tokio::test]
    async fn test_creator_is_admin() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let service = ProjectService::new(db.clone());

        // The creator listed as a plain member must not be demoted
        let detail = service
            .create(&ann, create_request("Website", vec![member(&ann, ProjectRole::Member), member(&bob, ProjectRole::Qa)]))
            .await
            .unwrap();

        assert_eq!(detail.user_role, ProjectRole::Admin);
        assert_eq!(detail.members.len(), 2);
        let ann_row = detail.members.iter().find(|m| m.user_id == ann.id).unwrap();
        assert_eq!(ann_row.role, ProjectRole::Admin);
        let bob_row = detail.members.iter().find(|m| m.user_id == bob.id).unwrap();
        assert_eq!(bob_row.role, ProjectRole::Qa);
    }

    #[tokio::test]
    async fn test_create_is_atomic() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let service = ProjectService::new(db.clone());

        let ghost = MemberInput {
            user_id: "no-such-user".into(),
            role: ProjectRole::Member,
        };
        let result = service.create(&ann, create_request("Website", vec![ghost])).await;
        assert!(matches!(result, Err(Error::DatabaseError(_))));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
        let (members,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM project_members")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(members, 0);
    }

    #[tokio::test]
    async fn test_get_hides_from_non_members() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let service = ProjectService::new(db.clone());

        let project = service.create(&ann, create_request("Website", vec![])).await.unwrap();

        assert!(matches!(
            service.get(&project.project.id, &bob).await,
            Err(Error::NotFound(_))
        ));

        service
            .update(
                &project.project.id,
                &ann,
                UpdateProjectRequest {
                    title: "Website".into(),
                    description: None,
                    status: None,
                    members: Some(vec![member(&bob, ProjectRole::Developer)]),
                },
            )
            .await
            .unwrap();

        let as_bob = service.get(&project.project.id, &bob).await.unwrap();
        assert_eq!(as_bob.user_role, ProjectRole::Developer);
    }

    #[tokio::test]
    async fn test_update_replaces_membership() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let carol = seed(&db, "Carol").await;
        let service = ProjectService::new(db.clone());

        let project = service
            .create(&ann, create_request("Website", vec![member(&bob, ProjectRole::Member)]))
            .await
            .unwrap();
        let id = project.project.id.clone();

        let updated = service
            .update(
                &id,
                &ann,
                UpdateProjectRequest {
                    title: "Website v2".into(),
                    description: Some("  ".into()),
                    status: Some(ProjectStatus::InProgress),
                    members: Some(vec![member(&carol, ProjectRole::Manager), member(&ann, ProjectRole::Qa)]),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.project.title, "Website v2");
        assert_eq!(updated.project.description, None);
        assert_eq!(updated.project.status, ProjectStatus::InProgress);

        let mut ids: Vec<(String, ProjectRole)> =
            updated.members.iter().map(|m| (m.user_id.clone(), m.role)).collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        let mut expected = vec![(ann.id.clone(), ProjectRole::Admin), (carol.id.clone(), ProjectRole::Manager)];
        expected.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(ids, expected);
        assert!(service.get(&id, &bob).await.is_err());
    }

    #[tokio::test]
    async fn test_update_without_members_keeps_membership() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let service = ProjectService::new(db.clone());

        let project = service
            .create(&ann, create_request("Website", vec![member(&bob, ProjectRole::Member)]))
            .await
            .unwrap();

        let updated = service
            .update(
                &project.project.id,
                &ann,
                UpdateProjectRequest {
                    title: "Renamed".into(),
                    description: None,
                    status: None,
                    members: Some(vec![]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.members.len(), 2);
    }

    #[tokio::test]
    async fn test_non_creator_cannot_update_or_delete() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let service = ProjectService::new(db.clone());

        let project = service
            .create(&ann, create_request("Website", vec![member(&bob, ProjectRole::Admin)]))
            .await
            .unwrap();
        let id = project.project.id.clone();

        let err = service
            .update(
                &id,
                &bob,
                UpdateProjectRequest {
                    title: "Hijacked".into(),
                    description: None,
                    status: None,
                    members: Some(vec![member(&bob, ProjectRole::Admin)]),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let after = service.get(&id, &ann).await.unwrap();
        assert_eq!(after.project.title, "Website");
        assert_eq!(after.members.len(), 2);

        assert!(matches!(service.delete(&id, &bob).await, Err(Error::Forbidden(_))));
        assert!(matches!(service.delete("missing", &ann).await, Err(Error::NotFound(_))));

        service.delete(&id, &ann).await.unwrap();
        assert!(matches!(service.get(&id, &ann).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_includes_counts_and_members() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let service = ProjectService::new(db.clone());

        service.create(&ann, create_request("First", vec![])).await.unwrap();
        service
            .create(&bob, create_request("Second", vec![member(&ann, ProjectRole::Developer)]))
            .await
            .unwrap();
        service.create(&bob, create_request("Hidden", vec![])).await.unwrap();

        let list = service.list(&ann).await.unwrap();
        let titles: Vec<&str> = list.iter().map(|p| p.project.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert_eq!(list[0].user_role, ProjectRole::Developer);
        assert_eq!(list[0].members.len(), 2);
        assert_eq!(list[0].task_count, 0);
        assert_eq!(list[0].created_by_user.as_ref().unwrap().name, "Bob");
    }

    #[tokio::test]
    async fn test_creation_is_logged() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let service = ProjectService::new(db.clone());

        let project = service.create(&ann, create_request("Website", vec![])).await.unwrap();
        let entries = ActivityRepository::new(&db)
            .list_for_entity(&project.project.id)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, "created project Website");
        assert_eq!(entries[0].entity_type, EntityType::Project);
    }

    #[tokio::test]
    async fn test_tasks_requires_membership() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let service = ProjectService::new(db.clone());

        let project = service.create(&ann, create_request("Website", vec![])).await.unwrap();
        assert!(matches!(
            service.tasks(&project.project.id, &bob).await,
            Err(Error::Forbidden(_))
        ));

        let board = service.tasks(&project.project.id, &ann).await.unwrap();
        assert!(board.tasks.is_empty());
        assert_eq!(board.project.members.len(), 1);
    }
}
