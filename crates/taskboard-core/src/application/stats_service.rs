//! Dashboard statistics for the caller's projects

use std::collections::HashMap;

use chrono::Utc;

use crate::auth::AuthUser;
use crate::domain::access::AccessGate;
use crate::domain::project::ProjectRepository;
use crate::domain::stats::{DashboardStats, ProjectWithTasks, RECENT_PROJECTS_LIMIT, summarize};
use crate::domain::task::{Task, TaskRepository};
use crate::error::Result;
use crate::storage::Database;

#[derive(Clone)]
pub struct StatsService {
    db: Database,
}

impl StatsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Statistics across every project the caller belongs to
    pub async fn global_stats(&self, caller: &AuthUser) -> Result<DashboardStats> {
        let projects = ProjectRepository::new(&self.db).list_for_user(&caller.id).await?;

        let mut tasks_by_project: HashMap<String, Vec<Task>> = HashMap::new();
        for task in TaskRepository::new(&self.db).list_for_member(&caller.id).await? {
            tasks_by_project.entry(task.project_id.clone()).or_default().push(task);
        }

        let rows = projects
            .into_iter()
            .map(|(project, _, _)| ProjectWithTasks {
                tasks: tasks_by_project.remove(&project.id).unwrap_or_default(),
                project,
            })
            .collect();

        Ok(summarize(rows, RECENT_PROJECTS_LIMIT, Utc::now()))
    }

    /// Statistics for a single project
    pub async fn project_stats(&self, project_id: &str, caller: &AuthUser) -> Result<DashboardStats> {
        let project = AccessGate::new(&self.db)
            .require_member(project_id, &caller.id)
            .await?;
        let tasks = TaskRepository::new(&self.db).list_for_project(project_id).await?;

        Ok(summarize(vec![ProjectWithTasks { project, tasks }], 1, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::project_service::{CreateProjectRequest, ProjectService};
    use crate::application::task_service::{CreateTaskRequest, TaskService};
    use crate::domain::task::{TaskPriority, TaskStatus};
    use crate::domain::user::{AccountRole, User, UserRepository};
    use crate::error::Error;

    async fn seed(db: &Database, name: &str) -> AuthUser {
        let user = User::new(format!("{}@example.com", name.to_lowercase()), name, AccountRole::Member);
        UserRepository::new(db).create(&user, "hash").await.unwrap();
        AuthUser::from(user)
    }

    fn project(title: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            title: title.into(),
            description: None,
            members: vec![],
        }
    }

    fn task(title: &str, status: TaskStatus, due_in_days: Option<i64>) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.into(),
            description: None,
            status,
            priority: TaskPriority::High,
            due_date: due_in_days.map(|d| Utc::now() + chrono::Duration::days(d)),
            assignees: vec![],
        }
    }

    #[tokio::test]
    async fn test_global_stats() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let projects = ProjectService::new(db.clone());
        let tasks = TaskService::new(db.clone());

        let first = projects.create(&ann, project("First")).await.unwrap();
        let second = projects.create(&ann, project("Second")).await.unwrap();
        let hidden = projects.create(&bob, project("Hidden")).await.unwrap();

        tasks.create(&first.project.id, &ann, task("a", TaskStatus::Done, None)).await.unwrap();
        tasks.create(&second.project.id, &ann, task("b", TaskStatus::ToDo, Some(3))).await.unwrap();
        tasks.create(&hidden.project.id, &bob, task("c", TaskStatus::ToDo, Some(1))).await.unwrap();

        let stats = StatsService::new(db.clone()).global_stats(&ann).await.unwrap();
        assert_eq!(stats.stats.total_projects, 2);
        assert_eq!(stats.stats.total_tasks, 2);
        assert_eq!(stats.stats.total_task_done, 1);
        assert_eq!(stats.stats.total_task_to_do, 1);
        assert_eq!(stats.upcoming_tasks.len(), 1);
        assert_eq!(stats.upcoming_tasks[0].project_title, "Second");
        assert_eq!(stats.recent_projects[0].project.title, "Second");

        let today = stats.task_trends_data.last().unwrap();
        assert_eq!(today.completed, 1);
        assert_eq!(today.to_do, 1);
    }

    #[tokio::test]
    async fn test_project_stats_requires_membership() {
        let db = Database::in_memory().await.expect("Failed to create database");
        let ann = seed(&db, "Ann").await;
        let bob = seed(&db, "Bob").await;
        let created = ProjectService::new(db.clone()).create(&ann, project("Solo")).await.unwrap();
        let service = StatsService::new(db.clone());

        assert!(matches!(
            service.project_stats(&created.project.id, &bob).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            service.project_stats("missing", &ann).await,
            Err(Error::NotFound(_))
        ));

        let stats = service.project_stats(&created.project.id, &ann).await.unwrap();
        assert_eq!(stats.stats.total_projects, 1);
        assert_eq!(stats.recent_projects.len(), 1);
        assert_eq!(stats.task_trends_data.len(), 7);
    }
}
