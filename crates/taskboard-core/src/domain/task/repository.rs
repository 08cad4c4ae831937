//! Task repository for database operations

use std::collections::HashMap;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteExecutor, SqliteRow};

use super::entity::{Comment, Subtask, Task, TaskBrief, TaskPriority, TaskStatus};
use crate::Result;
use crate::domain::user::{UserRef, UserSummary};
use crate::storage::Database;

const TASK_COLUMNS: &str = "t.id, t.project_id, t.title, t.description, t.status, t.priority, \
     t.due_date, t.created_by, t.created_at, t.updated_at, t.completed_at";

/// Task repository for database operations
pub struct TaskRepository<'a> {
    db: &'a Database,
}

impl<'a> TaskRepository<'a> {
    /// Create a new task repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a task row
    pub async fn create(&self, task: &Task) -> Result<()> {
        self.insert(self.db.pool(), task).await
    }

    /// Insert a task row through any executor, e.g. an open transaction
    pub async fn insert<'e>(&self, executor: impl SqliteExecutor<'e>, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, project_id, title, description, status, priority, due_date,
                               created_by, created_at, updated_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&task.id)
        .bind(&task.project_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(&task.created_by)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.completed_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Get a task by ID
    pub async fn get(&self, id: &str) -> Result<Option<Task>> {
        let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| self.row_to_task(&r)))
    }

    /// Persist every mutable field of a task
    pub async fn update(&self, task: &Task) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tasks
            SET title = ?, description = ?, status = ?, priority = ?, due_date = ?,
                updated_at = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.updated_at)
        .bind(task.completed_at)
        .bind(&task.id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Permanently delete a task; subtasks, comments and assignees cascade
    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Tasks of a project, newest first
    pub async fn list_for_project(&self, project_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.project_id = ? ORDER BY t.created_at DESC, t.rowid DESC"
        ))
        .bind(project_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(|r| self.row_to_task(r)).collect())
    }

    /// Id, title, status and priority of a project's tasks, newest first
    pub async fn briefs_for_project(&self, project_id: &str) -> Result<Vec<TaskBrief>> {
        Ok(self
            .list_for_project(project_id)
            .await?
            .iter()
            .map(Task::brief)
            .collect())
    }

    /// Tasks of every project the user belongs to
    pub async fn list_for_member(&self, user_id: &str) -> Result<Vec<Task>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            WHERE t.project_id IN (SELECT project_id FROM project_members WHERE user_id = ?)
            ORDER BY t.created_at DESC, t.rowid DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(|r| self.row_to_task(r)).collect())
    }

    /// Replace the assignee set of a task
    pub async fn replace_assignees(&self, task_id: &str, user_ids: &[String]) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        self.write_assignees(&mut tx, task_id, user_ids).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Replace the assignee set on a connection the caller controls
    pub async fn write_assignees(&self, conn: &mut SqliteConnection, task_id: &str, user_ids: &[String]) -> Result<()> {
        sqlx::query("DELETE FROM task_assignees WHERE task_id = ?")
            .bind(task_id)
            .execute(&mut *conn)
            .await?;

        for user_id in user_ids {
            sqlx::query("INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES (?, ?)")
                .bind(task_id)
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }

    /// Assignees of a task ordered by name
    pub async fn assignees(&self, task_id: &str) -> Result<Vec<UserSummary>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT u.id, u.name, u.email
            FROM task_assignees a
            JOIN users u ON u.id = a.user_id
            WHERE a.task_id = ?
            ORDER BY u.name, a.rowid
            "#,
        )
        .bind(task_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, email)| UserSummary { id, name, email })
            .collect())
    }

    /// Assignees of every task in a project, keyed by task id
    pub async fn assignees_for_project(&self, project_id: &str) -> Result<HashMap<String, Vec<UserRef>>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT a.task_id, u.id, u.name
            FROM task_assignees a
            JOIN tasks t ON t.id = a.task_id
            JOIN users u ON u.id = a.user_id
            WHERE t.project_id = ?
            ORDER BY u.name, a.rowid
            "#,
        )
        .bind(project_id)
        .fetch_all(self.db.pool())
        .await?;

        let mut by_task: HashMap<String, Vec<UserRef>> = HashMap::new();
        for (task_id, id, name) in rows {
            by_task.entry(task_id).or_default().push(UserRef { id, name });
        }
        Ok(by_task)
    }

    /// Insert a subtask
    pub async fn create_subtask(&self, subtask: &Subtask) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subtasks (id, task_id, title, completed, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subtask.id)
        .bind(&subtask.task_id)
        .bind(&subtask.title)
        .bind(subtask.completed)
        .bind(subtask.created_at)
        .bind(subtask.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get a subtask that belongs to `task_id`
    pub async fn get_subtask(&self, task_id: &str, subtask_id: &str) -> Result<Option<Subtask>> {
        let row = sqlx::query(
            "SELECT id, task_id, title, completed, created_at, updated_at FROM subtasks WHERE id = ? AND task_id = ?",
        )
        .bind(subtask_id)
        .bind(task_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| self.row_to_subtask(&r)))
    }

    /// Persist the completion flag of a subtask
    pub async fn update_subtask(&self, subtask: &Subtask) -> Result<()> {
        sqlx::query("UPDATE subtasks SET title = ?, completed = ?, updated_at = ? WHERE id = ?")
            .bind(&subtask.title)
            .bind(subtask.completed)
            .bind(subtask.updated_at)
            .bind(&subtask.id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Subtasks of a task in creation order
    pub async fn subtasks(&self, task_id: &str) -> Result<Vec<Subtask>> {
        let rows = sqlx::query(
            r#"
            SELECT id, task_id, title, completed, created_at, updated_at
            FROM subtasks
            WHERE task_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(task_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(|r| self.row_to_subtask(r)).collect())
    }

    /// Insert a comment
    pub async fn create_comment(&self, comment: &Comment) -> Result<()> {
        sqlx::query("INSERT INTO comments (id, task_id, author_id, text, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(&comment.id)
            .bind(&comment.task_id)
            .bind(&comment.author.id)
            .bind(&comment.text)
            .bind(comment.created_at)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Comments of a task, newest first, with their authors
    pub async fn comments(&self, task_id: &str) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.task_id, c.text, c.created_at, c.author_id, u.name AS author_name
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.task_id = ?
            ORDER BY c.created_at DESC, c.rowid DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|r| Comment {
                id: r.get("id"),
                task_id: r.get("task_id"),
                text: r.get("text"),
                author: UserRef {
                    id: r.get("author_id"),
                    name: r.get("author_name"),
                },
                created_at: r.get("created_at"),
            })
            .collect())
    }

    /// Convert a database row to a Task
    fn row_to_task(&self, row: &SqliteRow) -> Task {
        Task {
            id: row.get("id"),
            project_id: row.get("project_id"),
            title: row.get("title"),
            description: row.get("description"),
            status: TaskStatus::parse(row.get("status")).unwrap_or_default(),
            priority: TaskPriority::parse(row.get("priority")).unwrap_or_default(),
            due_date: row.get("due_date"),
            created_by: row.get("created_by"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            completed_at: row.get("completed_at"),
        }
    }

    fn row_to_subtask(&self, row: &SqliteRow) -> Subtask {
        Subtask {
            id: row.get("id"),
            task_id: row.get("task_id"),
            title: row.get("title"),
            completed: row.get("completed"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::{Project, ProjectRepository, ProjectRole};
    use crate::domain::user::{AccountRole, User, UserRepository};
    use chrono::Utc;

    struct Fixture {
        db: Database,
        owner: User,
        project: Project,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.expect("Failed to create database");
        let owner = User::new("ann@example.com", "Ann", AccountRole::Member);
        UserRepository::new(&db).create(&owner, "hash").await.unwrap();

        let project = Project::new("Website", None, &owner.id);
        let projects = ProjectRepository::new(&db);
        projects.insert(db.pool(), &project).await.unwrap();
        projects
            .insert_member(db.pool(), &project.id, &owner.id, ProjectRole::Admin, Utc::now())
            .await
            .unwrap();

        Fixture { db, owner, project }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let f = fixture().await;
        let repo = TaskRepository::new(&f.db);

        let mut task = Task::new(&f.project.id, "Write copy", &f.owner.id);
        task.priority = TaskPriority::High;
        repo.create(&task).await.unwrap();

        let stored = repo.get(&task.id).await.unwrap().expect("Task should exist");
        assert_eq!(stored.title, "Write copy");
        assert_eq!(stored.status, TaskStatus::ToDo);
        assert_eq!(stored.priority, TaskPriority::High);

        task.set_status(TaskStatus::Done, Utc::now());
        task.title = "Write final copy".into();
        repo.update(&task).await.unwrap();

        let stored = repo.get(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Done);
        assert!(stored.completed_at.is_some());
        assert_eq!(stored.title, "Write final copy");
    }

    #[tokio::test]
    async fn test_assignees_are_replaced() {
        let f = fixture().await;
        let repo = TaskRepository::new(&f.db);
        let bob = User::new("bob@example.com", "Bob", AccountRole::Developer);
        UserRepository::new(&f.db).create(&bob, "hash").await.unwrap();

        let task = Task::new(&f.project.id, "Write copy", &f.owner.id);
        repo.create(&task).await.unwrap();

        repo.replace_assignees(&task.id, &[f.owner.id.clone(), bob.id.clone()])
            .await
            .unwrap();
        let names: Vec<String> = repo.assignees(&task.id).await.unwrap().into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Ann", "Bob"]);

        repo.replace_assignees(&task.id, &[bob.id.clone()]).await.unwrap();
        let by_task = repo.assignees_for_project(&f.project.id).await.unwrap();
        assert_eq!(by_task[&task.id], vec![UserRef { id: bob.id.clone(), name: "Bob".into() }]);

        repo.replace_assignees(&task.id, &[]).await.unwrap();
        assert!(repo.assignees(&task.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_assignee_rolls_back() {
        let f = fixture().await;
        let repo = TaskRepository::new(&f.db);

        let task = Task::new(&f.project.id, "Write copy", &f.owner.id);
        repo.create(&task).await.unwrap();
        repo.replace_assignees(&task.id, &[f.owner.id.clone()]).await.unwrap();

        let result = repo
            .replace_assignees(&task.id, &["missing-user".to_string()])
            .await;
        assert!(result.is_err());
        assert_eq!(repo.assignees(&task.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subtasks_and_comments() {
        let f = fixture().await;
        let repo = TaskRepository::new(&f.db);
        let task = Task::new(&f.project.id, "Write copy", &f.owner.id);
        repo.create(&task).await.unwrap();

        let mut subtask = Subtask::new(&task.id, "Outline");
        repo.create_subtask(&subtask).await.unwrap();
        subtask.completed = true;
        repo.update_subtask(&subtask).await.unwrap();

        let stored = repo.get_subtask(&task.id, &subtask.id).await.unwrap().unwrap();
        assert!(stored.completed);
        assert!(repo.get_subtask("other-task", &subtask.id).await.unwrap().is_none());

        let author = UserRef { id: f.owner.id.clone(), name: f.owner.name.clone() };
        let first = Comment::new(&task.id, author.clone(), "first");
        repo.create_comment(&first).await.unwrap();
        let second = Comment::new(&task.id, author, "second");
        repo.create_comment(&second).await.unwrap();

        let comments = repo.comments(&task.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "second");
        assert_eq!(comments[0].author.name, "Ann");
    }

    #[tokio::test]
    async fn test_delete_cascades_children() {
        let f = fixture().await;
        let repo = TaskRepository::new(&f.db);
        let task = Task::new(&f.project.id, "Write copy", &f.owner.id);
        repo.create(&task).await.unwrap();
        repo.create_subtask(&Subtask::new(&task.id, "Outline")).await.unwrap();
        repo.replace_assignees(&task.id, &[f.owner.id.clone()]).await.unwrap();

        repo.delete(&task.id).await.unwrap();

        assert!(repo.get(&task.id).await.unwrap().is_none());
        assert!(repo.subtasks(&task.id).await.unwrap().is_empty());
        assert!(repo.assignees(&task.id).await.unwrap().is_empty());
    }
}
