//! Taskboard Core Integration Tests

use std::sync::Arc;

use taskboard_core::{
    Error, SessionError,
    application::{
        AddSubtaskRequest, CreateProjectRequest, CreateTaskRequest, LoginRequest, RegisterRequest,
        Services, UpdateProjectRequest, UpdateStatusRequest, UpdateSubtaskRequest,
    },
    auth::{Argon2Hasher, AuthUser, MemoryMailer, Passwords},
    config::Config,
    domain::activity::ActivityAction,
    domain::project::{MemberInput, ProjectRole},
    domain::task::{TaskPriority, TaskStatus},
    storage::Database,
};

const SECRET: &str = "integration-secret";

async fn services() -> (Services, Arc<MemoryMailer>) {
    let db = Database::in_memory().await.expect("Failed to create database");
    let mailer = Arc::new(MemoryMailer::new());
    let services = Services::new(
        db,
        &Config::default(),
        SECRET,
        Passwords::new(Arc::new(Argon2Hasher::low_cost())),
        mailer.clone(),
    );
    (services, mailer)
}

async fn register(services: &Services, name: &str) -> AuthUser {
    let email = format!("{}@example.com", name.to_lowercase());
    services
        .auth
        .register(RegisterRequest {
            name: name.to_string(),
            email: email.clone(),
            password: "correct-horse".to_string(),
            role: None,
        })
        .await
        .unwrap();

    let login = services
        .auth
        .login(LoginRequest {
            email,
            password: "correct-horse".to_string(),
        })
        .await
        .unwrap();
    services.auth.verify_session(Some(&login.token)).await.unwrap()
}

fn project(title: &str, members: Vec<MemberInput>) -> CreateProjectRequest {
    CreateProjectRequest {
        title: title.to_string(),
        description: Some("Marketing site".to_string()),
        members,
    }
}

fn task(title: &str) -> CreateTaskRequest {
    CreateTaskRequest {
        title: title.to_string(),
        description: None,
        status: TaskStatus::ToDo,
        priority: TaskPriority::Low,
        due_date: None,
        assignees: vec![],
    }
}

#[tokio::test]
async fn test_account_lifecycle() {
    let (services, mailer) = services().await;
    let ann = register(&services, "Ann").await;
    assert_eq!(ann.email, "ann@example.com");

    let wrong = services
        .auth
        .login(LoginRequest {
            email: "ann@example.com".to_string(),
            password: "not-the-password".to_string(),
        })
        .await;
    assert!(matches!(wrong, Err(Error::InvalidCredentials)));

    services.auth.request_password_reset("ann@example.com").await.unwrap();
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let token = sent[0]
        .text
        .split_whitespace()
        .find_map(|word| word.split("token=").nth(1))
        .expect("reset link in email")
        .to_string();

    services.auth.consume_password_reset(&token, "new-secret").await.unwrap();
    services
        .auth
        .login(LoginRequest {
            email: "ann@example.com".to_string(),
            password: "new-secret".to_string(),
        })
        .await
        .unwrap();

    assert!(matches!(
        services.auth.verify_session(None).await,
        Err(Error::Session(SessionError::MissingToken))
    ));
}

#[tokio::test]
async fn test_membership_scenario() {
    let (services, _) = services().await;
    let ann = register(&services, "Ann").await;
    let bob = register(&services, "Bob").await;

    let created = services.projects.create(&ann, project("Website", vec![])).await.unwrap();
    let id = created.project.id.clone();
    assert_eq!(created.user_role, ProjectRole::Admin);

    assert!(matches!(services.projects.get(&id, &bob).await, Err(Error::NotFound(_))));

    services
        .projects
        .update(
            &id,
            &ann,
            UpdateProjectRequest {
                title: "Website".to_string(),
                description: None,
                status: None,
                members: Some(vec![MemberInput {
                    user_id: bob.id.clone(),
                    role: ProjectRole::Member,
                }]),
            },
        )
        .await
        .unwrap();

    let seen_by_bob = services.projects.get(&id, &bob).await.unwrap();
    assert_eq!(seen_by_bob.user_role, ProjectRole::Member);
    assert_eq!(services.projects.list(&bob).await.unwrap().len(), 1);

    // Bob can work on tasks but not administer the project
    let created_task = services.tasks.create(&id, &bob, task("Copy")).await.unwrap();
    assert_eq!(created_task.task.created_by, bob.id);

    let attempt = services
        .projects
        .update(
            &id,
            &bob,
            UpdateProjectRequest {
                title: "Taken over".to_string(),
                description: None,
                status: None,
                members: Some(vec![]),
            },
        )
        .await;
    assert!(matches!(attempt, Err(Error::Forbidden(_))));
    assert_eq!(services.projects.get(&id, &ann).await.unwrap().project.title, "Website");
}

#[tokio::test]
async fn test_task_workflow_and_activity() {
    let (services, _) = services().await;
    let ann = register(&services, "Ann").await;

    let project_id = services
        .projects
        .create(&ann, project("Website", vec![]))
        .await
        .unwrap()
        .project
        .id;
    let created = services.tasks.create(&project_id, &ann, task("Launch")).await.unwrap();
    let task_id = created.task.id.clone();

    let detail = services
        .tasks
        .add_subtask(&task_id, &ann, AddSubtaskRequest { title: "Checklist".to_string() })
        .await
        .unwrap();
    let subtask_id = detail.subtasks[0].id.clone();

    for _ in 0..2 {
        services
            .tasks
            .update_subtask(&task_id, &subtask_id, &ann, UpdateSubtaskRequest { completed: true })
            .await
            .unwrap();
    }
    services
        .tasks
        .update_status(&task_id, &ann, UpdateStatusRequest { status: TaskStatus::Done })
        .await
        .unwrap();

    let activity = services.tasks.list_activity(&task_id).await.unwrap();
    let actions: Vec<ActivityAction> = activity.iter().map(|a| a.action).collect();
    assert_eq!(
        actions,
        vec![
            ActivityAction::UpdatedTask,
            ActivityAction::UpdatedSubtask,
            ActivityAction::UpdatedSubtask,
            ActivityAction::CreatedSubtask,
            ActivityAction::CreatedTask,
        ]
    );
    assert_eq!(activity[0].description, "updated task status from To Do to Done");
    assert_eq!(activity[0].metadata["description"], activity[0].description);

    let stats = services.stats.project_stats(&project_id, &ann).await.unwrap();
    assert_eq!(stats.stats.total_task_done, 1);
    assert_eq!(stats.task_trends_data.last().unwrap().completed, 1);

    let board = services.projects.tasks(&project_id, &ann).await.unwrap();
    assert_eq!(board.tasks.len(), 1);
    assert_eq!(board.tasks[0].task.status, TaskStatus::Done);
}

#[tokio::test]
async fn test_project_delete_cascades() {
    let (services, _) = services().await;
    let ann = register(&services, "Ann").await;

    let project_id = services
        .projects
        .create(&ann, project("Temporary", vec![]))
        .await
        .unwrap()
        .project
        .id;
    let task_id = services
        .tasks
        .create(&project_id, &ann, task("Gone soon"))
        .await
        .unwrap()
        .task
        .id;

    services.projects.delete(&project_id, &ann).await.unwrap();

    assert!(matches!(services.tasks.get(&task_id, &ann).await, Err(Error::NotFound(_))));
    assert!(services.projects.list(&ann).await.unwrap().is_empty());
    assert_eq!(services.stats.global_stats(&ann).await.unwrap().stats.total_tasks, 0);
}
