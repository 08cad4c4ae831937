use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use taskboard_core::application::{CreateProjectRequest, UpdateProjectRequest};
use taskboard_core::auth::AuthUser;
use taskboard_core::domain::project::{ProjectDetail, ProjectSummary};
use taskboard_core::domain::stats::DashboardStats;
use taskboard_core::domain::task::ProjectTasks;

use super::MessageBody;
use super::context::ApiContext;
use super::error::ApiResult;
use super::extract::{ValidJson, ValidPath};

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route("/stats/all", get(global_stats))
        .route("/:id", get(get_project).put(update_project).delete(delete_project))
        .route("/:id/stats", get(project_stats))
        .route("/:id/tasks", get(project_tasks))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn create_project(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidJson(request): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectDetail>)> {
    let project = context.services.projects.create(&user, request).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn list_projects(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Vec<ProjectSummary>>> {
    Ok(Json(context.services.projects.list(&user).await?))
}

#[tracing::instrument(skip(context, user), fields(user_id = %user.id))]
async fn get_project(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(id): ValidPath<String>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(context.services.projects.get(&id, &user).await?))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_project(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(id): ValidPath<String>,
    ValidJson(request): ValidJson<UpdateProjectRequest>,
) -> ApiResult<Json<ProjectDetail>> {
    Ok(Json(context.services.projects.update(&id, &user, request).await?))
}

#[tracing::instrument(skip(context, user), fields(user_id = %user.id))]
async fn delete_project(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(id): ValidPath<String>,
) -> ApiResult<Json<MessageBody>> {
    context.services.projects.delete(&id, &user).await?;
    Ok(Json(MessageBody::new("Project deleted successfully")))
}

#[tracing::instrument(skip(context, user), fields(user_id = %user.id))]
async fn project_tasks(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(id): ValidPath<String>,
) -> ApiResult<Json<ProjectTasks>> {
    Ok(Json(context.services.projects.tasks(&id, &user).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn global_stats(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(context.services.stats.global_stats(&user).await?))
}

#[tracing::instrument(skip(context, user), fields(user_id = %user.id))]
async fn project_stats(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(id): ValidPath<String>,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(context.services.stats.project_stats(&id, &user).await?))
}
