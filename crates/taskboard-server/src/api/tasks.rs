use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use taskboard_core::application::{
    AddCommentRequest, AddSubtaskRequest, CreateTaskRequest, UpdateAssigneesRequest,
    UpdateDescriptionRequest, UpdatePriorityRequest, UpdateStatusRequest, UpdateSubtaskRequest,
    UpdateTitleRequest,
};
use taskboard_core::auth::AuthUser;
use taskboard_core::domain::activity::ActivityEntry;
use taskboard_core::domain::task::{Comment, TaskDeleted, TaskDetail, TaskView};

use super::context::ApiContext;
use super::error::ApiResult;
use super::extract::{ValidJson, ValidPath};

pub fn router() -> Router<ApiContext> {
    Router::new()
        // `id` is the project id here, and the task id everywhere else
        .route("/:id/create-task", post(create_task))
        .route("/:id", get(get_task).delete(delete_task))
        .route("/:id/title", put(update_title))
        .route("/:id/description", put(update_description))
        .route("/:id/status", put(update_status))
        .route("/:id/priority", put(update_priority))
        .route("/:id/assignees", put(update_assignees))
        .route("/:id/add-subtask", post(add_subtask))
        .route("/:id/update-subtask/:subtask_id", put(update_subtask))
        .route("/:id/add-comment", post(add_comment))
        .route("/:id/comments", get(list_comments))
        .route("/:id/activity", get(list_activity))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn create_task(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(project_id): ValidPath<String>,
    ValidJson(request): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetail>)> {
    let task = context.services.tasks.create(&project_id, &user, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[tracing::instrument(skip(context, user), fields(user_id = %user.id))]
async fn get_task(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
) -> ApiResult<Json<TaskView>> {
    Ok(Json(context.services.tasks.get(&task_id, &user).await?))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_title(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<UpdateTitleRequest>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(context.services.tasks.update_title(&task_id, &user, request).await?))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_description(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<UpdateDescriptionRequest>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(
        context.services.tasks.update_description(&task_id, &user, request).await?,
    ))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_status(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<UpdateStatusRequest>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(context.services.tasks.update_status(&task_id, &user, request).await?))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_priority(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<UpdatePriorityRequest>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(context.services.tasks.update_priority(&task_id, &user, request).await?))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_assignees(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<UpdateAssigneesRequest>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(
        context.services.tasks.update_assignees(&task_id, &user, request).await?,
    ))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn add_subtask(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<AddSubtaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskDetail>)> {
    let task = context.services.tasks.add_subtask(&task_id, &user, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn update_subtask(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath((task_id, subtask_id)): ValidPath<(String, String)>,
    ValidJson(request): ValidJson<UpdateSubtaskRequest>,
) -> ApiResult<Json<TaskDetail>> {
    Ok(Json(
        context
            .services
            .tasks
            .update_subtask(&task_id, &subtask_id, &user, request)
            .await?,
    ))
}

#[tracing::instrument(skip(context, user, request), fields(user_id = %user.id))]
async fn add_comment(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
    ValidJson(request): ValidJson<AddCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = context.services.tasks.add_comment(&task_id, &user, request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[tracing::instrument(skip(context))]
async fn list_comments(
    State(context): State<ApiContext>,
    ValidPath(task_id): ValidPath<String>,
) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(context.services.tasks.list_comments(&task_id).await?))
}

#[tracing::instrument(skip(context, user), fields(user_id = %user.id))]
async fn delete_task(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidPath(task_id): ValidPath<String>,
) -> ApiResult<Json<TaskDeleted>> {
    Ok(Json(context.services.tasks.delete(&task_id, &user).await?))
}

#[tracing::instrument(skip(context))]
async fn list_activity(
    State(context): State<ApiContext>,
    ValidPath(entity_id): ValidPath<String>,
) -> ApiResult<Json<Vec<ActivityEntry>>> {
    Ok(Json(context.services.tasks.list_activity(&entity_id).await?))
}
