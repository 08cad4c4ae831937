use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, put},
};
use serde::Deserialize;
use taskboard_core::auth::AuthUser;
use taskboard_core::domain::user::User;

use super::MessageBody;
use super::context::ApiContext;
use super::error::ApiResult;
use super::extract::ValidJson;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(get_profile).put(update_profile))
        .route("/password", put(change_password))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn get_profile(State(context): State<ApiContext>, Extension(user): Extension<AuthUser>) -> ApiResult<Json<User>> {
    Ok(Json(context.services.auth.current_user(&user).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn update_profile(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidJson(request): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    Ok(Json(context.services.auth.update_profile(&user, &request.name).await?))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn change_password(
    State(context): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    ValidJson(request): ValidJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageBody>> {
    context
        .services
        .auth
        .change_password(&user, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(MessageBody::new("Password updated successfully")))
}
