use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use taskboard_core::application::{LoginRequest, LoginResponse, RegisterRequest};
use taskboard_core::auth::AuthUser;
use taskboard_core::domain::user::User;

use super::context::ApiContext;
use super::error::ApiResult;
use super::extract::ValidJson;
use super::middleware::require_session;
use super::MessageBody;

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

pub fn router(context: &ApiContext) -> Router<ApiContext> {
    Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(context.clone(), require_session))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

#[tracing::instrument(skip_all)]
async fn register(
    State(context): State<ApiContext>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = context.services.auth.register(request).await?;
    tracing::info!(user_id = %user.id, "registered user");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created successfully",
            user,
        }),
    ))
}

#[tracing::instrument(skip_all)]
async fn login(
    State(context): State<ApiContext>,
    ValidJson(request): ValidJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(context.services.auth.login(request).await?))
}

#[tracing::instrument(skip_all)]
async fn forgot_password(
    State(context): State<ApiContext>,
    ValidJson(request): ValidJson<ForgotPasswordRequest>,
) -> ApiResult<Json<MessageBody>> {
    let message = context
        .services
        .auth
        .request_password_reset(&request.email)
        .await?;
    Ok(Json(MessageBody::new(message)))
}

#[tracing::instrument(skip_all)]
async fn reset_password(
    State(context): State<ApiContext>,
    ValidJson(request): ValidJson<ResetPasswordRequest>,
) -> ApiResult<Json<MessageBody>> {
    context
        .services
        .auth
        .consume_password_reset(&request.token, &request.password)
        .await?;
    Ok(Json(MessageBody::new("Password has been reset successfully.")))
}

#[tracing::instrument(skip_all, fields(user_id = %user.id))]
async fn me(State(context): State<ApiContext>, Extension(user): Extension<AuthUser>) -> ApiResult<Json<User>> {
    Ok(Json(context.services.auth.current_user(&user).await?))
}
