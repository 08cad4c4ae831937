use axum::{Json, Router, extract::State, routing::get};
use taskboard_core::domain::user::User;

use super::context::ApiContext;
use super::error::ApiResult;

pub fn router() -> Router<ApiContext> {
    Router::new().route("/", get(list_users))
}

/// Every account, for assignee and member pickers
#[tracing::instrument(skip_all)]
async fn list_users(State(context): State<ApiContext>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(context.services.auth.list_users().await?))
}
