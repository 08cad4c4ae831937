use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde_json::{Value, json};

use super::context::ApiContext;

pub fn router() -> Router<ApiContext> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to Task Management API" }))
}

#[tracing::instrument(skip_all)]
async fn health(State(context): State<ApiContext>) -> (StatusCode, Json<Value>) {
    tracing::debug!("health check requested");

    match context.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!(error = ?e, "database health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "unavailable" })),
            )
        }
    }
}
