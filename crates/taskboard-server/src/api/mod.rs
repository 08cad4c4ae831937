use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::context::ApiContext;
use crate::api::error::ErrorBody;

pub mod auth;
pub mod context;
pub mod error;
pub mod extract;
mod health;
pub mod middleware;
pub mod profile;
pub mod projects;
pub mod tasks;
pub mod users;

/// Prefix shared by every API route
pub const API_PREFIX: &str = "/api-v1";

/// `{message}` reply for operations without a richer body
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub async fn setup_and_serve(context: ApiContext, addr: SocketAddr) -> anyhow::Result<()> {
    let app = app(context);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to address {}", addr))?;

    tracing::info!(address = %addr, "taskboard server is up and running");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("error running axum server")
}

/// The complete application: API routes, health, tracing and CORS
pub fn app(context: ApiContext) -> Router {
    let cors = cors_layer(&context.config.server.client_url);

    Router::new()
        .nest(API_PREFIX, api_router(&context))
        .merge(health::router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(context)
}

fn api_router(context: &ApiContext) -> Router<ApiContext> {
    let protected = Router::new()
        .nest("/users", users::router())
        .nest("/profile", profile::router())
        .nest("/projects", projects::router())
        .nest("/tasks", tasks::router())
        .route_layer(from_fn_with_state(context.clone(), middleware::require_session));

    Router::new()
        .nest("/auth", auth::router(context))
        .merge(protected)
}

fn cors_layer(client_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match client_url.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(client_url, "server.client_url is not a valid origin; CORS disabled");
            layer
        }
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            message: "Not found".to_string(),
            code: "NOT_FOUND",
        }),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
