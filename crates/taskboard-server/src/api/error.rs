//! Mapping of core errors onto HTTP responses
//!
//! Every failure leaves the server as `{message, code}`. Server-side faults
//! are logged in full and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use taskboard_core::Error;

const GENERIC_MESSAGE: &str = "Internal server error";

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub message: String,
    pub code: &'a str,
}

/// Error returned by every handler
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Validation { .. } | Error::InvalidCredentials | Error::InvalidToken(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Session(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Upstream(_)
            | Error::DatabaseError(_)
            | Error::Token(_)
            | Error::PasswordHash(_)
            | Error::ConfigError(_)
            | Error::Other(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.0.is_internal() {
            tracing::error!(error = ?self.0, status = %status, "Request failed");
        }

        let body = if status.is_server_error() {
            ErrorBody {
                message: GENERIC_MESSAGE.to_string(),
                code: "SERVER_ERROR",
            }
        } else {
            ErrorBody {
                message: self.0.to_string(),
                code: self.0.code(),
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for handlers
pub type ApiResult<T> = std::result::Result<T, ApiError>;
