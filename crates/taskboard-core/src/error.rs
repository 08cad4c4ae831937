//! Error types for Taskboard

use thiserror::Error;

/// Result type alias using Taskboard's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a session token can be rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("No token provided, authorization denied")]
    MissingToken,

    #[error("Token has expired, please login again")]
    TokenExpired,

    #[error("Token is not valid")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,
}

impl SessionError {
    /// Machine-readable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "NO_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
        }
    }
}

/// Taskboard error types
#[derive(Error, Debug)]
pub enum Error {
    // Input errors
    #[error("{message}")]
    Validation { field: String, message: String },

    // Credential errors
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidToken(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    // Permission and lookup errors
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Outbound collaborators
    #[error("{0}")]
    Upstream(String),

    // Unexpected failures
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a validation error for a named input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::InvalidToken(_) => "INVALID_RESET_TOKEN",
            Self::Session(err) => err.code(),
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::DatabaseError(_)
            | Self::Token(_)
            | Self::PasswordHash(_)
            | Self::ConfigError(_)
            | Self::Other(_)
            | Self::Io(_) => "SERVER_ERROR",
        }
    }

    /// Whether this error is a fault of the server rather than the caller
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Upstream(_)
                | Self::DatabaseError(_)
                | Self::Token(_)
                | Self::PasswordHash(_)
                | Self::ConfigError(_)
                | Self::Other(_)
                | Self::Io(_)
        )
    }
}
