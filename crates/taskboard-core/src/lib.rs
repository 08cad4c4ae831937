//! Taskboard Core Library
//!
//! This crate provides the core functionality for Taskboard, including:
//! - Accounts, sessions and password reset (Argon2 + signed tokens)
//! - Projects with per-project roles and a creator-only admin surface
//! - Tasks, subtasks, comments and their activity trail
//! - Dashboard statistics
//! - Storage (SQLite with versioned migrations)

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result, SessionError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::application::Services;
    pub use crate::auth::AuthUser;
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
