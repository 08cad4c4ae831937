//! User accounts
//!
//! - **Entities**: `User`, `AccountRole`, `UserSummary`, `UserRef`
//! - **Repository**: `UserRepository` for database operations

pub mod entity;
pub mod repository;

pub use entity::{AccountRole, User, UserRef, UserSummary};
pub use repository::UserRepository;
