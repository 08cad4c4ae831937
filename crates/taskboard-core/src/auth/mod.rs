//! Credentials, tokens and outbound mail
//!
//! - `password`: Argon2 hashing behind the `PasswordHasher` trait
//! - `token`: purpose-scoped signed tokens
//! - `mailer`: delivery of password reset links

pub mod mailer;
pub mod password;
pub mod token;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::user::{AccountRole, User};

pub use mailer::{LogMailer, Mailer, MemoryMailer, OutboundEmail, ResendMailer, mailer_from_config};
pub use password::{Argon2Hasher, PasswordHasher, Passwords, credential_fingerprint};
pub use token::{Claims, TokenIssuer, TokenPurpose, TokenRejection};

/// The verified caller of a request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}
