//! Registration, login, password reset and session verification

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::validators::{AccountValidator, normalize_email};
use crate::auth::{
    AuthUser, Mailer, OutboundEmail, Passwords, TokenIssuer, TokenPurpose, TokenRejection,
    credential_fingerprint,
};
use crate::domain::user::{AccountRole, User, UserRepository};
use crate::error::{Error, Result, SessionError};
use crate::storage::Database;

/// Reply to every reset request, whether or not the address is registered
pub const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a reset link has been sent.";

const RESET_EXPIRED_MESSAGE: &str = "Reset link has expired. Please request a new one.";
const RESET_INVALID_MESSAGE: &str = "Invalid or expired reset link.";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<AccountRole>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

/// Account lifecycle and session checks
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    passwords: Passwords,
    tokens: TokenIssuer,
    mailer: Arc<dyn Mailer>,
    client_url: String,
    app_name: String,
}

impl AuthService {
    pub fn new(
        db: Database,
        passwords: Passwords,
        tokens: TokenIssuer,
        mailer: Arc<dyn Mailer>,
        client_url: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            db,
            passwords,
            tokens,
            mailer,
            client_url: client_url.into(),
            app_name: app_name.into(),
        }
    }

    pub fn passwords(&self) -> &Passwords {
        &self.passwords
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create an account
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        AccountValidator::validate_name(&request.name)?;
        AccountValidator::validate_email(&request.email)?;
        AccountValidator::validate_new_password(&request.password)?;

        let email = normalize_email(&request.email);
        let users = UserRepository::new(&self.db);
        if users.email_exists(&email).await? {
            return Err(Error::Conflict("User already exists".to_string()));
        }

        let hash = self.passwords.hash(&request.password).await?;
        let user = User::new(email, request.name.trim(), request.role.unwrap_or_default());

        users.create(&user, &hash).await.map_err(|e| match e {
            Error::DatabaseError(ref db_err)
                if db_err
                    .as_database_error()
                    .is_some_and(|d| d.is_unique_violation()) =>
            {
                Error::Conflict("User already exists".to_string())
            }
            other => other,
        })?;

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        AccountValidator::validate_login(&request.email, &request.password)?;

        let email = normalize_email(&request.email);
        let users = UserRepository::new(&self.db);

        let Some((mut user, hash)) = users.get_with_hash_by_email(&email).await? else {
            warn!("Login attempt for unknown email");
            return Err(Error::InvalidCredentials);
        };

        if !self.passwords.verify(&request.password, &hash).await? {
            warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(Error::InvalidCredentials);
        }

        let now = Utc::now();
        users.touch_last_login(&user.id, now).await?;
        user.last_login = Some(now);

        let token = self.tokens.issue(&user.id, TokenPurpose::Login)?;
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user,
        })
    }

    /// Email a reset link if the address is registered
    ///
    /// Always answers with [`RESET_REQUESTED_MESSAGE`] so callers cannot probe
    /// which addresses exist.
    pub async fn request_password_reset(&self, email: &str) -> Result<&'static str> {
        AccountValidator::validate_email(email)?;

        let email = normalize_email(email);
        let Some((user, hash)) = UserRepository::new(&self.db).get_with_hash_by_email(&email).await? else {
            return Ok(RESET_REQUESTED_MESSAGE);
        };

        let token = self.tokens.issue_reset(&user.id, &credential_fingerprint(&hash)?)?;
        let link = format!("{}/reset-password?token={}", self.client_url, token);
        let message = OutboundEmail::password_reset(
            &user.email,
            &user.name,
            &self.app_name,
            &link,
            self.tokens.reset_ttl().num_minutes(),
        );

        if let Err(e) = self.mailer.send(&message).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send reset email");
            return Err(Error::Upstream("Failed to send reset email".to_string()));
        }

        info!(user_id = %user.id, "Password reset link issued");
        Ok(RESET_REQUESTED_MESSAGE)
    }

    /// Set a new password from a reset token. Existing sessions stay valid.
    ///
    /// A token authorizes one change: once the stored hash differs from the
    /// one it was issued against, it is refused.
    pub async fn consume_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        AccountValidator::validate_reset_password(new_password)?;

        let claims = self
            .tokens
            .verify(token, TokenPurpose::PasswordReset)
            .map_err(|rejection| match rejection {
                TokenRejection::Expired => Error::InvalidToken(RESET_EXPIRED_MESSAGE.to_string()),
                TokenRejection::Invalid => Error::InvalidToken(RESET_INVALID_MESSAGE.to_string()),
            })?;

        let invalid = || Error::InvalidToken(RESET_INVALID_MESSAGE.to_string());
        let users = UserRepository::new(&self.db);
        let current = users.password_hash(&claims.user_id).await?.ok_or_else(invalid)?;
        let Some(bound_to) = claims.credential.as_deref() else {
            return Err(invalid());
        };
        if credential_fingerprint(&current)? != bound_to {
            warn!(user_id = %claims.user_id, "Reset token already used or superseded");
            return Err(invalid());
        }

        let hash = self.passwords.hash(new_password).await?;
        if !users.swap_password_hash(&claims.user_id, &current, &hash).await? {
            warn!(user_id = %claims.user_id, "Password changed while reset was in flight");
            return Err(invalid());
        }

        info!(user_id = %claims.user_id, "Password reset completed");
        Ok(())
    }

    /// Resolve a bearer token to the calling user
    pub async fn verify_session(&self, token: Option<&str>) -> Result<AuthUser> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MissingToken)?;

        let claims = self
            .tokens
            .verify(token, TokenPurpose::Login)
            .map_err(|rejection| match rejection {
                TokenRejection::Expired => SessionError::TokenExpired,
                TokenRejection::Invalid => SessionError::InvalidToken,
            })?;

        let user = UserRepository::new(&self.db)
            .get(&claims.user_id)
            .await?
            .ok_or(SessionError::UserNotFound)?;

        Ok(AuthUser::from(user))
    }

    /// Full account record of the caller
    pub async fn current_user(&self, caller: &AuthUser) -> Result<User> {
        UserRepository::new(&self.db)
            .get(&caller.id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Every account, ordered by name
    pub async fn list_users(&self) -> Result<Vec<User>> {
        UserRepository::new(&self.db).list().await
    }

    /// Change the caller's display name
    pub async fn update_profile(&self, caller: &AuthUser, name: &str) -> Result<User> {
        AccountValidator::validate_profile_name(name)?;

        let users = UserRepository::new(&self.db);
        users.update_name(&caller.id, name.trim()).await?;
        info!(user_id = %caller.id, "Updated profile");

        self.current_user(caller).await
    }

    /// Change the caller's password after checking the current one
    pub async fn change_password(&self, caller: &AuthUser, old_password: &str, new_password: &str) -> Result<()> {
        AccountValidator::validate_reset_password(new_password)?;

        let users = UserRepository::new(&self.db);
        let hash = users
            .password_hash(&caller.id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        if !self.passwords.verify(old_password, &hash).await? {
            return Err(Error::validation("oldPassword", "Current password is incorrect"));
        }

        let new_hash = self.passwords.hash(new_password).await?;
        users.update_password_hash(&caller.id, &new_hash).await?;

        info!(user_id = %caller.id, "Password changed");
        Ok(())
    }
}
