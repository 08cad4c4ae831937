//! User repository for database operations

use chrono::{DateTime, Utc};
use sqlx::Row;

use super::entity::{AccountRole, User};
use crate::Result;
use crate::storage::Database;

const USER_COLUMNS: &str = "id, email, name, role, last_login, created_at, updated_at";

/// User repository for database operations
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new account with its password hash
    pub async fn create(&self, user: &User, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, role, last_login, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(password_hash)
        .bind(user.role.as_str())
        .bind(user.last_login)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Get a user by ID
    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| self.row_to_user(&r)))
    }

    /// Get a user by normalized email
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|r| self.row_to_user(&r)))
    }

    /// Get a user together with the stored password hash
    pub async fn get_with_hash_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|r| {
            let hash: String = r.get("password_hash");
            (self.row_to_user(&r), hash)
        }))
    }

    /// Get the stored password hash for a user
    pub async fn password_hash(&self, id: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|(hash,)| hash))
    }

    /// Check if an email is already registered
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }

    /// List every account ordered by display name
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY name COLLATE NOCASE, rowid"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(|r| self.row_to_user(r)).collect())
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Change the display name
    pub async fn update_name(&self, id: &str, name: &str) -> Result<()> {
        sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Replace the password hash
    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now())
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Replace the password hash only if it still equals `expected`
    ///
    /// Returns `false` when another change got there first.
    pub async fn swap_password_hash(&self, id: &str, expected: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ? AND password_hash = ?",
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .bind(expected)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Convert a database row to a User
    fn row_to_user(&self, row: &sqlx::sqlite::SqliteRow) -> User {
        User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            role: AccountRole::parse(row.get("role")).unwrap_or_default(),
            last_login: row.get("last_login"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}
