//! Input validation
//!
//! Runs before any business logic; each failure names the offending field.

use std::collections::HashSet;

use crate::domain::project::MemberInput;
use crate::error::{Error, Result};

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_PROFILE_NAME_LEN: usize = 2;
pub const MIN_REGISTER_PASSWORD_LEN: usize = 10;
pub const MIN_RESET_PASSWORD_LEN: usize = 6;

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validator for account inputs
pub struct AccountValidator;

impl AccountValidator {
    /// Display name chosen at registration
    ///
    /// Rules:
    /// - At least 3 characters after trimming
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().chars().count() < MIN_NAME_LEN {
            return Err(Error::validation(
                "name",
                format!("Name must be at least {MIN_NAME_LEN} characters long"),
            ));
        }
        Ok(())
    }

    /// Display name changed from the profile page
    pub fn validate_profile_name(name: &str) -> Result<()> {
        if name.trim().chars().count() < MIN_PROFILE_NAME_LEN {
            return Err(Error::validation(
                "name",
                format!("Name must be at least {MIN_PROFILE_NAME_LEN} characters long"),
            ));
        }
        Ok(())
    }

    /// Rules:
    /// - Exactly one `@` with a non-empty local part
    /// - A dotted domain without empty labels
    /// - No whitespace
    pub fn validate_email(email: &str) -> Result<()> {
        let email = email.trim();
        let invalid = || Error::validation("email", "Please provide a valid email address");

        if email.is_empty() || email.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.contains('@') {
            return Err(invalid());
        }
        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(invalid());
        }
        Ok(())
    }

    pub fn validate_new_password(password: &str) -> Result<()> {
        Self::validate_password_len(password, MIN_REGISTER_PASSWORD_LEN)
    }

    pub fn validate_reset_password(password: &str) -> Result<()> {
        Self::validate_password_len(password, MIN_RESET_PASSWORD_LEN)
    }

    pub fn validate_login(email: &str, password: &str) -> Result<()> {
        Self::validate_email(email)?;
        if password.is_empty() {
            return Err(Error::validation("password", "Password is required"));
        }
        Ok(())
    }

    fn validate_password_len(password: &str, min: usize) -> Result<()> {
        if password.chars().count() < min {
            return Err(Error::validation(
                "password",
                format!("Password must be at least {min} characters long"),
            ));
        }
        Ok(())
    }
}

/// Validator for project inputs
pub struct ProjectValidator;

impl ProjectValidator {
    pub fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::validation("title", "Project title is required"));
        }
        Ok(())
    }

    /// Rejects lists that name the same user twice
    pub fn validate_members(members: &[MemberInput]) -> Result<()> {
        let mut seen = HashSet::new();
        for member in members {
            if member.user_id.trim().is_empty() {
                return Err(Error::validation("members", "Member user id is required"));
            }
            if !seen.insert(member.user_id.as_str()) {
                return Err(Error::validation(
                    "members",
                    format!("User {} is listed more than once", member.user_id),
                ));
            }
        }
        Ok(())
    }
}

/// Validator for task inputs
pub struct TaskValidator;

impl TaskValidator {
    pub fn validate_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::validation("title", "Task title is required"));
        }
        Ok(())
    }

    pub fn validate_subtask_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(Error::validation("title", "Subtask title is required"));
        }
        Ok(())
    }

    pub fn validate_comment(text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::validation("text", "Comment text is required"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::project::ProjectRole;

    #[test]
    fn test_email_rules() {
        assert!(AccountValidator::validate_email("ann@example.com").is_ok());
        assert!(AccountValidator::validate_email("  Ann@Example.com ").is_ok());

        for bad in ["", "ann", "ann@", "@example.com", "ann@example", "ann@@example.com", "a n@example.com", "ann@example..com"] {
            assert!(AccountValidator::validate_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[test]
    fn test_name_lengths() {
        assert!(AccountValidator::validate_name("Ann").is_ok());
        assert!(AccountValidator::validate_name("  Al ").is_err());
        assert!(AccountValidator::validate_profile_name("Al").is_ok());
        assert!(AccountValidator::validate_profile_name(" A ").is_err());
    }

    #[test]
    fn test_password_lengths() {
        assert!(AccountValidator::validate_new_password("0123456789").is_ok());
        assert!(AccountValidator::validate_new_password("012345678").is_err());
        assert!(AccountValidator::validate_reset_password("123456").is_ok());
        assert!(AccountValidator::validate_reset_password("12345").is_err());
        assert!(AccountValidator::validate_login("ann@example.com", "").is_err());
    }

    #[test]
    fn test_titles_and_text() {
        assert!(ProjectValidator::validate_title("Site").is_ok());
        assert!(ProjectValidator::validate_title("   ").is_err());
        assert!(TaskValidator::validate_title("").is_err());
        assert!(TaskValidator::validate_subtask_title("Outline").is_ok());
        assert!(TaskValidator::validate_comment(" ").is_err());
    }

    #[test]
    fn test_duplicate_members_rejected() {
        let member = |id: &str| MemberInput {
            user_id: id.to_string(),
            role: ProjectRole::Member,
        };
        assert!(ProjectValidator::validate_members(&[member("a"), member("b")]).is_ok());

        let err = ProjectValidator::validate_members(&[member("a"), member("a")]).unwrap_err();
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "members"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
