//! Signed, expiring tokens
//!
//! HS256 tokens carrying `{userId, purpose, iat, exp}`. The purpose separates
//! login sessions from password reset links: a token is only accepted for the
//! purpose it was issued for. Reset tokens also carry a fingerprint of the
//! credential they may replace, which makes them single use.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenPurpose {
    #[serde(rename = "login")]
    Login,
    #[serde(rename = "password-reset")]
    PasswordReset,
}

/// Token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub purpose: TokenPurpose,
    pub iat: i64,
    pub exp: i64,
    /// Fingerprint of the password hash a reset token may replace
    #[serde(rename = "cred", default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, purpose: TokenPurpose, expires_in: Duration) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            purpose,
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, fingerprint: impl Into<String>) -> Self {
        self.credential = Some(fingerprint.into());
        self
    }
}

/// Why a token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    /// Bad signature, malformed, or issued for another purpose
    Invalid,
}

/// Issues and verifies tokens with one shared secret
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], session_ttl: Duration, reset_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            session_ttl,
            reset_ttl,
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    pub fn reset_ttl(&self) -> Duration {
        self.reset_ttl
    }

    /// Issue a token with the lifetime configured for `purpose`
    pub fn issue(&self, user_id: &str, purpose: TokenPurpose) -> Result<String> {
        let ttl = match purpose {
            TokenPurpose::Login => self.session_ttl,
            TokenPurpose::PasswordReset => self.reset_ttl,
        };
        self.issue_with_ttl(user_id, purpose, ttl)
    }

    /// Issue a token with an explicit lifetime
    pub fn issue_with_ttl(&self, user_id: &str, purpose: TokenPurpose, ttl: Duration) -> Result<String> {
        let claims = Claims::new(user_id, purpose, ttl);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Issue a password reset token bound to the current credential
    pub fn issue_reset(&self, user_id: &str, fingerprint: &str) -> Result<String> {
        let claims =
            Claims::new(user_id, TokenPurpose::PasswordReset, self.reset_ttl).with_credential(fingerprint);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Verify signature, expiry and purpose
    pub fn verify(&self, token: &str, purpose: TokenPurpose) -> std::result::Result<Claims, TokenRejection> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenRejection::Expired,
                _ => TokenRejection::Invalid,
            }
        })?;

        if data.claims.purpose != purpose {
            return Err(TokenRejection::Invalid);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer(secret: &[u8]) -> TokenIssuer {
        TokenIssuer::new(secret, Duration::hours(24), Duration::minutes(15))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = issuer(b"test-secret");
        let token = tokens.issue("user-1", TokenPurpose::Login).unwrap();

        let claims = tokens.verify(&token, TokenPurpose::Login).unwrap();
        assert_eq!(claims.user_id, "user-1");
        assert_eq!(claims.purpose, TokenPurpose::Login);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_reset_ttl_applies() {
        let tokens = issuer(b"test-secret");
        let token = tokens.issue("user-1", TokenPurpose::PasswordReset).unwrap();
        let claims = tokens.verify(&token, TokenPurpose::PasswordReset).unwrap();
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_wrong_purpose_rejected() {
        let tokens = issuer(b"test-secret");
        let reset = tokens.issue("user-1", TokenPurpose::PasswordReset).unwrap();
        assert_eq!(
            tokens.verify(&reset, TokenPurpose::Login),
            Err(TokenRejection::Invalid)
        );
    }

    #[test]
    fn test_expired_token() {
        let tokens = issuer(b"test-secret");
        let token = tokens
            .issue_with_ttl("user-1", TokenPurpose::Login, Duration::seconds(-30))
            .unwrap();
        assert_eq!(
            tokens.verify(&token, TokenPurpose::Login),
            Err(TokenRejection::Expired)
        );
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let token = issuer(b"other-secret")
            .issue("user-1", TokenPurpose::Login)
            .unwrap();
        assert_eq!(
            issuer(b"test-secret").verify(&token, TokenPurpose::Login),
            Err(TokenRejection::Invalid)
        );
        assert_eq!(
            issuer(b"test-secret").verify("garbage", TokenPurpose::Login),
            Err(TokenRejection::Invalid)
        );
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims::new("u1", TokenPurpose::PasswordReset, Duration::minutes(1));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["purpose"], "password-reset");
        assert!(json.get("cred").is_none());
    }

    #[test]
    fn test_reset_token_carries_credential() {
        let tokens = issuer(b"test-secret");
        let token = tokens.issue_reset("user-1", "salt-abc").unwrap();

        let claims = tokens.verify(&token, TokenPurpose::PasswordReset).unwrap();
        assert_eq!(claims.credential.as_deref(), Some("salt-abc"));
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }
}
