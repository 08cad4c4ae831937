//! Outbound email
//!
//! The only message the backend sends is the password reset link. Delivery
//! is behind the [`Mailer`] trait so the server can log links locally and
//! use an HTTP provider in production.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;

use crate::config::EmailConfig;
use crate::error::{Error, Result};

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OutboundEmail {
    /// Password reset message for `link`, valid for `valid_minutes`
    pub fn password_reset(to: &str, name: &str, app_name: &str, link: &str, valid_minutes: i64) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("Reset your {app_name} password"),
            html: format!(
                "<p>Hi {name},</p>\
                 <p>We received a request to reset your {app_name} password.</p>\
                 <p><a href=\"{link}\">Reset password</a></p>\
                 <p>This link expires in {valid_minutes} minutes. If you did not ask for it, you can ignore this email.</p>"
            ),
            text: format!(
                "Hi {name},\n\nReset your {app_name} password: {link}\n\n\
                 This link expires in {valid_minutes} minutes. If you did not ask for it, you can ignore this email.\n"
            ),
        }
    }
}

/// Email delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<()>;
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        tracing::info!(to = %email.to, subject = %email.subject, body = %email.text, "Email not sent (log provider)");
        Ok(())
    }
}

/// Keeps messages in memory; used by tests
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| Error::Other("Mailer state poisoned".to_string()))?
            .push(email.clone());
        Ok(())
    }
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Sends through the Resend HTTP API
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendMailer {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            from: from.into(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }

    /// Point at another endpoint, e.g. a local stub
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        let body = ResendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Email provider unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, detail = %detail, "Email provider rejected message");
            return Err(Error::Upstream(format!("Email provider returned {status}")));
        }

        tracing::info!(to = %email.to, "Email sent");
        Ok(())
    }
}

/// Build the mailer selected by `email.provider`
pub fn mailer_from_config(config: &EmailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match config.provider.as_str() {
        "resend" => {
            let api_key = config.resolved_api_key()?.ok_or_else(|| {
                anyhow::anyhow!("email.provider is 'resend' but RESEND_API_KEY is not set")
            })?;
            Ok(Arc::new(ResendMailer::new(api_key, config.sender())))
        }
        "log" => Ok(Arc::new(LogMailer)),
        other => Err(anyhow::anyhow!("Unknown email provider: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_reset_message() {
        let email = OutboundEmail::password_reset(
            "ann@example.com",
            "Ann",
            "Taskboard",
            "http://localhost:5173/reset-password?token=abc",
            15,
        );
        assert_eq!(email.to, "ann@example.com");
        assert_eq!(email.subject, "Reset your Taskboard password");
        assert!(email.html.contains("reset-password?token=abc"));
        assert!(email.text.contains("15 minutes"));
    }

    #[tokio::test]
    async fn test_memory_mailer_records() {
        let mailer = MemoryMailer::new();
        let email = OutboundEmail::password_reset("a@b.co", "A", "Taskboard", "http://x", 15);
        mailer.send(&email).await.unwrap();
        assert_eq!(mailer.sent(), vec![email]);
    }

    #[tokio::test]
    async fn test_resend_unreachable_is_upstream_error() {
        let mailer = ResendMailer::new("re_test", "Taskboard <noreply@example.com>")
            .with_endpoint("http://127.0.0.1:9/emails");
        let email = OutboundEmail::password_reset("a@b.co", "A", "Taskboard", "http://x", 15);
        assert!(matches!(mailer.send(&email).await, Err(Error::Upstream(_))));
    }

    #[test]
    fn test_log_provider_selected_by_default() {
        assert!(mailer_from_config(&EmailConfig::default()).is_ok());
    }
}
