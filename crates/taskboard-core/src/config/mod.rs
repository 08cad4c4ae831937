//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Environment variables consulted for the token signing secret, in order
pub const JWT_SECRET_VARS: [&str; 2] = ["TASKBOARD_JWT_SECRET", "JWT_SECRET"];

/// Environment variable holding the Resend API key
pub const RESEND_API_KEY_VAR: &str = "RESEND_API_KEY";

/// Taskboard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub auth: AuthConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origin of the web client; used for CORS and password reset links
    pub client_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Empty means the platform data directory
    pub path: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,
    pub session_ttl_hours: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// `log` or `resend`
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub from_name: String,
    pub from_domain: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            client_url: "http://localhost:5173".to_string(),
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: String::new(),
            max_connections: 5,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            session_ttl_hours: 24,
            reset_ttl_minutes: 15,
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: "log".to_string(),
            api_key: None,
            from_name: "Taskboard".to_string(),
            from_domain: "example.com".to_string(),
        }
    }
}

impl AuthConfig {
    pub fn resolved_jwt_secret(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;

        Ok(JWT_SECRET_VARS
            .iter()
            .find_map(|var| env::var(var).ok().filter(|v| !v.is_empty())))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.jwt_secret.is_some() {
            return Err(anyhow!(
                "The token signing secret must be provided via the TASKBOARD_JWT_SECRET environment variable, not stored in configuration"
            ));
        }
        Ok(())
    }
}

impl EmailConfig {
    pub fn resolved_api_key(&self) -> anyhow::Result<Option<String>> {
        self.enforce_env_only()?;
        Ok(env::var(RESEND_API_KEY_VAR).ok().filter(|v| !v.is_empty()))
    }

    pub fn redacted_api_key(&self) -> anyhow::Result<Option<String>> {
        self.resolved_api_key().map(|opt| opt.map(|key| redact(&key)))
    }

    pub fn enforce_env_only(&self) -> anyhow::Result<()> {
        if self.api_key.is_some() {
            return Err(anyhow!(
                "Email API keys must be provided via the RESEND_API_KEY environment variable, not stored in configuration"
            ));
        }
        Ok(())
    }

    /// Sender header, e.g. `Taskboard <noreply@example.com>`
    pub fn sender(&self) -> String {
        format!("{} <noreply@{}>", self.from_name, self.from_domain)
    }
}

fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        "***".to_string()
    } else {
        let suffix: String = chars[chars.len() - 4..].iter().collect();
        format!("***{}", suffix)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("TASKBOARD_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("taskboard")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or the defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.auth.enforce_env_only()?;
        self.email.enforce_env_only()?;

        if self.auth.session_ttl_hours <= 0 {
            return Err(anyhow!("auth.session_ttl_hours must be positive"));
        }
        if self.auth.reset_ttl_minutes <= 0 {
            return Err(anyhow!("auth.reset_ttl_minutes must be positive"));
        }
        if !["log", "resend"].contains(&self.email.provider.as_str()) {
            return Err(anyhow!(
                "Invalid email provider: {}. Valid options: log, resend",
                self.email.provider
            ));
        }
        Ok(())
    }

    /// Database file to open, falling back to the platform data directory
    pub fn database_path(&self) -> PathBuf {
        if self.database.path.is_empty() {
            crate::storage::default_database_path()
        } else {
            PathBuf::from(&self.database.path)
        }
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "server.host" => Ok(self.server.host.clone()),
            "server.port" => Ok(self.server.port.to_string()),
            "server.client_url" => Ok(self.server.client_url.clone()),

            "database.path" => Ok(self.database_path().display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),

            "auth.session_ttl_hours" => Ok(self.auth.session_ttl_hours.to_string()),
            "auth.reset_ttl_minutes" => Ok(self.auth.reset_ttl_minutes.to_string()),
            "auth.jwt_secret" => match self.auth.resolved_jwt_secret()? {
                Some(secret) => Ok(redact(&secret)),
                None => Ok("(not set - use TASKBOARD_JWT_SECRET env var)".to_string()),
            },

            "email.provider" => Ok(self.email.provider.clone()),
            "email.from_name" => Ok(self.email.from_name.clone()),
            "email.from_domain" => Ok(self.email.from_domain.clone()),
            "email.api_key" => match self.email.redacted_api_key()? {
                Some(redacted) => Ok(redacted),
                None => Ok("(not set - use RESEND_API_KEY env var)".to_string()),
            },

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `taskboard config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "server.host" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Host cannot be empty"));
                }
                self.server.host = value.trim().to_string();
            }
            "server.port" => {
                self.server.port = value
                    .parse()
                    .with_context(|| format!("Invalid port value: {}", value))?;
            }
            "server.client_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!("Client URL must start with http:// or https://"));
                }
                self.server.client_url = value.trim_end_matches('/').to_string();
            }

            "database.path" => {
                self.database.path = value.to_string();
            }
            "database.max_connections" => {
                let max: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid max_connections value: {}", value))?;
                if max == 0 {
                    return Err(anyhow!("max_connections must be at least 1"));
                }
                self.database.max_connections = max;
            }

            "auth.session_ttl_hours" => {
                let hours: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid session_ttl_hours value: {}", value))?;
                if hours <= 0 {
                    return Err(anyhow!("Session lifetime must be positive"));
                }
                self.auth.session_ttl_hours = hours;
            }
            "auth.reset_ttl_minutes" => {
                let minutes: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid reset_ttl_minutes value: {}", value))?;
                if minutes <= 0 {
                    return Err(anyhow!("Reset link lifetime must be positive"));
                }
                self.auth.reset_ttl_minutes = minutes;
            }

            "email.provider" => {
                let valid = ["log", "resend"];
                if !valid.contains(&value) {
                    return Err(anyhow!(
                        "Invalid email provider: {}. Valid options: {}",
                        value,
                        valid.join(", ")
                    ));
                }
                self.email.provider = value.to_string();
            }
            "email.from_name" => {
                self.email.from_name = value.to_string();
            }
            "email.from_domain" => {
                self.email.from_domain = value.to_string();
            }

            "auth.jwt_secret" | "email.api_key" => {
                return Err(anyhow!(
                    "Secrets cannot be stored in configuration. \
                     Set the TASKBOARD_JWT_SECRET or RESEND_API_KEY environment variable instead."
                ));
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `taskboard config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "server.host",
            "server.port",
            "server.client_url",
            "database.path",
            "database.max_connections",
            "auth.session_ttl_hours",
            "auth.reset_ttl_minutes",
            "auth.jwt_secret",
            "email.provider",
            "email.from_name",
            "email.from_domain",
            "email.api_key",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
