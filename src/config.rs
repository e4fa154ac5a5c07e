use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FormFlowError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// Base URL used when building survey links in outgoing mail.
    pub public_base_url: String,
    /// Seed the preset template catalogue at startup.
    pub seed_templates: bool,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// When false, outgoing mail is written to the log instead of sent.
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://formflow.db".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            public_base_url: "http://localhost:3000".to_string(),
            seed_templates: true,
            auth: AuthConfig::default(),
            mail: MailConfig::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            token_ttl_days: 7,
            secure_cookies: false,
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from: "FormFlow <noreply@formflow.com>".to_string(),
        }
    }
}

impl AppConfig {
    pub const DEFAULT_CONFIG_FILE: &'static str = "formflow.toml";

    /// Load configuration from defaults, then the optional config file, then
    /// `FORMFLOW_*` environment variables (`__` separates nested keys, e.g.
    /// `FORMFLOW_AUTH__JWT_SECRET`).
    pub fn load(path: Option<&Path>) -> Result<Self, FormFlowError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(Self::DEFAULT_CONFIG_FILE).required(false),
        };

        let config: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("FORMFLOW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FormFlowError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(FormFlowError::ConfigError(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        if self.auth.token_ttl_days <= 0 {
            return Err(FormFlowError::ConfigError(
                "auth.token_ttl_days must be positive".to_string(),
            ));
        }
        if self.mail.enabled && self.mail.smtp_host.is_empty() {
            return Err(FormFlowError::ConfigError(
                "mail.smtp_host is required when mail is enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn survey_url(&self, form_id: i64) -> String {
        format!(
            "{}/survey/{}",
            self.public_base_url.trim_end_matches('/'),
            form_id
        )
    }
}
