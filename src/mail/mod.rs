//! Outgoing mail: invitation and reminder messages, sent over SMTP or, when
//! mail is disabled, written to the log.

pub mod templates;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::config::MailConfig;
use crate::error::FormFlowError;

pub use templates::{invitation_email, reminder_email};

/// Loose `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
        .is_match(email)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), FormFlowError>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, FormFlowError> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| FormFlowError::ConfigError(format!("invalid mail.from: {}", e)))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| FormFlowError::ConfigError(format!("invalid SMTP relay: {}", e)))?
            .port(config.smtp_port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), FormFlowError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| FormFlowError::MailError(format!("invalid recipient {}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone())
            .map_err(|e| FormFlowError::MailError(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| FormFlowError::MailError(e.to_string()))?;

        debug!("Sent \"{}\" to {}", email.subject, email.to);
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), FormFlowError> {
        info!(to = %email.to, subject = %email.subject, "Mail delivery disabled, not sending");
        Ok(())
    }
}

pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, FormFlowError> {
    if config.enabled {
        info!("Sending mail through {}:{}", config.smtp_host, config.smtp_port);
        Ok(Arc::new(SmtpMailer::new(config)?))
    } else {
        info!("Mail delivery disabled; messages will be logged");
        Ok(Arc::new(LogMailer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("kim@example.com"));
        assert!(is_valid_email("a.b+tag@sub.example.co.kr"));
        assert!(!is_valid_email("kim@example"));
        assert!(!is_valid_email("kim example@x.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        let email = OutgoingEmail {
            to: "someone@example.com".into(),
            subject: "Hello".into(),
            html: "<p>Hi</p>".into(),
        };
        assert!(LogMailer.send(&email).await.is_ok());
    }

    #[test]
    fn test_disabled_config_builds_log_mailer() {
        let config = MailConfig::default();
        assert!(mailer_from_config(&config).is_ok());
    }

    #[test]
    fn test_bad_from_address_is_config_error() {
        let config = MailConfig {
            enabled: true,
            from: "not an address".into(),
            ..MailConfig::default()
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(FormFlowError::ConfigError(_))
        ));
    }
}
