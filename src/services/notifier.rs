use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::{Config, SmtpConfig};

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP error{}: {message}", .code.map_or(String::new(), |c| format!(" {}", c)))]
    Smtp { code: Option<u16>, message: String },
}

impl NotificationError {
    /// Readable explanation of the failure for the logs.
    pub fn describe(&self) -> String {
        match self {
            NotificationError::Smtp {
                code: Some(code), ..
            } => format!("{} ({})", smtp_error_category(*code), self),
            _ => self.to_string(),
        }
    }
}

impl From<lettre::transport::smtp::Error> for NotificationError {
    fn from(error: lettre::transport::smtp::Error) -> Self {
        let code = error
            .status()
            .and_then(|code| code.to_string().parse::<u16>().ok());

        NotificationError::Smtp {
            code,
            message: error.to_string(),
        }
    }
}

pub fn smtp_error_category(code: u16) -> &'static str {
    match code {
        421 => "Service not available, closing transmission channel",
        450 => "Mailbox unavailable (busy or temporarily blocked)",
        451 => "Local error in processing",
        452 => "Insufficient system storage",
        500 => "Syntax error, command unrecognized",
        501 => "Syntax error in parameters or arguments",
        503 => "Bad sequence of commands",
        530 => "Authentication required",
        535 => "Authentication credentials invalid",
        550 => "Mailbox unavailable (not found or rejected)",
        551 => "User not local",
        552 => "Exceeded storage allocation",
        553 => "Mailbox name not allowed",
        554 => "Transaction failed",
        400..=499 => "Transient SMTP failure",
        500..=599 => "Permanent SMTP failure",
        _ => "Unknown SMTP error",
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError>;
}

pub struct SmtpNotifier {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(smtp: &SmtpConfig, from_email: &str) -> Result<Self, NotificationError> {
        let from = from_email
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidAddress(format!("{}: {}", from_email, e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .build();

        Ok(Self { from, transport })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidAddress(format!("{}: {}", email.to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| NotificationError::Build(e.to_string()))?;

        self.transport.send(message).await?;
        log::info!("Email '{}' sent to {}", email.subject, email.to);

        Ok(())
    }
}

/// Used when no SMTP server is configured: the message only goes to the log.
/// The body carries credentials, so it is only logged when `show_body` is set.
pub struct LogNotifier {
    pub show_body: bool,
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotificationError> {
        log::info!(
            "SMTP not configured; email '{}' to {} was not delivered",
            email.subject,
            email.to
        );
        if self.show_body {
            log::debug!("Undelivered email body:\n{}", email.body);
        }
        Ok(())
    }
}

/// SMTP when configured, the log otherwise.
pub fn notifier_from_config(config: &Config) -> Result<Arc<dyn Notifier>, NotificationError> {
    match &config.smtp {
        Some(smtp) => {
            log::info!("Sending email through {}:{}", smtp.host, smtp.port);
            Ok(Arc::new(SmtpNotifier::new(
                smtp,
                &config.default_from_email,
            )?))
        }
        None => {
            log::warn!("SMTP_HOST is not set; outgoing email will only be logged");
            Ok(Arc::new(LogNotifier {
                show_body: config.is_development(),
            }))
        }
    }
}
