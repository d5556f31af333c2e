//! Outbound transactional mail.
//!
//! The dispatcher resolves an SMTP relay from the configured *sender*
//! address's domain against a fixed table of known providers and fails fast
//! at construction when the domain is not recognized. Delivery failures are
//! logged and surfaced to the caller; they never roll back state that was
//! already persisted.

use async_trait::async_trait;
use lettre::{
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{error, info};

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum MailError {
    /// The configured sender address's domain is not in the relay table.
    #[error("unsupported email provider: {0}")]
    UnsupportedProvider(String),

    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("failed to send email: {0}")]
    Transport(String),
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError>;
}

/// Map a sender domain to its outbound SMTP relay.
///
/// # Errors
/// Returns [`MailError::UnsupportedProvider`] for domains outside the table.
pub fn resolve_relay(sender_domain: &str) -> Result<&'static str, MailError> {
    match sender_domain.to_lowercase().as_str() {
        "gmail.com" => Ok("smtp.gmail.com"),
        "outlook.com" | "hotmail.com" | "live.com" => Ok("smtp.office365.com"),
        "yahoo.com" => Ok("smtp.mail.yahoo.com"),
        "icloud.com" | "me.com" => Ok("smtp.mail.me.com"),
        other => Err(MailError::UnsupportedProvider(other.to_string())),
    }
}

/// SMTP-backed sender authenticated as the service's own mail account.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer for the given sender address, resolving the relay from
    /// the address's domain.
    ///
    /// # Errors
    /// Fails fast on an unparseable sender address or an unsupported domain.
    pub fn new(from_address: &str, password: &SecretString) -> Result<Self, MailError> {
        let domain = from_address
            .rsplit_once('@')
            .map(|(_, domain)| domain)
            .ok_or_else(|| MailError::InvalidAddress(from_address.to_string()))?;
        let relay = resolve_relay(domain)?;

        let from: Mailbox = from_address
            .parse()
            .map_err(|_| MailError::InvalidAddress(from_address.to_string()))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(relay)
            .map_err(|err| MailError::Transport(err.to_string()))?
            .credentials(Credentials::new(
                from_address.to_string(),
                password.expose_secret().to_string(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(message.to.clone()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .body(message.body.clone())
            .map_err(|err| MailError::Transport(err.to_string()))?;

        match self.transport.send(email).await {
            Ok(_) => {
                info!(to = %message.to, subject = %message.subject, "email sent");
                Ok(())
            }
            Err(err) => {
                error!(to = %message.to, "email delivery failed: {err}");
                Err(MailError::Transport(err.to_string()))
            }
        }
    }
}

/// Records messages instead of delivering them; used by tests and local runs.
#[derive(Default)]
pub struct MockEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
}

impl MockEmailSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every dispatch fails, for exercising `MailError` paths.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of everything sent so far.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("mock transport failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn relay_table_covers_known_providers() -> Result<()> {
        assert_eq!(resolve_relay("gmail.com").ok(), Some("smtp.gmail.com"));
        assert_eq!(resolve_relay("outlook.com").ok(), Some("smtp.office365.com"));
        assert_eq!(resolve_relay("hotmail.com").ok(), Some("smtp.office365.com"));
        assert_eq!(resolve_relay("live.com").ok(), Some("smtp.office365.com"));
        assert_eq!(resolve_relay("yahoo.com").ok(), Some("smtp.mail.yahoo.com"));
        assert_eq!(resolve_relay("icloud.com").ok(), Some("smtp.mail.me.com"));
        assert_eq!(resolve_relay("me.com").ok(), Some("smtp.mail.me.com"));
        assert_eq!(resolve_relay("GMAIL.com").ok(), Some("smtp.gmail.com"));
        Ok(())
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(matches!(
            resolve_relay("example.com"),
            Err(MailError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn mailer_fails_fast_on_unsupported_sender_domain() {
        let password = SecretString::from("hunter2".to_string());
        let result = SmtpMailer::new("noreply@example.com", &password);
        assert!(matches!(result, Err(MailError::UnsupportedProvider(_))));
    }

    #[test]
    fn mailer_rejects_malformed_sender() {
        let password = SecretString::from("hunter2".to_string());
        let result = SmtpMailer::new("not-an-address", &password);
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));
    }

    #[test]
    fn mailer_builds_for_supported_sender() {
        let password = SecretString::from("hunter2".to_string());
        assert!(SmtpMailer::new("noreply@gmail.com", &password).is_ok());
    }

    #[tokio::test]
    async fn mock_records_messages() -> Result<()> {
        let mock = MockEmailSender::new();
        mock.send(&EmailMessage {
            to: "alice@example.com".to_string(),
            subject: "Hi".to_string(),
            body: "body".to_string(),
        })
        .await?;

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn failing_mock_surfaces_transport_error() {
        let mock = MockEmailSender::failing();
        let result = mock
            .send(&EmailMessage {
                to: "alice@example.com".to_string(),
                subject: "Hi".to_string(),
                body: "body".to_string(),
            })
            .await;
        assert!(matches!(result, Err(MailError::Transport(_))));
    }
}
