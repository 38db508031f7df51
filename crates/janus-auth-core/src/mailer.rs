//! Mail dispatch
//!
//! Mail never blocks or fails an auth flow: the dispatcher hands the
//! message to a background task, logs delivery errors, and counts them
//! where operators can see them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

/// Mail delivery errors
#[derive(Debug, Error)]
pub enum MailError {
    /// Recipient or sender address could not be parsed
    #[error("invalid mail address: {0}")]
    Address(String),

    /// SMTP transport failure
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Which message body to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTemplate {
    /// Account-activation mail carrying the 4-digit code
    Activation,
    /// Password-reset mail carrying the reset link
    PasswordReset,
}

/// A rendered outbound message
#[derive(Debug, Clone)]
pub struct OutboundMail {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Body template
    pub template: MailTemplate,
    /// Recipient display name, interpolated into the body
    pub name: String,
    /// Activation code or reset link, depending on the template
    pub payload: String,
}

impl OutboundMail {
    /// Render the plain-text body for the template.
    pub fn body(&self) -> String {
        match self.template {
            MailTemplate::Activation => format!(
                "Hello {},\n\nYour activation code is {}. It expires in 5 minutes.\n",
                self.name, self.payload
            ),
            MailTemplate::PasswordReset => format!(
                "Hello {},\n\nReset your password here: {}\nThe link expires in 5 minutes.\n",
                self.name, self.payload
            ),
        }
    }
}

/// Mail delivery capability
#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Deliver one message
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError>;
}

/// Fire-and-forget wrapper around a [`Mailer`].
///
/// Delivery runs on a spawned task so the calling flow never waits on
/// the transport. Failures are logged and counted, never propagated.
pub struct MailDispatcher<M> {
    mailer: Arc<M>,
    failures: Arc<AtomicU64>,
}

impl<M> Clone for MailDispatcher<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: Arc::clone(&self.mailer),
            failures: Arc::clone(&self.failures),
        }
    }
}

impl<M: Mailer> MailDispatcher<M> {
    /// Wrap a mailer
    pub fn new(mailer: Arc<M>) -> Self {
        Self {
            mailer,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Queue a message for delivery without waiting for the result.
    pub fn dispatch(&self, mail: OutboundMail) {
        let mailer = Arc::clone(&self.mailer);
        let failures = Arc::clone(&self.failures);

        tokio::spawn(async move {
            if let Err(e) = mailer.send(mail).await {
                failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("mail delivery failed: {e}");
            }
        });
    }

    /// Number of deliveries that have failed since startup
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

/// SMTP mailer on lettre's async transport
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Create an SMTP mailer using STARTTLS against the given relay.
    pub fn new(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        from: Mailbox,
    ) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(port);

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user.to_string(), pass.to_string()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutboundMail) -> Result<(), MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("{e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .body(mail.body())
            .map_err(|e| MailError::Transport(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(())
    }
}
