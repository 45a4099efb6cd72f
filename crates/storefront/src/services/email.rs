//! Outgoing mail.
//!
//! [`Mailer`] is the seam the checkout pipeline sends through. [`SmtpMailer`]
//! delivers over SMTP with lettre; tests substitute recording or failing
//! mailers.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Attachment, Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::instrument;

use crypto_cart_core::Email;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
}

/// A file attached to an outgoing mail.
#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    /// When set, the part is inline and referenced from HTML as `cid:<id>`.
    pub content_id: Option<String>,
    pub body: Vec<u8>,
}

impl MailAttachment {
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        self.content_id.is_some()
    }
}

/// A fully rendered message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: Email,
    pub bcc: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub attachments: Vec<MailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, mail: OutgoingMail) -> Result<(), EmailError>;
}

/// SMTP delivery through a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: Mailbox,
}

impl SmtpMailer {
    /// # Errors
    ///
    /// Returns an error if the relay host is invalid or the from address
    /// does not parse.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: parse_mailbox(&config.from_address)?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[instrument(skip_all, fields(to = %mail.to, subject = %mail.subject))]
    async fn send(&self, mail: OutgoingMail) -> Result<(), EmailError> {
        let message = build_message(self.from_address.clone(), mail)?;
        self.transport.send(message).await?;
        tracing::info!("Order mail sent");
        Ok(())
    }
}

/// Whether lettre will accept `email` as a recipient.
#[must_use]
pub fn is_deliverable(email: &Email) -> bool {
    parse_mailbox(email.as_str()).is_ok()
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

fn attachment_part(attachment: MailAttachment) -> Result<SinglePart, EmailError> {
    let content_type = ContentType::parse(&attachment.content_type)
        .map_err(|e| EmailError::InvalidContentType(format!("{}: {e}", attachment.content_type)))?;
    let builder = match attachment.content_id {
        Some(cid) => Attachment::new_inline(cid),
        None => Attachment::new(attachment.filename),
    };
    Ok(builder.body(attachment.body, content_type))
}

/// Lay out the MIME tree:
///
/// ```text
/// mixed                      (only with regular attachments)
/// ├── alternative
/// │   ├── text/plain
/// │   └── related
/// │       ├── text/html
/// │       └── inline parts   (cid:…)
/// └── regular attachments
/// ```
fn build_message(from: Mailbox, mail: OutgoingMail) -> Result<Message, EmailError> {
    let (inline, regular): (Vec<_>, Vec<_>) =
        mail.attachments.into_iter().partition(MailAttachment::is_inline);

    let mut related = MultiPart::related().singlepart(SinglePart::html(mail.html));
    for attachment in inline {
        related = related.singlepart(attachment_part(attachment)?);
    }

    let alternative = MultiPart::alternative()
        .singlepart(SinglePart::plain(mail.text))
        .multipart(related);

    let body = if regular.is_empty() {
        alternative
    } else {
        let mut mixed = MultiPart::mixed().multipart(alternative);
        for attachment in regular {
            mixed = mixed.singlepart(attachment_part(attachment)?);
        }
        mixed
    };

    let mut builder = Message::builder()
        .from(from)
        .to(parse_mailbox(mail.to.as_str())?)
        .subject(mail.subject);
    if let Some(bcc) = mail.bcc.as_deref() {
        builder = builder.bcc(parse_mailbox(bcc)?);
    }

    Ok(builder.multipart(body)?)
}
