pub mod templates;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

pub const PLAIN_FALLBACK: &str = "This email requires an HTML-capable client.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub cc: Option<String>,
    pub subject: String,
    pub html_body: String,
}

/// Outbound mail seam. One attempt per call; `false` means the message was not
/// sent and will not be retried.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> bool;
}

pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Self {
        if !config.is_complete() {
            tracing::warn!("SMTP credentials are missing; confirmation emails are disabled");
            return Self {
                transport: None,
                from: None,
            };
        }

        match Self::build(config) {
            Ok((transport, from)) => {
                tracing::info!("SMTP configured via {}:{}", config.host, config.port);
                Self {
                    transport: Some(transport),
                    from: Some(from),
                }
            }
            Err(e) => {
                tracing::warn!("SMTP not available: {e}");
                Self {
                    transport: None,
                    from: None,
                }
            }
        }
    }

    fn build(
        config: &SmtpConfig,
    ) -> Result<(AsyncSmtpTransport<Tokio1Executor>, Mailbox), String> {
        let user = config.user.clone().unwrap_or_default();
        let pass = config.pass.clone().unwrap_or_default();
        let from_addr = config.from.clone().unwrap_or_default();

        let from = Mailbox::new(
            Some(config.from_name.clone()),
            from_addr
                .trim()
                .parse()
                .map_err(|e| format!("Invalid from address: {e}"))?,
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP starttls error: {e}"))?
            .port(config.port)
            .credentials(Credentials::new(user, pass))
            .build();

        Ok((transport, from))
    }

    fn message(&self, from: &Mailbox, email: &Email) -> Result<Message, String> {
        let mut builder = Message::builder()
            .from(from.clone())
            .to(email
                .to
                .trim()
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?);

        if let Some(cc) = email.cc.as_deref().filter(|cc| !cc.trim().is_empty()) {
            builder = builder.cc(cc
                .trim()
                .parse()
                .map_err(|e| format!("Invalid cc address: {e}"))?);
        }

        builder
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                PLAIN_FALLBACK.to_string(),
                email.html_body.clone(),
            ))
            .map_err(|e| format!("Failed to build email: {e}"))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> bool {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::warn!("Email not sent: SMTP credentials are missing");
            return false;
        };

        let message = match self.message(from, email) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Email not sent: {e}");
                return false;
            }
        };

        match transport.send(message).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Email send failed: {e}");
                false
            }
        }
    }
}
