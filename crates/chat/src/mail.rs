//! Outbound mail for support tickets.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use pathway_core::config::MailSettings;
use pathway_core::{AppError, AppResult};
use pathway_llm::with_retry;

/// Delivers one plain-text message. Implementations own their retry
/// policy; an `Err` means the message was not delivered.
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

/// SMTP-backed dispatcher.
///
/// Credentials come from the environment variable named in the config, so
/// secrets never live in config files.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    max_retries: u32,
}

impl SmtpMailer {
    pub fn new(settings: &MailSettings, max_retries: u32) -> AppResult<Self> {
        let password = std::env::var(&settings.password_env).map_err(|_| {
            AppError::Config(format!(
                "SMTP password not set (expected in ${})",
                settings.password_env
            ))
        })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
            .map_err(|e| AppError::Mail(format!("Invalid SMTP relay: {}", e)))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(settings.from_address.clone(), password))
            .build();

        Ok(Self {
            transport,
            from_address: settings.from_address.clone(),
            max_retries,
        })
    }
}

#[async_trait]
impl MailDispatcher for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e| AppError::Mail(format!("Invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::Mail(format!("Invalid recipient address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Mail(format!("Failed to build message: {}", e)))?;

        with_retry("smtp send", self.max_retries, || async {
            self.transport
                .send(message.clone())
                .await
                .map(|_| ())
                .map_err(|e| AppError::Mail(format!("SMTP send failed: {}", e)))
        })
        .await?;

        tracing::info!("Mail sent to {} ({})", to, subject);
        Ok(())
    }
}

/// In-memory dispatcher that records sends for assertions.
#[cfg(test)]
pub struct MockMailer {
    sent: std::sync::Mutex<Vec<(String, String, String)>>,
    fail_next: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MockMailer {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail_next: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Make the next send fail once.
    pub fn fail_next(&self) {
        self.fail_next
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl MailDispatcher for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        if self.fail_next.swap(false, std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Mail("simulated SMTP outage".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}
