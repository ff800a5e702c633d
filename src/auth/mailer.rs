use async_trait::async_trait;

use crate::error::AppError;

/// Outbound email as seen by the credential subsystem: fire-and-forget.
/// Actual transport (SMTP, provider API) lives outside this crate.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}

/// Local dev mailer that logs the message instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError> {
        log::info!("email to {}: {} / {}", to, subject, body);
        Ok(())
    }
}
