use async_trait::async_trait;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, msg: &MailMessage) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, msg: &MailMessage) -> anyhow::Result<()> {
        info!(to = %msg.to, subject = %msg.subject, "mail dispatched to log transport");
        debug!(body = %msg.body, "mail body");
        Ok(())
    }
}
