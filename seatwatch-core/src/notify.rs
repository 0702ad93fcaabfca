use async_trait::async_trait;

use crate::evaluation::EvaluationResult;
use crate::watch::Watch;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Recipient not found for owner {0}")]
    RecipientNotFound(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Deliver one alert. `Ok` means the message was handed off successfully.
    async fn send_alert(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        watch: &Watch,
        result: &EvaluationResult,
    ) -> Result<(), NotifyError>;
}
