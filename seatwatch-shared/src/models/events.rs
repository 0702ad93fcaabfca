use uuid::Uuid;

/// Published to the alert topic once a notification has been judged deliverable.
/// A downstream mailer consumes these and owns the actual e-mail transport.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct AlertTriggeredEvent {
    pub event_id: Uuid,
    pub watch_id: Uuid,
    pub owner_id: String,
    pub recipient_email: String,
    pub recipient_name: String,
    pub subject: String,
    pub text_body: String,
    pub current_value: f64,
    pub threshold: f64,
    pub timestamp: i64,
}

impl AlertTriggeredEvent {
    /// Kafka partition key. Keyed by watch so a watch's alerts stay ordered.
    pub fn partition_key(&self) -> String {
        self.watch_id.to_string()
    }
}
