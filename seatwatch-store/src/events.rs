use async_trait::async_trait;
use chrono::Utc;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use seatwatch_core::{EvaluationResult, NotificationSender, NotifyError, Watch};
use seatwatch_shared::{AlertTriggeredEvent, Masked};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::alert_message;

#[derive(Clone)]
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self { producer })
    }

    pub async fn publish(&self, topic: &str, key: &str, payload: &str) -> Result<(), rdkafka::error::KafkaError> {
        let record = FutureRecord::to(topic)
            .key(key)
            .payload(payload);

        match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
            Ok(delivery) => {
                info!("Sent message to {}/{}: partition {} offset {}", topic, key, delivery.partition, delivery.offset);
                Ok(())
            }
            Err((e, _msg)) => {
                error!("Failed to send message to {}: {}", topic, e);
                Err(e)
            }
        }
    }
}

/// Publishes rendered alerts to the alert topic. A send counts as delivered
/// once the broker has acknowledged the record.
pub struct KafkaAlertSender {
    producer: EventProducer,
    topic: String,
}

impl KafkaAlertSender {
    pub fn new(producer: EventProducer, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }
}

pub fn build_event(
    recipient_email: &str,
    recipient_name: &str,
    watch: &Watch,
    result: &EvaluationResult,
) -> AlertTriggeredEvent {
    let message = alert_message::render(recipient_name, watch, result);
    AlertTriggeredEvent {
        event_id: Uuid::new_v4(),
        watch_id: watch.id,
        owner_id: watch.owner_id.clone(),
        recipient_email: recipient_email.to_string(),
        recipient_name: recipient_name.to_string(),
        subject: message.subject,
        text_body: message.text_body,
        current_value: result.current_value(),
        threshold: result.threshold(),
        timestamp: Utc::now().timestamp(),
    }
}

#[async_trait]
impl NotificationSender for KafkaAlertSender {
    async fn send_alert(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        watch: &Watch,
        result: &EvaluationResult,
    ) -> Result<(), NotifyError> {
        let event = build_event(recipient_email, recipient_name, watch, result);
        let payload = serde_json::to_string(&event).map_err(|e| NotifyError::Delivery(e.to_string()))?;

        info!("Publishing alert for watch {} to {}", watch.id, Masked(recipient_email));
        self.producer
            .publish(&self.topic, &event.partition_key(), &payload)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}
