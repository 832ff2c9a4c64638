use async_trait::async_trait;
use proctor_core::notifier::{NotifyError, Subscriber};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{info, error};

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

/// Forwards notifier payloads to Kafka topics of the same name. Attached to
/// the realtime hub as a permanent subscriber.
pub struct KafkaRelay {
    id: String,
    producer: EventProducer,
    topics: Vec<String>,
}

impl KafkaRelay {
    pub fn new(producer: EventProducer, topics: Vec<String>) -> Self {
        Self {
            id: format!("kafka:{}", topics.join(",")),
            producer,
            topics,
        }
    }
}

#[async_trait]
impl Subscriber for KafkaRelay {
    fn id(&self) -> &str {
        &self.id
    }

    fn wants(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }

    async fn send(&self, topic: &str, payload: &str) -> Result<(), NotifyError> {
        self.producer
            .publish(topic, topic, payload)
            .await
            .map_err(|e| NotifyError::Delivery {
                subscriber: self.id.clone(),
                reason: e.to_string(),
            })
    }
}
