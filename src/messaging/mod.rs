use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;

// ============================================================================
// Kafka Plumbing
// ============================================================================
//
// Client construction for the single order-ingestion subscription, plus
// best-effort topic provisioning at startup. Offsets are committed
// manually by the pipeline after each message is processed, so the
// consumer is created with auto-commit disabled.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct KafkaConfig {
    /// Bootstrap brokers, comma-separated.
    pub brokers: String,
    pub topic: String,
    pub group: String,
}

/// Build the stream consumer for the ingestion pipeline and subscribe it
/// to the configured topic.
pub fn create_consumer(config: &KafkaConfig) -> Result<StreamConsumer, KafkaError> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .set("group.id", &config.group)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .create()?;

    consumer.subscribe(&[config.topic.as_str()])?;

    tracing::info!(
        brokers = %config.brokers,
        topic = %config.topic,
        group = %config.group,
        "Kafka consumer subscribed"
    );

    Ok(consumer)
}

/// Best-effort creation of the ingestion topic (1 partition, replication
/// factor 1). Provisioning failures are logged and ignored; the consumer
/// will pick the topic up whenever it appears.
pub async fn ensure_topic(config: &KafkaConfig) {
    let admin: AdminClient<DefaultClientContext> = match ClientConfig::new()
        .set("bootstrap.servers", &config.brokers)
        .create()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "could not create Kafka admin client, skipping topic provisioning");
            return;
        }
    };

    let topic = NewTopic::new(&config.topic, 1, TopicReplication::Fixed(1));

    match admin.create_topics([&topic], &AdminOptions::new()).await {
        Ok(results) => {
            for result in results {
                match result {
                    Ok(name) => tracing::info!(topic = %name, "Kafka topic created"),
                    Err((name, code)) => tracing::debug!(
                        topic = %name,
                        code = %code,
                        "Kafka topic not created (may already exist)"
                    ),
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, topic = %config.topic, "Kafka topic provisioning failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_consumer_without_broker() {
        // Client creation is lazy: no broker connection is made until the
        // consumer polls, so construction must succeed offline.
        let config = KafkaConfig {
            brokers: "localhost:9092".to_string(),
            topic: "orders".to_string(),
            group: "order-consumer".to_string(),
        };

        assert!(create_consumer(&config).is_ok());
    }
}
