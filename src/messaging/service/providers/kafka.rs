//! # Kafka Provider
//!
//! rdkafka-backed producer and consumer. Auto-commit is disabled: the chain
//! worker commits each record itself once the record has been fully handled.
//! Synchronous commits and seeks block on the broker, so they run on the
//! blocking pool rather than a runtime worker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Header, Headers, Message, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use rdkafka::{Offset, TopicPartitionList};
use tracing::{debug, info};

use crate::config::KafkaConfig;
use crate::constants::KAFKA_MAX_POLL_INTERVAL;
use crate::messaging::errors::{MessagingError, MessagingResult};
use crate::messaging::message::{DeliveryReceipt, InboundRecord, OutboundRecord};
use crate::messaging::service::traits::{RecordConsumer, RecordProducer};

const PRODUCER_MESSAGE_TIMEOUT_MS: &str = "30000";
const SEND_QUEUE_TIMEOUT: Duration = Duration::from_secs(5);
const SEEK_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared producer used for the sign topic and every chain republish
pub struct KafkaRecordProducer {
    producer: FutureProducer,
}

impl std::fmt::Debug for KafkaRecordProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaRecordProducer").finish_non_exhaustive()
    }
}

impl KafkaRecordProducer {
    pub fn new(config: &KafkaConfig) -> MessagingResult<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("message.timeout.ms", PRODUCER_MESSAGE_TIMEOUT_MS)
            .set("enable.idempotence", "true")
            .create()?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            "Kafka producer created"
        );
        Ok(Self { producer })
    }
}

#[async_trait]
impl RecordProducer for KafkaRecordProducer {
    async fn send(&self, record: OutboundRecord) -> MessagingResult<DeliveryReceipt> {
        let mut headers = OwnedHeaders::new_with_capacity(record.headers.len());
        for (key, value) in &record.headers {
            headers = headers.insert(Header {
                key: key.as_str(),
                value: Some(value.as_slice()),
            });
        }

        let mut future_record: FutureRecord<'_, str, [u8]> =
            FutureRecord::to(&record.topic)
                .payload(record.payload.as_slice())
                .headers(headers);
        if let Some(key) = record.key.as_deref() {
            future_record = future_record.key(key);
        }

        let (partition, offset) = self
            .producer
            .send(future_record, Timeout::After(SEND_QUEUE_TIMEOUT))
            .await
            .map_err(|(err, _)| MessagingError::producer(&record.topic, err.to_string()))?;

        Ok(DeliveryReceipt {
            topic: record.topic,
            partition,
            offset,
        })
    }
}

/// One consumer-group member subscribed to the main topic and every retry topic
pub struct KafkaRecordConsumer {
    consumer: Arc<StreamConsumer>,
}

impl std::fmt::Debug for KafkaRecordConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaRecordConsumer").finish_non_exhaustive()
    }
}

impl KafkaRecordConsumer {
    pub fn new(config: &KafkaConfig, topics: &[String]) -> MessagingResult<Self> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("allow.auto.create.topics", "true")
            .set(
                "max.poll.interval.ms",
                KAFKA_MAX_POLL_INTERVAL.as_millis().to_string(),
            )
            .create()?;

        let subscriptions: Vec<&str> = topics.iter().map(String::as_str).collect();
        consumer.subscribe(&subscriptions)?;

        info!(
            group_id = %config.group_id,
            topics = ?subscriptions,
            "Kafka consumer subscribed"
        );
        Ok(Self {
            consumer: Arc::new(consumer),
        })
    }
}

fn to_inbound(message: &BorrowedMessage<'_>) -> InboundRecord {
    let headers = message
        .headers()
        .map(|headers| {
            headers
                .iter()
                .map(|header| {
                    (
                        header.key.to_string(),
                        header.value.map(<[u8]>::to_vec).unwrap_or_default(),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    InboundRecord {
        topic: message.topic().to_string(),
        partition: message.partition(),
        offset: message.offset(),
        key: message
            .key()
            .map(|key| String::from_utf8_lossy(key).into_owned()),
        payload: message.payload().map(<[u8]>::to_vec),
        headers,
    }
}

#[async_trait]
impl RecordConsumer for KafkaRecordConsumer {
    async fn next_record(&self, timeout: Duration) -> MessagingResult<Option<InboundRecord>> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Err(_) => Ok(None),
            Ok(Err(err)) => Err(MessagingError::consumer(err.to_string())),
            Ok(Ok(message)) => Ok(Some(to_inbound(&message))),
        }
    }

    async fn commit(&self, record: &InboundRecord) -> MessagingResult<()> {
        let mut offsets = TopicPartitionList::new();
        offsets
            .add_partition_offset(&record.topic, record.partition, Offset::Offset(record.offset + 1))
            .map_err(|e| {
                MessagingError::commit(&record.topic, record.partition, record.offset, e.to_string())
            })?;

        let consumer = Arc::clone(&self.consumer);
        tokio::task::spawn_blocking(move || consumer.commit(&offsets, CommitMode::Sync))
            .await
            .map_err(|e| {
                MessagingError::commit(&record.topic, record.partition, record.offset, e.to_string())
            })?
            .map_err(|e| {
                MessagingError::commit(&record.topic, record.partition, record.offset, e.to_string())
            })?;

        debug!(position = %record.position(), "Offset committed");
        Ok(())
    }

    async fn rewind(&self, record: &InboundRecord) -> MessagingResult<()> {
        let consumer = Arc::clone(&self.consumer);
        let (topic, partition, offset) = (record.topic.clone(), record.partition, record.offset);
        tokio::task::spawn_blocking(move || {
            consumer.seek(&topic, partition, Offset::Offset(offset), SEEK_TIMEOUT)
        })
        .await
        .map_err(|e| MessagingError::consumer(e.to_string()))??;
        debug!(position = %record.position(), "Consumer rewound");
        Ok(())
    }
}
