//! # Messaging Service Traits
//!
//! Provider-agnostic producer and consumer seams. The retry chain and the
//! processing handler only see these traits, so the Kafka provider can be
//! swapped for the in-memory broker in tests.

use std::time::Duration;

use async_trait::async_trait;

use crate::messaging::errors::MessagingResult;
use crate::messaging::message::{DeliveryReceipt, InboundRecord, OutboundRecord};

/// Publishes records to any topic
#[async_trait]
pub trait RecordProducer: Send + Sync + 'static {
    /// Publish one record and wait for the broker acknowledgement
    async fn send(&self, record: OutboundRecord) -> MessagingResult<DeliveryReceipt>;
}

/// One member of the consumer group.
///
/// A consumer is owned by exactly one worker, which handles the records it
/// returns strictly one at a time.
#[async_trait]
pub trait RecordConsumer: Send + Sync + 'static {
    /// Next record, or `None` if nothing arrived within `timeout`
    async fn next_record(&self, timeout: Duration) -> MessagingResult<Option<InboundRecord>>;

    /// Commit the offset after `record`, synchronously
    async fn commit(&self, record: &InboundRecord) -> MessagingResult<()>;

    /// Reposition so that `record` is delivered again
    async fn rewind(&self, record: &InboundRecord) -> MessagingResult<()>;
}
