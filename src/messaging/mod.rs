//! # Messaging
//!
//! Broker plumbing: record types, the Avro codec, and the producer/consumer
//! traits with their Kafka and in-memory providers.

pub mod avro;
pub mod errors;
pub mod message;
pub mod service;

pub use avro::AvroCodec;
pub use errors::{MessagingError, MessagingResult};
pub use message::{DeliveryReceipt, InboundRecord, OutboundRecord};
pub use service::{
    InMemoryBroker, InMemoryConsumer, KafkaRecordConsumer, KafkaRecordProducer, RecordConsumer,
    RecordProducer,
};
