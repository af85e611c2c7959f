//! Messaging providers: Kafka for production, an in-memory broker for tests.

mod in_memory;
mod kafka;

pub use in_memory::{InMemoryBroker, InMemoryConsumer};
pub use kafka::{KafkaRecordConsumer, KafkaRecordProducer};
