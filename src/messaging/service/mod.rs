//! # Messaging Service
//!
//! Producer/consumer traits and their providers.

pub mod providers;
pub mod traits;

pub use providers::{InMemoryBroker, InMemoryConsumer, KafkaRecordConsumer, KafkaRecordProducer};
pub use traits::{RecordConsumer, RecordProducer};
