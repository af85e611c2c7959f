//! # Messaging Error Types
//!
//! Failures of the broker plumbing itself: producing, consuming, committing
//! and the Avro codec. These are distinct from per-message processing
//! failures, which the retry chain classifies and routes.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Producer error on topic {topic}: {message}")]
    Producer { topic: String, message: String },

    #[error("Consumer error: {message}")]
    Consumer { message: String },

    #[error("Offset commit failed for {topic}[{partition}]@{offset}: {message}")]
    Commit {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },

    #[error("Avro codec error: {message}")]
    Codec { message: String },

    #[error("Record on {topic}[{partition}]@{offset} has no payload")]
    EmptyPayload {
        topic: String,
        partition: i32,
        offset: i64,
    },

    #[error("Kafka client error: {message}")]
    Client { message: String },
}

impl MessagingError {
    pub fn producer(topic: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Producer {
            topic: topic.into(),
            message: message.into(),
        }
    }

    pub fn consumer(message: impl Into<String>) -> Self {
        Self::Consumer {
            message: message.into(),
        }
    }

    pub fn commit(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        message: impl Into<String>,
    ) -> Self {
        Self::Commit {
            topic: topic.into(),
            partition,
            offset,
            message: message.into(),
        }
    }

    /// Create an Avro encode/decode error
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    pub fn empty_payload(topic: impl Into<String>, partition: i32, offset: i64) -> Self {
        Self::EmptyPayload {
            topic: topic.into(),
            partition,
            offset,
        }
    }

    /// True when the record bytes themselves are unusable, so redelivery cannot help
    pub fn is_poison(&self) -> bool {
        matches!(self, Self::Codec { .. } | Self::EmptyPayload { .. })
    }
}

impl From<rdkafka::error::KafkaError> for MessagingError {
    fn from(err: rdkafka::error::KafkaError) -> Self {
        MessagingError::Client {
            message: err.to_string(),
        }
    }
}

impl From<apache_avro::Error> for MessagingError {
    fn from(err: apache_avro::Error) -> Self {
        MessagingError::codec(err.to_string())
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;
