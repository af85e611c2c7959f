//! # Processor Configuration
//!
//! Typed configuration for the consumer group, the retry chain, the upstream
//! APIs and the description table. Values come from the process environment
//! (see [`ConfigManager`]); every section validates itself so a misconfigured
//! process fails at startup rather than on the first message.
//!
//! ```rust,no_run
//! use certified_copy_processor::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::from_env()?;
//! let retry_topics = manager.config().topics.retry_topics(manager.config().retry.max_attempts);
//! # Ok(())
//! # }
//! ```

pub mod loader;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEAD_LETTER_TOPIC_SUFFIX, KAFKA_MAX_POLL_INTERVAL, RETRY_TOPIC_SUFFIX};
use crate::error::{ProcessorError, Result};

pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessorConfig {
    /// Broker connection and consumer group settings
    pub kafka: KafkaConfig,

    /// Topic names
    pub topics: TopicConfig,

    /// Retry chain shape and backoff
    pub retry: RetryConfig,

    /// Upstream API endpoints and credentials
    pub api: ApiConfig,

    /// YAML table mapping description codes to display text
    pub filing_history_descriptions_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub group_id: String,
    /// Number of parallel listener workers
    pub concurrency: usize,
    /// How long a worker waits for a record before checking for shutdown
    #[serde(with = "duration_millis")]
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TopicConfig {
    /// Main inbound topic (ItemOrderedCertifiedCopy)
    pub item_ordered_certified_copy: String,
    /// Outbound topic (SignDigitalDocument)
    pub sign_digital_document: String,
    /// Terminal sink for non-retryable failures and undecodable payloads
    pub invalid_item_ordered_certified_copy: String,
}

impl TopicConfig {
    pub fn retry_topic(&self, attempt: u32) -> String {
        format!(
            "{}{RETRY_TOPIC_SUFFIX}{attempt}",
            self.item_ordered_certified_copy
        )
    }

    pub fn retry_topics(&self, max_attempts: u32) -> Vec<String> {
        (1..=max_attempts).map(|k| self.retry_topic(k)).collect()
    }

    pub fn dead_letter_topic(&self) -> String {
        format!(
            "{}{DEAD_LETTER_TOPIC_SUFFIX}",
            self.item_ordered_certified_copy
        )
    }

    /// Topics the listener subscribes to: main followed by every retry topic
    pub fn consumed_topics(&self, max_attempts: u32) -> Vec<String> {
        let mut topics = vec![self.item_ordered_certified_copy.clone()];
        topics.extend(self.retry_topics(max_attempts));
        topics
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Number of retry topics, RETRY_1..RETRY_N
    pub max_attempts: u32,
    /// Fixed delay applied before each retry topic delivery is processed
    #[serde(with = "duration_millis")]
    pub backoff_delay: Duration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the filing history API
    pub api_url: String,
    /// Base URL of the document API
    pub document_api_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    #[serde(with = "duration_millis")]
    pub request_timeout: Duration,
}

impl ProcessorConfig {
    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        if self.kafka.bootstrap_servers.trim().is_empty() {
            return Err(ProcessorError::configuration(
                "bootstrap_servers cannot be empty",
            ));
        }
        if self.kafka.group_id.trim().is_empty() {
            return Err(ProcessorError::configuration("group_id cannot be empty"));
        }
        if self.kafka.concurrency < 1 {
            return Err(ProcessorError::configuration(
                "concurrency must be at least 1",
            ));
        }

        if self.retry.backoff_delay >= KAFKA_MAX_POLL_INTERVAL {
            return Err(ProcessorError::configuration(format!(
                "backoff_delay must be below the consumer max poll interval of {}ms",
                KAFKA_MAX_POLL_INTERVAL.as_millis()
            )));
        }

        let topics = &self.topics;
        for (name, value) in [
            ("item_ordered_certified_copy", &topics.item_ordered_certified_copy),
            ("sign_digital_document", &topics.sign_digital_document),
            (
                "invalid_item_ordered_certified_copy",
                &topics.invalid_item_ordered_certified_copy,
            ),
        ] {
            if value.trim().is_empty() {
                return Err(ProcessorError::configuration(format!(
                    "topic {name} cannot be empty"
                )));
            }
        }

        let invalid = &topics.invalid_item_ordered_certified_copy;
        let mut chain = topics.consumed_topics(self.retry.max_attempts);
        chain.push(topics.dead_letter_topic());
        if chain.iter().any(|t| t == invalid) {
            return Err(ProcessorError::configuration(format!(
                "invalid topic {invalid} collides with a retry chain topic"
            )));
        }
        if chain.iter().any(|t| *t == topics.sign_digital_document) {
            return Err(ProcessorError::configuration(format!(
                "sign digital document topic {} collides with a retry chain topic",
                topics.sign_digital_document
            )));
        }

        for (name, value) in [
            ("api_url", &self.api.api_url),
            ("document_api_url", &self.api.document_api_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                ProcessorError::configuration(format!("{name} is not a valid URL ({value}): {e}"))
            })?;
        }

        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_config() -> ProcessorConfig {
        ProcessorConfig {
            kafka: KafkaConfig {
                bootstrap_servers: "localhost:9092".to_string(),
                group_id: "certified-copy-processor".to_string(),
                concurrency: 2,
                poll_timeout: Duration::from_millis(500),
            },
            topics: TopicConfig {
                item_ordered_certified_copy: "item-ordered-certified-copy".to_string(),
                sign_digital_document: "sign-digital-document".to_string(),
                invalid_item_ordered_certified_copy: "item-ordered-certified-copy-invalid"
                    .to_string(),
            },
            retry: RetryConfig {
                max_attempts: 3,
                backoff_delay: Duration::from_millis(100),
            },
            api: ApiConfig {
                api_url: "http://api.chs.local".to_string(),
                document_api_url: "http://document-api.chs.local".to_string(),
                api_key: "secret".to_string(),
                request_timeout: Duration::from_secs(30),
            },
            filing_history_descriptions_path: PathBuf::from(
                "api-enumerations/filing_history_descriptions.yml",
            ),
        }
    }

    #[test]
    fn test_topic_naming() {
        let topics = sample_config().topics;
        assert_eq!(topics.retry_topic(2), "item-ordered-certified-copy-retry-2");
        assert_eq!(topics.dead_letter_topic(), "item-ordered-certified-copy-error");
        assert_eq!(
            topics.consumed_topics(2),
            vec![
                "item-ordered-certified-copy",
                "item-ordered-certified-copy-retry-1",
                "item-ordered-certified-copy-retry-2",
            ]
        );
        assert!(topics.retry_topics(0).is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(sample_config().validate().is_ok());

        let mut config = sample_config();
        config.kafka.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.topics.sign_digital_document = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.topics.invalid_item_ordered_certified_copy =
            "item-ordered-certified-copy-retry-3".to_string();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.topics.invalid_item_ordered_certified_copy =
            "item-ordered-certified-copy-error".to_string();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.api.document_api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_must_fit_inside_poll_interval() {
        let mut config = sample_config();
        config.retry.backoff_delay = KAFKA_MAX_POLL_INTERVAL - Duration::from_millis(1);
        assert!(config.validate().is_ok());

        config.retry.backoff_delay = KAFKA_MAX_POLL_INTERVAL;
        let err = config.validate().expect_err("backoff too long");
        assert!(err.to_string().contains("max poll interval"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let json = serde_json::to_value(sample_config()).expect("serialize config");
        assert!(json["api"].get("api_key").is_none());
        assert_eq!(json["retry"]["backoff_delay"], 100);
    }
}
