//! # Processor Bootstrap
//!
//! Wires a [`ProcessorConfig`] into a running pipeline: one shared producer,
//! one consumer-group member per listener instance, the two API clients and
//! the description table.
//!
//! ## Key Features
//!
//! - **Kafka deployment**: [`ProcessorSystem::bootstrap`] builds the rdkafka providers
//! - **Embedded/testing**: [`ProcessorSystem::assemble`] accepts any producer and consumers
//! - **Lifecycle**: start/stop/status

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::{ConfigManager, ProcessorConfig};
use crate::error::Result;
use crate::messaging::{
    AvroCodec, KafkaRecordConsumer, KafkaRecordProducer, RecordConsumer, RecordProducer,
};
use crate::processing::{CertifiedCopyProcessor, SignDocumentPublisher};
use crate::retry::{ChainConsumer, ChainConsumerStatsSnapshot, ChainHandler};
use crate::services::{
    build_http_client, DocumentApiClient, FilingHistoryApiClient, FilingHistoryDescriptions,
};

/// Running processor handle
pub struct ProcessorSystem {
    config: ProcessorConfig,
    environment: String,
    consumer: ChainConsumer,
}

/// System status information
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub running: bool,
    pub environment: String,
    pub listener_instances: usize,
    pub consumed_topics: Vec<String>,
    pub stats: ChainConsumerStatsSnapshot,
}

impl ProcessorSystem {
    /// Build the Kafka-backed pipeline from loaded configuration
    pub fn bootstrap(config_manager: &ConfigManager) -> Result<Self> {
        let config = config_manager.config().clone();
        let topics = config.topics.consumed_topics(config.retry.max_attempts);

        let producer: Arc<dyn RecordProducer> = Arc::new(KafkaRecordProducer::new(&config.kafka)?);
        let consumers = (0..config.kafka.concurrency)
            .map(|_| {
                KafkaRecordConsumer::new(&config.kafka, &topics)
                    .map(|consumer| Arc::new(consumer) as Arc<dyn RecordConsumer>)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let descriptions = FilingHistoryDescriptions::load(&config.filing_history_descriptions_path);

        Self::assemble(
            config,
            config_manager.environment().to_string(),
            producer,
            consumers,
            descriptions,
        )
    }

    /// Build the pipeline around caller-supplied messaging providers
    pub fn assemble(
        config: ProcessorConfig,
        environment: String,
        producer: Arc<dyn RecordProducer>,
        consumers: Vec<Arc<dyn RecordConsumer>>,
        descriptions: FilingHistoryDescriptions,
    ) -> Result<Self> {
        config.validate()?;

        let codec = Arc::new(AvroCodec::new()?);
        let http = build_http_client(&config.api)?;
        let filing_history = Arc::new(FilingHistoryApiClient::new(http.clone(), &config.api)?);
        let documents = Arc::new(DocumentApiClient::new(http, &config.api));

        let publisher = SignDocumentPublisher::new(
            Arc::clone(&producer),
            Arc::clone(&codec),
            config.topics.sign_digital_document.clone(),
        );
        let processor = Arc::new(CertifiedCopyProcessor::new(
            filing_history,
            documents,
            Arc::new(descriptions),
            publisher,
        ));

        let handler = Arc::new(ChainHandler::new(processor, codec, producer, &config));
        let consumer = ChainConsumer::new(handler, consumers, config.kafka.poll_timeout)?;

        info!(
            environment = %environment,
            listener_instances = config.kafka.concurrency,
            max_attempts = config.retry.max_attempts,
            backoff_delay_ms = config.retry.backoff_delay.as_millis() as u64,
            "🚀 Certified copy processor assembled"
        );

        Ok(Self {
            config,
            environment,
            consumer,
        })
    }

    pub fn start(&self) -> Result<()> {
        self.consumer.start()?;
        info!("✅ Certified copy processor started");
        Ok(())
    }

    pub async fn stop(&self) {
        self.consumer.stop().await;
        info!("🛑 Certified copy processor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.consumer.is_running()
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            running: self.is_running(),
            environment: self.environment.clone(),
            listener_instances: self.config.kafka.concurrency,
            consumed_topics: self
                .config
                .topics
                .consumed_topics(self.config.retry.max_attempts),
            stats: self.consumer.stats(),
        }
    }
}
