//! # Chain Consumer
//!
//! Worker pool consuming the main topic and every retry topic.
//!
//! ## Architecture
//!
//! - **Workers**: one tokio task per listener instance, each owning one
//!   consumer-group member and handling its records strictly one at a time
//! - **Per record**: wait out the backoff, decode, process, republish on
//!   failure, then commit synchronously
//! - **Routing**: failures go through [`next_hop`] and the
//!   [`InvalidMessageRouter`]; undecodable payloads go straight to invalid
//! - **Redelivery**: if a republish fails the consumer is rewound and the
//!   offset is not committed
//! - **Observability**: atomic counters, see [`ChainConsumerStats`]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::chain::{next_hop, ChainState, ChainTopology};
use super::routing::{InvalidMessageRouter, MessageFlags};
use crate::config::ProcessorConfig;
use crate::constants::headers;
use crate::error::{ProcessorError, Result};
use crate::logging::{log_error, log_record_operation};
use crate::messaging::{
    AvroCodec, InboundRecord, MessagingError, MessagingResult, OutboundRecord, RecordConsumer,
    RecordProducer,
};
use crate::models::ItemOrderedCertifiedCopy;
use crate::processing::{CertifiedCopyProcessor, ProcessingError};

/// Counters shared by every worker
#[derive(Debug, Default)]
pub struct ChainConsumerStats {
    pub received: AtomicU64,
    pub processed: AtomicU64,
    pub retried: AtomicU64,
    pub dead_lettered: AtomicU64,
    pub invalid: AtomicU64,
    pub republish_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChainConsumerStatsSnapshot {
    pub received: u64,
    pub processed: u64,
    pub retried: u64,
    pub dead_lettered: u64,
    pub invalid: u64,
    pub republish_failures: u64,
}

impl ChainConsumerStats {
    pub fn snapshot(&self) -> ChainConsumerStatsSnapshot {
        ChainConsumerStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            republish_failures: self.republish_failures.load(Ordering::Relaxed),
        }
    }
}

/// What happened to one consumed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Processed,
    Retried { topic: String, attempt: u32 },
    DeadLettered { topic: String },
    Invalid { topic: String },
}

/// Handles one record end to end, short of committing it
pub struct ChainHandler {
    processor: Arc<CertifiedCopyProcessor>,
    codec: Arc<AvroCodec>,
    producer: Arc<dyn RecordProducer>,
    topology: ChainTopology,
    router: InvalidMessageRouter,
    backoff_delay: Duration,
    stats: Arc<ChainConsumerStats>,
}

impl std::fmt::Debug for ChainHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainHandler")
            .field("topology", &self.topology)
            .field("backoff_delay", &self.backoff_delay)
            .finish_non_exhaustive()
    }
}

impl ChainHandler {
    pub fn new(
        processor: Arc<CertifiedCopyProcessor>,
        codec: Arc<AvroCodec>,
        producer: Arc<dyn RecordProducer>,
        config: &ProcessorConfig,
    ) -> Self {
        let topology = ChainTopology::from_config(config);
        let router = InvalidMessageRouter::new(topology.invalid_topic());
        Self {
            processor,
            codec,
            producer,
            topology,
            router,
            backoff_delay: config.retry.backoff_delay,
            stats: Arc::new(ChainConsumerStats::default()),
        }
    }

    pub fn topology(&self) -> &ChainTopology {
        &self.topology
    }

    pub fn stats(&self) -> Arc<ChainConsumerStats> {
        Arc::clone(&self.stats)
    }

    /// Process one record, republishing it along the chain if processing fails.
    ///
    /// An error means the republish itself failed and the record must be
    /// redelivered.
    #[instrument(skip_all, fields(
        topic = %record.topic,
        partition = record.partition,
        offset = record.offset
    ))]
    pub async fn handle_record(&self, record: &InboundRecord) -> MessagingResult<RecordOutcome> {
        let state = match self.topology.state_of(&record.topic) {
            Some(state) if !state.is_terminal() => state,
            _ => {
                warn!("Record consumed from a topic outside the retry chain, handling as main");
                ChainState::Main
            }
        };

        let certified_copy = match self.decode(record) {
            Ok(certified_copy) => certified_copy,
            Err(e) => {
                warn!(error = %e, poison = e.is_poison(), "Unable to deserialise message");
                let failure = if e.is_poison() {
                    ProcessingError::non_retryable_caused_by("Unable to deserialise message", e)
                } else {
                    ProcessingError::retryable_caused_by("Unable to deserialise message", e)
                };
                return self.escalate(record, state, &failure).await;
            }
        };

        match self.processor.process(&certified_copy).await {
            Ok(_delivery) => {
                self.stats.processed.fetch_add(1, Ordering::Relaxed);
                Ok(RecordOutcome::Processed)
            }
            Err(failure) => {
                warn!(
                    state = %state,
                    kind = %failure.kind(),
                    error = %failure,
                    order = %certified_copy.log_context(),
                    "Processing failed"
                );
                self.escalate(record, state, &failure).await
            }
        }
    }

    fn decode(&self, record: &InboundRecord) -> MessagingResult<ItemOrderedCertifiedCopy> {
        let payload = record.payload.as_deref().ok_or_else(|| {
            MessagingError::empty_payload(&record.topic, record.partition, record.offset)
        })?;
        self.codec.decode_item_ordered_certified_copy(payload)
    }

    async fn escalate(
        &self,
        record: &InboundRecord,
        state: ChainState,
        failure: &ProcessingError,
    ) -> MessagingResult<RecordOutcome> {
        let mut flags = MessageFlags::new();
        flags.set_retryable(failure.is_retryable());

        let hop = next_hop(state, failure.kind(), self.topology.max_attempts())
            .unwrap_or(ChainState::Invalid);
        let outbound = self.router.route(self.republish_record(record, state, hop, failure), &mut flags);
        let destination = outbound.topic.clone();

        let receipt = self.producer.send(outbound).await?;
        log_record_operation(
            "republish",
            &receipt.topic,
            receipt.partition,
            receipt.offset,
            failure.kind().as_str(),
            Some(failure.message()),
        );

        let outcome = if destination == self.router.invalid_topic() {
            self.stats.invalid.fetch_add(1, Ordering::Relaxed);
            RecordOutcome::Invalid { topic: destination }
        } else if let ChainState::Retry(attempt) = hop {
            self.stats.retried.fetch_add(1, Ordering::Relaxed);
            RecordOutcome::Retried {
                topic: destination,
                attempt,
            }
        } else {
            self.stats.dead_lettered.fetch_add(1, Ordering::Relaxed);
            RecordOutcome::DeadLettered { topic: destination }
        };
        Ok(outcome)
    }

    fn republish_record(
        &self,
        record: &InboundRecord,
        state: ChainState,
        hop: ChainState,
        failure: &ProcessingError,
    ) -> OutboundRecord {
        let attempt = state.previous_attempts() + 1;
        let mut outbound = OutboundRecord::forward(record, self.topology.topic_for(hop))
            .with_header(headers::DELIVERY_ATTEMPT, attempt.to_string())
            .with_header(headers::FAILURE_KIND, failure.kind().as_str())
            .with_header(headers::FAILURE_MESSAGE, failure.message());

        if record.header(headers::ORIGINAL_TOPIC).is_none() {
            outbound = outbound
                .with_header(headers::ORIGINAL_TOPIC, record.topic.as_str())
                .with_header(headers::ORIGINAL_PARTITION, record.partition.to_string())
                .with_header(headers::ORIGINAL_OFFSET, record.offset.to_string());
        }

        if let ChainState::Retry(_) = hop {
            let due_at = Utc::now().timestamp_millis() + self.backoff_delay.as_millis() as i64;
            outbound.with_header(headers::BACKOFF_DUE_AT, due_at.to_string())
        } else {
            outbound
                .headers
                .retain(|(name, _)| name != headers::BACKOFF_DUE_AT);
            outbound
        }
    }
}

/// One listener instance
pub struct ChainWorker {
    worker_id: usize,
    consumer: Arc<dyn RecordConsumer>,
    handler: Arc<ChainHandler>,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
}

impl ChainWorker {
    pub fn new(
        worker_id: usize,
        consumer: Arc<dyn RecordConsumer>,
        handler: Arc<ChainHandler>,
        poll_timeout: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            worker_id,
            consumer,
            handler,
            poll_timeout,
            running,
        }
    }

    /// Receive and fully handle at most one record
    pub async fn poll_once(&self) -> MessagingResult<Option<RecordOutcome>> {
        let Some(record) = self.consumer.next_record(self.poll_timeout).await? else {
            return Ok(None);
        };
        self.handler.stats.received.fetch_add(1, Ordering::Relaxed);

        if !self.wait_until_due(&record).await {
            debug!(position = %record.position(), "Shutdown during backoff, rewinding");
            self.consumer.rewind(&record).await?;
            return Ok(None);
        }

        info!(
            worker_id = self.worker_id,
            topic = %record.topic,
            partition = record.partition,
            offset = record.offset,
            "Processing kafka message"
        );

        match self.handler.handle_record(&record).await {
            Ok(outcome) => {
                self.consumer.commit(&record).await?;
                info!(
                    worker_id = self.worker_id,
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    outcome = ?outcome,
                    "Processed kafka message"
                );
                Ok(Some(outcome))
            }
            Err(e) => {
                self.handler
                    .stats
                    .republish_failures
                    .fetch_add(1, Ordering::Relaxed);
                log_error(
                    "chain_worker",
                    "republish",
                    &e.to_string(),
                    Some(record.position().as_str()),
                );
                self.consumer.rewind(&record).await?;
                Err(e)
            }
        }
    }

    /// Sleep until the record's backoff has elapsed; false if stopped first
    async fn wait_until_due(&self, record: &InboundRecord) -> bool {
        let Some(due_at) = record.header_i64(headers::BACKOFF_DUE_AT) else {
            return true;
        };

        loop {
            let remaining = due_at - Utc::now().timestamp_millis();
            if remaining <= 0 {
                return true;
            }
            if !self.running.load(Ordering::SeqCst) {
                return false;
            }
            let wait = Duration::from_millis(remaining as u64).min(self.poll_timeout);
            tokio::time::sleep(wait).await;
        }
    }

    async fn run(self) {
        info!(worker_id = self.worker_id, "Chain worker started");
        while self.running.load(Ordering::SeqCst) {
            if let Err(e) = self.poll_once().await {
                warn!(worker_id = self.worker_id, error = %e, "Poll iteration failed");
                tokio::time::sleep(self.poll_timeout).await;
            }
        }
        info!(worker_id = self.worker_id, "Chain worker exited");
    }
}

/// Pool of [`ChainWorker`]s sharing one handler.
///
/// Each consumer handed to [`new`](Self::new) backs exactly one worker; a
/// stopped pool cannot be restarted.
pub struct ChainConsumer {
    handler: Arc<ChainHandler>,
    consumers: Mutex<Vec<Arc<dyn RecordConsumer>>>,
    poll_timeout: Duration,
    running: Arc<AtomicBool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ChainConsumer {
    pub fn new(
        handler: Arc<ChainHandler>,
        consumers: Vec<Arc<dyn RecordConsumer>>,
        poll_timeout: Duration,
    ) -> Result<Self> {
        if consumers.is_empty() {
            return Err(ProcessorError::configuration(
                "chain consumer needs at least one listener instance",
            ));
        }
        Ok(Self {
            handler,
            consumers: Mutex::new(consumers),
            poll_timeout,
            running: Arc::new(AtomicBool::new(false)),
            workers: Mutex::new(Vec::new()),
        })
    }

    #[instrument(skip(self))]
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ProcessorError::worker("chain consumer already running"));
        }

        let consumers = std::mem::take(&mut *self.consumers.lock());
        if consumers.is_empty() {
            self.running.store(false, Ordering::SeqCst);
            return Err(ProcessorError::worker("chain consumer cannot be restarted"));
        }

        info!(
            workers = consumers.len(),
            topics = ?self.handler.topology().consumed_topics(),
            "Starting chain consumer"
        );

        let mut workers = self.workers.lock();
        for (worker_id, consumer) in consumers.into_iter().enumerate() {
            let worker = ChainWorker::new(
                worker_id,
                consumer,
                Arc::clone(&self.handler),
                self.poll_timeout,
                Arc::clone(&self.running),
            );
            workers.push(tokio::spawn(worker.run()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn stop(&self) {
        info!("Stopping chain consumer");
        self.running.store(false, Ordering::SeqCst);

        let workers = std::mem::take(&mut *self.workers.lock());
        for result in join_all(workers).await {
            if let Err(e) = result {
                error!(error = %e, "Chain worker task failed");
            }
        }
        info!(stats = ?self.stats(), "Chain consumer stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> ChainConsumerStatsSnapshot {
        self.handler.stats.snapshot()
    }
}
