//! # In-Memory Broker
//!
//! Single-process stand-in for a Kafka cluster, used by tests and local runs.
//!
//! Every topic is one partition (partition 0). All consumers created from the
//! same broker form one consumer group. Each topic is assigned to exactly one
//! subscribed member, round-robin in subscription order, and the assignment is
//! recomputed whenever a member joins; a member whose topics all went to
//! others stays idle. A reassigned topic resumes from its committed offset.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::messaging::errors::{MessagingError, MessagingResult};
use crate::messaging::message::{DeliveryReceipt, InboundRecord, OutboundRecord};
use crate::messaging::service::traits::{RecordConsumer, RecordProducer};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct BrokerState {
    topics: HashMap<String, Vec<InboundRecord>>,
    positions: HashMap<String, i64>,
    committed: HashMap<String, i64>,
    failing_topics: HashSet<String>,
    members: Vec<Vec<String>>,
    owners: HashMap<String, usize>,
}

impl BrokerState {
    fn rebalance(&mut self) {
        let mut topics: Vec<&String> = Vec::new();
        for subscription in &self.members {
            for topic in subscription {
                if !topics.contains(&topic) {
                    topics.push(topic);
                }
            }
        }

        let mut owners = HashMap::new();
        for (index, topic) in topics.into_iter().enumerate() {
            let candidates: Vec<usize> = self
                .members
                .iter()
                .enumerate()
                .filter(|(_, subscription)| subscription.contains(topic))
                .map(|(member, _)| member)
                .collect();
            owners.insert(topic.clone(), candidates[index % candidates.len()]);
        }

        for (topic, owner) in &owners {
            if self.owners.get(topic) != Some(owner) {
                let committed = self.committed.get(topic).copied().unwrap_or(0);
                self.positions.insert(topic.clone(), committed);
            }
        }
        self.owners = owners;
    }
}

/// In-memory broker; clones share the same topics
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the group with a member subscribed to `topics`, polled in the given order
    pub fn consumer(&self, topics: Vec<String>) -> InMemoryConsumer {
        let mut state = self.state.lock();
        let member = state.members.len();
        state.members.push(topics.clone());
        state.rebalance();

        InMemoryConsumer {
            broker: self.clone(),
            member,
            topics,
        }
    }

    /// Topics currently assigned to the member created `member`-th
    pub fn assignment(&self, member: usize) -> Vec<String> {
        let state = self.state.lock();
        let mut topics: Vec<String> = state
            .owners
            .iter()
            .filter(|(_, owner)| **owner == member)
            .map(|(topic, _)| topic.clone())
            .collect();
        topics.sort();
        topics
    }

    /// All records ever published to `topic`, in offset order
    pub fn records(&self, topic: &str) -> Vec<InboundRecord> {
        self.state
            .lock()
            .topics
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    /// Offset the group will resume `topic` from, if anything was committed
    pub fn committed_offset(&self, topic: &str) -> Option<i64> {
        self.state.lock().committed.get(topic).copied()
    }

    /// Reject every subsequent send to `topic` until [`restore_topic`](Self::restore_topic)
    pub fn fail_sends_to(&self, topic: impl Into<String>) {
        self.state.lock().failing_topics.insert(topic.into());
    }

    pub fn restore_topic(&self, topic: &str) {
        self.state.lock().failing_topics.remove(topic);
    }

    fn append(&self, record: OutboundRecord) -> MessagingResult<DeliveryReceipt> {
        let mut state = self.state.lock();
        if state.failing_topics.contains(&record.topic) {
            return Err(MessagingError::producer(
                &record.topic,
                "topic unavailable",
            ));
        }

        let log = state.topics.entry(record.topic.clone()).or_default();
        let offset = log.len() as i64;
        log.push(InboundRecord {
            topic: record.topic.clone(),
            partition: 0,
            offset,
            key: record.key,
            payload: Some(record.payload),
            headers: record.headers,
        });

        Ok(DeliveryReceipt {
            topic: record.topic,
            partition: 0,
            offset,
        })
    }

    /// Append a raw record, e.g. one whose payload is absent
    pub fn inject(&self, topic: &str, key: Option<String>, payload: Option<Vec<u8>>) -> i64 {
        let mut state = self.state.lock();
        let log = state.topics.entry(topic.to_string()).or_default();
        let offset = log.len() as i64;
        log.push(InboundRecord {
            topic: topic.to_string(),
            partition: 0,
            offset,
            key,
            payload,
            headers: Vec::new(),
        });
        offset
    }

    fn take_next(&self, member: usize, topics: &[String]) -> Option<InboundRecord> {
        let mut state = self.state.lock();
        for topic in topics {
            if state.owners.get(topic) != Some(&member) {
                continue;
            }
            let position = state.positions.get(topic).copied().unwrap_or(0);
            let next = state
                .topics
                .get(topic)
                .and_then(|log| log.get(position as usize))
                .cloned();
            if let Some(record) = next {
                state.positions.insert(topic.clone(), position + 1);
                return Some(record);
            }
        }
        None
    }
}

#[async_trait]
impl RecordProducer for InMemoryBroker {
    async fn send(&self, record: OutboundRecord) -> MessagingResult<DeliveryReceipt> {
        self.append(record)
    }
}

/// Group member returned by [`InMemoryBroker::consumer`]
#[derive(Debug, Clone)]
pub struct InMemoryConsumer {
    broker: InMemoryBroker,
    member: usize,
    topics: Vec<String>,
}

#[async_trait]
impl RecordConsumer for InMemoryConsumer {
    async fn next_record(&self, timeout: Duration) -> MessagingResult<Option<InboundRecord>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(record) = self.broker.take_next(self.member, &self.topics) {
                return Ok(Some(record));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn commit(&self, record: &InboundRecord) -> MessagingResult<()> {
        let mut state = self.broker.state.lock();
        if state.owners.get(&record.topic) != Some(&self.member) {
            return Err(MessagingError::commit(
                &record.topic,
                record.partition,
                record.offset,
                "partition not assigned to this member",
            ));
        }
        state.committed.insert(record.topic.clone(), record.offset + 1);
        Ok(())
    }

    async fn rewind(&self, record: &InboundRecord) -> MessagingResult<()> {
        let mut state = self.broker.state.lock();
        let position = state.positions.entry(record.topic.clone()).or_insert(0);
        *position = (*position).min(record.offset);
        Ok(())
    }
}
