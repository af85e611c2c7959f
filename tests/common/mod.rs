#![allow(dead_code)]

pub mod strategies;

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use certified_copy_processor::config::{
    ApiConfig, KafkaConfig, ProcessorConfig, RetryConfig, TopicConfig,
};
use certified_copy_processor::messaging::{
    AvroCodec, InMemoryBroker, InboundRecord, RecordConsumer, RecordProducer,
};
use certified_copy_processor::processing::{CertifiedCopyProcessor, SignDocumentPublisher};
use certified_copy_processor::retry::{ChainHandler, ChainWorker, RecordOutcome};
use certified_copy_processor::services::{
    build_http_client, DocumentApiClient, FilingHistoryApiClient, FilingHistoryDescriptions,
};
use certified_copy_processor::{ItemOrderedCertifiedCopy, SignDigitalDocument};

pub use mockito::{Matcher, Server, ServerGuard};

pub const ORDER_NUMBER: &str = "ORD-422426-522214";
pub const ITEM_ID: &str = "CCD-182317-112340";
pub const GROUP_ITEM: &str = "/item-groups/IG-004747-123485/items/CCD-341238-223457";
pub const COMPANY_NAME: &str = "Very Profitable Company Limited";
pub const COMPANY_NUMBER: &str = "00006400";
pub const FILING_HISTORY_ID: &str = "OTKyMYM3EgbyOPTweXFr41C4";
pub const FILING_HISTORY_TYPE: &str = "AP01";
pub const FILING_HISTORY_DESCRIPTION: &str = "appoint-person-director-company-with-name-date";
pub const FILING_HISTORY_DESCRIPTION_TEXT: &str =
    "**Appointment** of {officer_name} as a director on {appointment_date}";
pub const DOCUMENT_METADATA: &str = "/document/-fsWaC-ED30jRNACt2dqNYc-lH2uODjjLhliYjryjV0";
pub const PUBLIC_URI: &str = "https://document-api-images-cidev.s3.eu-west-2.amazonaws.com/docs/-fsWaC-ED30jRNACt2dqNYc-lH2uODjjLhliYjryjV0/application-pdf?X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Date=20230703T093800Z&X-Amz-Expires=60&X-Amz-SignedHeaders=host&X-Amz-Signature=6e6c9f1b";
pub const PRIVATE_URI: &str =
    "s3://document-api-images-cidev/docs/-fsWaC-ED30jRNACt2dqNYc-lH2uODjjLhliYjryjV0/application-pdf";
pub const API_KEY: &str = "secret";
/// `Basic base64("secret:")`
pub const BASIC_AUTH_HEADER: &str = "Basic c2VjcmV0Og==";

pub const MAIN_TOPIC: &str = "item-ordered-certified-copy";
pub const SIGN_TOPIC: &str = "sign-digital-document";
pub const INVALID_TOPIC: &str = "item-ordered-certified-copy-certified-copy-processor-invalid";
pub const DEAD_LETTER_TOPIC: &str = "item-ordered-certified-copy-error";

pub fn filing_history_path() -> String {
    format!("/company/{COMPANY_NUMBER}/filing-history/{FILING_HISTORY_ID}")
}

pub fn document_content_path() -> String {
    format!("{DOCUMENT_METADATA}/content")
}

pub fn retry_topic(attempt: u32) -> String {
    format!("{MAIN_TOPIC}-retry-{attempt}")
}

pub fn certified_copy() -> ItemOrderedCertifiedCopy {
    ItemOrderedCertifiedCopy {
        order_number: ORDER_NUMBER.to_string(),
        item_id: ITEM_ID.to_string(),
        group_item: GROUP_ITEM.to_string(),
        company_name: COMPANY_NAME.to_string(),
        company_number: COMPANY_NUMBER.to_string(),
        filing_history_id: FILING_HISTORY_ID.to_string(),
        filing_history_type: FILING_HISTORY_TYPE.to_string(),
        filing_history_description: FILING_HISTORY_DESCRIPTION.to_string(),
        filing_history_description_values: BTreeMap::from([
            ("appointment_date".to_string(), "2022-01-01".to_string()),
            ("officer_name".to_string(), "Mr Clean".to_string()),
        ]),
    }
}

pub fn descriptions() -> FilingHistoryDescriptions {
    FilingHistoryDescriptions::from_map(HashMap::from([(
        FILING_HISTORY_DESCRIPTION.to_string(),
        FILING_HISTORY_DESCRIPTION_TEXT.to_string(),
    )]))
}

pub fn test_config(api_url: &str, document_api_url: &str, max_attempts: u32) -> ProcessorConfig {
    ProcessorConfig {
        kafka: KafkaConfig {
            bootstrap_servers: "localhost:9092".to_string(),
            group_id: "certified-copy-processor".to_string(),
            concurrency: 1,
            poll_timeout: Duration::from_millis(50),
        },
        topics: TopicConfig {
            item_ordered_certified_copy: MAIN_TOPIC.to_string(),
            sign_digital_document: SIGN_TOPIC.to_string(),
            invalid_item_ordered_certified_copy: INVALID_TOPIC.to_string(),
        },
        retry: RetryConfig {
            max_attempts,
            backoff_delay: Duration::from_millis(10),
        },
        api: ApiConfig {
            api_url: api_url.to_string(),
            document_api_url: document_api_url.to_string(),
            api_key: API_KEY.to_string(),
            request_timeout: Duration::from_secs(5),
        },
        filing_history_descriptions_path: PathBuf::from(
            "api-enumerations/filing_history_descriptions.yml",
        ),
    }
}

pub fn api_config(api_url: &str, document_api_url: &str) -> ApiConfig {
    test_config(api_url, document_api_url, 0).api
}

/// Filing history mock answering with the test document metadata
pub async fn mock_filing_history_ok(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", filing_history_path().as_str())
        .match_header("authorization", BASIC_AUTH_HEADER)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "transaction_id": FILING_HISTORY_ID,
                "type": FILING_HISTORY_TYPE,
                "links": { "document_metadata": DOCUMENT_METADATA }
            })
            .to_string(),
        )
        .create_async()
        .await
}

/// Document API mock redirecting to the test public URI
pub async fn mock_document_redirect(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("GET", document_content_path().as_str())
        .match_header("authorization", BASIC_AUTH_HEADER)
        .match_header("accept", "application/pdf")
        .with_status(302)
        .with_header("location", PUBLIC_URI)
        .create_async()
        .await
}

/// Single-worker pipeline over an in-memory broker, driven one record at a time
pub struct Harness {
    pub broker: InMemoryBroker,
    pub codec: Arc<AvroCodec>,
    pub config: ProcessorConfig,
    pub handler: Arc<ChainHandler>,
    pub worker: ChainWorker,
}

impl Harness {
    pub fn new(config: ProcessorConfig) -> Self {
        let broker = InMemoryBroker::new();
        let codec = Arc::new(AvroCodec::new().expect("schemas parse"));
        let producer: Arc<dyn RecordProducer> = Arc::new(broker.clone());

        let http = build_http_client(&config.api).expect("http client");
        let processor = Arc::new(CertifiedCopyProcessor::new(
            Arc::new(FilingHistoryApiClient::new(http.clone(), &config.api).expect("client")),
            Arc::new(DocumentApiClient::new(http, &config.api)),
            Arc::new(descriptions()),
            SignDocumentPublisher::new(
                Arc::clone(&producer),
                Arc::clone(&codec),
                config.topics.sign_digital_document.clone(),
            ),
        ));
        let handler = Arc::new(ChainHandler::new(
            processor,
            Arc::clone(&codec),
            producer,
            &config,
        ));

        let consumer: Arc<dyn RecordConsumer> = Arc::new(
            broker.consumer(config.topics.consumed_topics(config.retry.max_attempts)),
        );
        let worker = ChainWorker::new(
            0,
            consumer,
            Arc::clone(&handler),
            config.kafka.poll_timeout,
            Arc::new(AtomicBool::new(true)),
        );

        Self {
            broker,
            codec,
            config,
            handler,
            worker,
        }
    }

    /// Put an encoded order event on the main topic
    pub fn publish_order(&self, event: &ItemOrderedCertifiedCopy) -> i64 {
        let payload = self
            .codec
            .encode_item_ordered_certified_copy(event)
            .expect("encode order");
        self.broker.inject(
            MAIN_TOPIC,
            Some(event.order_number.clone()),
            Some(payload),
        )
    }

    /// Handle records until the subscribed topics are drained
    pub async fn drain(&self) -> Vec<RecordOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.worker.poll_once().await.expect("poll") {
            outcomes.push(outcome);
        }
        outcomes
    }

    pub fn records(&self, topic: &str) -> Vec<InboundRecord> {
        self.broker.records(topic)
    }

    /// Decoded sign requests, waiting briefly for fire-and-forget deliveries
    pub async fn sign_requests(&self, expected: usize) -> Vec<SignDigitalDocument> {
        for _ in 0..100 {
            if self.broker.records(SIGN_TOPIC).len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.broker
            .records(SIGN_TOPIC)
            .iter()
            .map(|record| {
                self.codec
                    .decode_sign_digital_document(record.payload.as_deref().unwrap_or_default())
                    .expect("decode sign request")
            })
            .collect()
    }
}

pub fn header<'a>(record: &'a InboundRecord, name: &str) -> Option<&'a str> {
    record.header_str(name)
}
