//! Outbound sign request construction and publication.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};
use url::Url;

use crate::constants::CERTIFIED_COPY_DOCUMENT_TYPE;
use crate::messaging::{AvroCodec, OutboundRecord, RecordProducer};
use crate::models::{CoverSheetData, ItemOrderedCertifiedCopy, SignDigitalDocument};
use crate::processing::{ProcessingError, ProcessingResult};

/// Background task reporting the delivery outcome of one sign request
pub type DeliveryTask = JoinHandle<()>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SignDigitalDocumentFactory;

impl SignDigitalDocumentFactory {
    pub fn build(
        certified_copy: &ItemOrderedCertifiedCopy,
        private_uri: &Url,
        filing_history_description: String,
    ) -> SignDigitalDocument {
        SignDigitalDocument {
            order_number: certified_copy.order_number.clone(),
            item_id: certified_copy.item_id.clone(),
            group_item: certified_copy.group_item.clone(),
            document_type: CERTIFIED_COPY_DOCUMENT_TYPE.to_string(),
            private_s3_location: private_uri.to_string(),
            filing_history_description_values: certified_copy
                .filing_history_description_values
                .clone(),
            cover_sheet_data: CoverSheetData {
                company_name: certified_copy.company_name.clone(),
                company_number: certified_copy.company_number.clone(),
                description: filing_history_description,
                filing_type: certified_copy.filing_history_type.clone(),
            },
        }
    }
}

/// Publishes sign requests to the sign digital document topic.
///
/// Publication is fire-and-forget: the delivery result is logged from a
/// spawned task and never fed back into retry decisions.
#[derive(Clone)]
pub struct SignDocumentPublisher {
    producer: Arc<dyn RecordProducer>,
    codec: Arc<AvroCodec>,
    topic: String,
}

impl std::fmt::Debug for SignDocumentPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignDocumentPublisher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl SignDocumentPublisher {
    pub fn new(producer: Arc<dyn RecordProducer>, codec: Arc<AvroCodec>, topic: String) -> Self {
        Self {
            producer,
            codec,
            topic,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn publish(&self, request: &SignDigitalDocument) -> ProcessingResult<DeliveryTask> {
        let payload = self
            .codec
            .encode_sign_digital_document(request)
            .map_err(|e| {
                ProcessingError::non_retryable_caused_by(
                    format!(
                        "Unable to encode sign request for item {} of order {}",
                        request.item_id, request.order_number
                    ),
                    e,
                )
            })?;

        info!(
            item_id = %request.item_id,
            order_number = %request.order_number,
            "Sending a message for certified copy ID {} from order {}.",
            request.item_id,
            request.order_number
        );

        let record = OutboundRecord::new(self.topic.clone(), None, payload);
        let producer = Arc::clone(&self.producer);
        let group_item = request.group_item.clone();
        let order_number = request.order_number.clone();

        Ok(tokio::spawn(async move {
            match producer.send(record).await {
                Ok(receipt) => info!(
                    group_item = %group_item,
                    order_number = %order_number,
                    topic = %receipt.topic,
                    partition = receipt.partition,
                    offset = receipt.offset,
                    "Message delivered to topic {} on partition {} with offset {}.",
                    receipt.topic,
                    receipt.partition,
                    receipt.offset
                ),
                Err(e) => error!(
                    order_number = %order_number,
                    error = %e,
                    "Unable to deliver sign request for order {}. Error: {}.",
                    order_number,
                    e
                ),
            }
        }))
    }
}
