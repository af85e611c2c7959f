//! The per-message unit of work.
//!
//! Resolve the document metadata, resolve the public URI, rewrite it to a
//! private URI, look up the description, then build and publish the sign
//! request. Any failure in the first three steps is classified and returned
//! before anything is published.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use super::sign_document::{DeliveryTask, SignDigitalDocumentFactory, SignDocumentPublisher};
use super::ProcessingResult;
use crate::models::{ItemOrderedCertifiedCopy, SignDigitalDocument};
use crate::services::{
    DocumentLocationService, FilingHistoryDescriptions, FilingHistoryDocumentService,
    PublicToPrivateUriConverter,
};

pub struct CertifiedCopyProcessor {
    filing_history: Arc<dyn FilingHistoryDocumentService>,
    documents: Arc<dyn DocumentLocationService>,
    converter: PublicToPrivateUriConverter,
    descriptions: Arc<FilingHistoryDescriptions>,
    publisher: SignDocumentPublisher,
}

impl std::fmt::Debug for CertifiedCopyProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertifiedCopyProcessor")
            .field("publisher", &self.publisher)
            .field("descriptions", &self.descriptions.len())
            .finish_non_exhaustive()
    }
}

impl CertifiedCopyProcessor {
    pub fn new(
        filing_history: Arc<dyn FilingHistoryDocumentService>,
        documents: Arc<dyn DocumentLocationService>,
        descriptions: Arc<FilingHistoryDescriptions>,
        publisher: SignDocumentPublisher,
    ) -> Self {
        Self {
            filing_history,
            documents,
            converter: PublicToPrivateUriConverter::new(),
            descriptions,
            publisher,
        }
    }

    /// Resolve everything needed for the sign request without publishing it
    #[instrument(skip_all, fields(
        order_number = %certified_copy.order_number,
        item_id = %certified_copy.item_id,
        company_number = %certified_copy.company_number
    ))]
    pub async fn prepare(
        &self,
        certified_copy: &ItemOrderedCertifiedCopy,
    ) -> ProcessingResult<SignDigitalDocument> {
        let document_metadata = self
            .filing_history
            .get_document_metadata(
                &certified_copy.company_number,
                &certified_copy.filing_history_id,
            )
            .await?;

        let public_uri = self.documents.get_public_uri(&document_metadata).await?;
        let private_uri = self.converter.convert_to_private_uri(&public_uri)?;
        debug!(private_uri = %private_uri, "Rewrote public document URI");

        let description = self
            .descriptions
            .lookup(&certified_copy.filing_history_description);
        if description.is_empty() {
            debug!(
                code = %certified_copy.filing_history_description,
                "No display text for filing history description"
            );
        }

        Ok(SignDigitalDocumentFactory::build(
            certified_copy,
            &private_uri,
            description,
        ))
    }

    /// Process one order event and publish its sign request
    pub async fn process(
        &self,
        certified_copy: &ItemOrderedCertifiedCopy,
    ) -> ProcessingResult<DeliveryTask> {
        let request = self.prepare(certified_copy).await?;
        let delivery = self.publisher.publish(&request)?;
        info!(
            order_number = %request.order_number,
            item_id = %request.item_id,
            topic = %self.publisher.topic(),
            "Sign digital document request handed to producer"
        );
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{AvroCodec, InMemoryBroker};
    use crate::processing::{FailureKind, ProcessingError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{BTreeMap, HashMap};
    use url::Url;

    const DOCUMENT_METADATA: &str = "/document/-fsWaC-ED30jRNACt2dqNYc-lH2uODjjLhliYjryjV0";
    const PUBLIC_URI: &str = "https://document-api-images-cidev.s3.eu-west-2.amazonaws.com/docs/-fsWaC-ED30jRNACt2dqNYc-lH2uODjjLhliYjryjV0/application-pdf?X-Amz-Algorithm=AWS4-HMAC-SHA256";

    struct StubFilingHistory {
        result: Mutex<Option<ProcessingError>>,
    }

    #[async_trait]
    impl FilingHistoryDocumentService for StubFilingHistory {
        async fn get_document_metadata(&self, _: &str, _: &str) -> ProcessingResult<String> {
            match self.result.lock().take() {
                Some(err) => Err(err),
                None => Ok(DOCUMENT_METADATA.to_string()),
            }
        }
    }

    struct StubDocuments {
        location: &'static str,
    }

    #[async_trait]
    impl DocumentLocationService for StubDocuments {
        async fn get_public_uri(&self, metadata: &str) -> ProcessingResult<Url> {
            assert_eq!(metadata, DOCUMENT_METADATA);
            Url::parse(self.location)
                .map_err(|e| ProcessingError::non_retryable_caused_by("bad location", e))
        }
    }

    fn certified_copy() -> ItemOrderedCertifiedCopy {
        ItemOrderedCertifiedCopy {
            order_number: "ORD-422426-522214".to_string(),
            item_id: "CCD-182317-112340".to_string(),
            group_item: "/item-groups/IG-004747-123485/items/CCD-341238-223457".to_string(),
            company_name: "Very Profitable Company Limited".to_string(),
            company_number: "00006400".to_string(),
            filing_history_id: "OTKyMYM3EgbyOPTweXFr41C4".to_string(),
            filing_history_type: "AP01".to_string(),
            filing_history_description: "appoint-person-director-company-with-name-date"
                .to_string(),
            filing_history_description_values: BTreeMap::new(),
        }
    }

    fn processor(
        broker: &InMemoryBroker,
        failure: Option<ProcessingError>,
        location: &'static str,
    ) -> CertifiedCopyProcessor {
        let descriptions = FilingHistoryDescriptions::from_map(HashMap::from([(
            "appoint-person-director-company-with-name-date".to_string(),
            "**Appointment** of {officer_name} as a director on {appointment_date}".to_string(),
        )]));
        CertifiedCopyProcessor::new(
            Arc::new(StubFilingHistory {
                result: Mutex::new(failure),
            }),
            Arc::new(StubDocuments { location }),
            Arc::new(descriptions),
            SignDocumentPublisher::new(
                Arc::new(broker.clone()),
                Arc::new(AvroCodec::new().expect("codec")),
                "sign-digital-document".to_string(),
            ),
        )
    }

    #[tokio::test]
    async fn test_prepare_resolves_private_uri_and_description() {
        let broker = InMemoryBroker::new();
        let request = processor(&broker, None, PUBLIC_URI)
            .prepare(&certified_copy())
            .await
            .expect("prepared");

        assert_eq!(
            request.private_s3_location,
            "s3://document-api-images-cidev/docs/-fsWaC-ED30jRNACt2dqNYc-lH2uODjjLhliYjryjV0/application-pdf"
        );
        assert_eq!(
            request.cover_sheet_data.description,
            "**Appointment** of {officer_name} as a director on {appointment_date}"
        );
    }

    #[tokio::test]
    async fn test_process_publishes_once() {
        let broker = InMemoryBroker::new();
        processor(&broker, None, PUBLIC_URI)
            .process(&certified_copy())
            .await
            .expect("processed")
            .await
            .expect("delivered");

        assert_eq!(broker.records("sign-digital-document").len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_propagated_without_publish() {
        let broker = InMemoryBroker::new();
        let err = processor(
            &broker,
            Some(ProcessingError::retryable("filing history API returned 503")),
            PUBLIC_URI,
        )
        .process(&certified_copy())
        .await
        .expect_err("failure propagated");

        assert_eq!(err.kind(), FailureKind::Retryable);
        assert!(broker.records("sign-digital-document").is_empty());
    }

    #[tokio::test]
    async fn test_unrecognised_public_uri_is_non_retryable() {
        let broker = InMemoryBroker::new();
        let err = processor(&broker, None, "https://example.com/docs/abc/application-pdf")
            .process(&certified_copy())
            .await
            .expect_err("rejected");

        assert_eq!(err.kind(), FailureKind::NonRetryable);
        assert!(broker.records("sign-digital-document").is_empty());
    }
}
