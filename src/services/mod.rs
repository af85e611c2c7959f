//! # Upstream Services
//!
//! Collaborators the processing handler calls for each order: the filing
//! history API, the document API, the public to private URI rewrite, and the
//! description table. Every fallible call reports a classified
//! [`ProcessingError`](crate::processing::ProcessingError).

pub mod document_client;
pub mod filing_history_client;
pub mod filing_history_descriptions;
pub mod uri_converter;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use url::Url;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::processing::ProcessingResult;

pub use document_client::DocumentApiClient;
pub use filing_history_client::FilingHistoryApiClient;
pub use filing_history_descriptions::FilingHistoryDescriptions;
pub use uri_converter::PublicToPrivateUriConverter;

/// Resolves a filing to its document metadata reference
#[async_trait]
pub trait FilingHistoryDocumentService: Send + Sync + 'static {
    /// Metadata path (e.g. `/document/<id>`) of the filing's document
    async fn get_document_metadata(
        &self,
        company_number: &str,
        filing_history_id: &str,
    ) -> ProcessingResult<String>;
}

/// Resolves a document metadata reference to a short-lived public URI
#[async_trait]
pub trait DocumentLocationService: Send + Sync + 'static {
    async fn get_public_uri(&self, document_metadata: &str) -> ProcessingResult<Url>;
}

/// HTTP client shared by both API clients.
///
/// Redirects are not followed: the document API answers with a 302 whose
/// `Location` is the value we need.
pub fn build_http_client(api: &ApiConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .redirect(Policy::none())
        .timeout(api.request_timeout)
        .build()?;
    Ok(client)
}
