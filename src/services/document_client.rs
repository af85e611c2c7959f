//! Document API client.
//!
//! `GET {document_api}{metadata}/content` answers with a redirect (normally
//! `302 Found`) whose `Location` header is the short-lived public URI of the
//! PDF.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, LOCATION};
use reqwest::StatusCode;
use tracing::{error, info};
use url::Url;

use super::DocumentLocationService;
use crate::config::ApiConfig;
use crate::logging::log_upstream_operation;
use crate::processing::{ProcessingError, ProcessingResult};

const SERVICE: &str = "document_api";
const APPLICATION_PDF: &str = "application/pdf";

#[derive(Debug, Clone)]
pub struct DocumentApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DocumentApiClient {
    pub fn new(http: reqwest::Client, api: &ApiConfig) -> Self {
        Self {
            http,
            base_url: api.document_api_url.trim_end_matches('/').to_string(),
            api_key: api.api_key.clone(),
        }
    }

    fn content_url(&self, document_metadata: &str) -> ProcessingResult<Url> {
        let metadata = document_metadata.trim_matches('/');
        if metadata.is_empty() {
            return Err(ProcessingError::non_retryable(
                "Document metadata reference is empty",
            ));
        }
        let raw = format!("{}/{metadata}/content", self.base_url);
        Url::parse(&raw).map_err(|e| {
            ProcessingError::non_retryable_caused_by(format!("Invalid document content URI {raw}"), e)
        })
    }
}

#[async_trait]
impl DocumentLocationService for DocumentApiClient {
    async fn get_public_uri(&self, document_metadata: &str) -> ProcessingResult<Url> {
        let url = self.content_url(document_metadata)?;

        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.api_key, None::<&str>)
            .header(ACCEPT, APPLICATION_PDF)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Error sending request to document API");
                ProcessingError::retryable_caused_by(format!("Error sending request to {url}"), e)
            })?;

        let status = response.status();
        if !status.is_redirection() || status == StatusCode::NOT_MODIFIED {
            log_upstream_operation(
                SERVICE,
                "get_public_uri",
                "retryable",
                Some(status.as_u16()),
                Some(url.as_str()),
            );
            return Err(ProcessingError::retryable(format!(
                "Document API returned HTTP {status} for {url}, expected a redirect"
            )));
        }

        let location = response
            .headers()
            .get(LOCATION)
            .ok_or_else(|| {
                ProcessingError::non_retryable(format!(
                    "Document API redirect for {document_metadata} has no Location header"
                ))
            })?
            .to_str()
            .map_err(|e| {
                ProcessingError::non_retryable_caused_by(
                    format!("Location header for {document_metadata} is not valid text"),
                    e,
                )
            })?;

        let public_uri = Url::parse(location).map_err(|e| {
            error!(location = %location, error = %e, "Location header is not a URI");
            ProcessingError::non_retryable_caused_by(
                format!("Location header '{location}' for {document_metadata} is not a valid URI"),
                e,
            )
        })?;

        log_upstream_operation(
            SERVICE,
            "get_public_uri",
            "ok",
            Some(status.as_u16()),
            Some(document_metadata),
        );
        info!(document_metadata = %document_metadata, "Resolved public document URI");
        Ok(public_uri)
    }
}
