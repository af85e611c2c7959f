//! Filing history API client.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use super::FilingHistoryDocumentService;
use crate::config::ApiConfig;
use crate::error::{ProcessorError, Result};
use crate::logging::log_upstream_operation;
use crate::processing::{FailureKind, ProcessingError, ProcessingResult};

const SERVICE: &str = "filing_history_api";

#[derive(Debug, Deserialize)]
struct FilingHistoryResponse {
    links: Option<FilingHistoryLinks>,
}

#[derive(Debug, Deserialize)]
struct FilingHistoryLinks {
    document_metadata: Option<String>,
}

/// Client for `GET /company/{company_number}/filing-history/{filing_history_id}`
#[derive(Debug, Clone)]
pub struct FilingHistoryApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl FilingHistoryApiClient {
    pub fn new(http: reqwest::Client, api: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&api.api_url).map_err(|e| {
            ProcessorError::configuration(format!("invalid API_URL {}: {e}", api.api_url))
        })?;
        Ok(Self {
            http,
            base_url,
            api_key: api.api_key.clone(),
        })
    }

    fn filing_url(&self, company_number: &str, filing_history_id: &str) -> ProcessingResult<Url> {
        if company_number.trim().is_empty() || filing_history_id.trim().is_empty() {
            return Err(ProcessingError::non_retryable(format!(
                "Invalid URI for filing: company number '{company_number}', filing history id '{filing_history_id}'"
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProcessingError::non_retryable(format!(
                    "Invalid URI {} for filing",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["company", company_number, "filing-history", filing_history_id]);
        Ok(url)
    }
}

/// How a non-success status from the filing history API is treated.
///
/// A 404 means the filing does not exist and never will. 408 and 429 say
/// nothing about the filing itself, so they cannot be ruled out as transient.
pub fn classify_status(status: StatusCode) -> FailureKind {
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        FailureKind::Retryable
    } else {
        FailureKind::NonRetryable
    }
}

#[async_trait]
impl FilingHistoryDocumentService for FilingHistoryApiClient {
    async fn get_document_metadata(
        &self,
        company_number: &str,
        filing_history_id: &str,
    ) -> ProcessingResult<String> {
        info!(
            company_number = %company_number,
            filing_history_id = %filing_history_id,
            "Getting filing history document {} for company number {}.",
            filing_history_id,
            company_number
        );
        let url = self.filing_url(company_number, filing_history_id)?;

        let response = self
            .http
            .get(url.clone())
            .basic_auth(&self.api_key, None::<&str>)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, error = %e, "Error sending request to filing history API");
                ProcessingError::retryable_caused_by(format!("Error sending request to {url}"), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let kind = classify_status(status);
            log_upstream_operation(
                SERVICE,
                "get_document_metadata",
                kind.as_str(),
                Some(status.as_u16()),
                Some(url.as_str()),
            );
            let message = format!(
                "Error getting filing history document {filing_history_id} for company number {company_number}: HTTP {status}"
            );
            return Err(match kind {
                FailureKind::Retryable => ProcessingError::retryable(message),
                FailureKind::NonRetryable => ProcessingError::non_retryable(message),
            });
        }

        let body: FilingHistoryResponse = response.json().await.map_err(|e| {
            ProcessingError::non_retryable_caused_by(
                format!("Unreadable filing history response from {url}"),
                e,
            )
        })?;

        let metadata = body
            .links
            .and_then(|links| links.document_metadata)
            .filter(|metadata| !metadata.trim().is_empty())
            .ok_or_else(|| {
                ProcessingError::non_retryable(format!(
                    "Filing history {filing_history_id} for company number {company_number} has no document metadata link"
                ))
            })?;

        log_upstream_operation(
            SERVICE,
            "get_document_metadata",
            "ok",
            Some(status.as_u16()),
            Some(&metadata),
        );
        info!(document_metadata = %metadata, "Got document metadata {}.", metadata);
        Ok(metadata)
    }
}
