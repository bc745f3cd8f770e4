// ==============================================================================
// fetcher/exac.rs - ExAC Bulk Variant Client
// ==============================================================================
// Description: HTTP client for the ExAC browser /rest/bulk/variant endpoint
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// References:
// - ExAC browser REST API: http://exac.hms.harvard.edu/
// ==============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::types::{bulk_payload, BulkResponse};
use super::{AnnotationSource, FetchError};

pub const DEFAULT_ENDPOINT: &str = "http://exac.hms.harvard.edu/rest/bulk/variant";

/// Client for the ExAC bulk variant endpoint
#[derive(Debug, Clone)]
pub struct ExacClient {
    client: Client,
    endpoint: String,
}

impl ExacClient {
    /// Create a client posting to `endpoint` with a per-request timeout
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnnotationSource for ExacClient {
    async fn fetch_batch(&self, tokens: &[String]) -> Result<BulkResponse, FetchError> {
        let payload = bulk_payload(tokens)?;
        debug!("POST {} ({} bytes)", self.endpoint, payload.len());

        let response = self.client.post(&self.endpoint).body(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let annotations: BulkResponse = serde_json::from_slice(&body)?;

        debug!("Received {} annotations", annotations.len());
        Ok(annotations)
    }
}
