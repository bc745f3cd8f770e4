// ==============================================================================
// config.rs - Annotator Configuration
// ==============================================================================
// Description: Run settings for the annotation service and depth lookup
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::time::Duration;
use thiserror::Error;

use crate::depth::DepthLookup;
use crate::fetcher::exac::DEFAULT_ENDPOINT;
use crate::fetcher::MAX_BATCH_SIZE;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid batch size {0} (must be 1-400)")]
    InvalidBatchSize(usize),

    #[error("Invalid concurrency {0} (must be at least 1)")]
    InvalidConcurrency(usize),

    #[error("Invalid endpoint '{0}' (must be an http:// or https:// URL)")]
    InvalidEndpoint(String),

    #[error("Request timeout must be greater than zero")]
    InvalidTimeout,
}

/// Settings for one annotation run
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorConfig {
    /// Bulk variant endpoint URL
    pub endpoint: String,

    /// Identifiers per request (service ceiling is MAX_BATCH_SIZE)
    pub batch_size: usize,

    /// Batch requests allowed in flight at once
    pub concurrency: usize,

    /// Per-request timeout
    pub request_timeout: Duration,

    pub depth_lookup: DepthLookup,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            depth_lookup: DepthLookup::default(),
        }
    }
}

impl AnnotatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency));
        }

        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }
}
