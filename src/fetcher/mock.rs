// ==============================================================================
// fetcher/mock.rs - In-Memory Annotation Source
// ==============================================================================
// Description: Offline stand-in for the bulk variant endpoint
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::types::{BulkEntry, BulkResponse};
use super::{AnnotationSource, FetchError};

/// Annotation source answering from a fixed table
///
/// Records the size of every batch it receives, so batching behaviour can be
/// checked without a network.
#[derive(Debug, Default)]
pub struct MockAnnotationSource {
    /// Entries by `chrom-position-ref-alt`
    entries: HashMap<String, BulkEntry>,
    /// Returned for identifiers not in `entries`; None omits them
    default_entry: Option<BulkEntry>,
    /// 1-based call number that fails with HTTP 503
    fail_on_batch: Option<usize>,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MockAnnotationSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, token: impl Into<String>, entry: BulkEntry) -> Self {
        self.entries.insert(token.into(), entry);
        self
    }

    pub fn with_default(mut self, entry: BulkEntry) -> Self {
        self.default_entry = Some(entry);
        self
    }

    pub fn failing_on_batch(mut self, batch: usize) -> Self {
        self.fail_on_batch = Some(batch);
        self
    }

    /// Sizes of the batches received so far, in call order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AnnotationSource for MockAnnotationSource {
    async fn fetch_batch(&self, tokens: &[String]) -> Result<BulkResponse, FetchError> {
        let call = {
            let mut sizes = self
                .batch_sizes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            sizes.push(tokens.len());
            sizes.len()
        };

        if self.fail_on_batch == Some(call) {
            return Err(FetchError::Status { status: 503 });
        }

        let response = tokens
            .iter()
            .filter_map(|token| {
                self.entries
                    .get(token)
                    .or(self.default_entry.as_ref())
                    .map(|entry| (token.clone(), entry.clone()))
            })
            .collect();

        Ok(response)
    }
}
