// ==============================================================================
// fetcher/mod.rs - Bulk Annotation Fetcher
// ==============================================================================
// Description: Batches variant identifiers through an annotation source and
//              resolves allele frequency and most severe consequence per site
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Batching:
//   The bulk endpoint returns nothing (not an error) for oversize queries, so
//   identifiers are sent in chunks of at most MAX_BATCH_SIZE. Batches are
//   independent; responses are merged in batch order, then in the order the
//   service listed each entry.
// ==============================================================================

pub mod exac;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{AlleleFrequency, AnnotationMap, ExternalAnnotation, VariantKey};
use crate::parsers::VariantQuery;
use crate::severity::{most_severe, SeverityError};

pub use exac::ExacClient;
pub use mock::MockAnnotationSource;
pub use types::{bulk_payload, BulkEntry, BulkResponse, VariantSummary};

/// Largest batch the bulk endpoint answers reliably
pub const MAX_BATCH_SIZE: usize = 400;

/// Errors raised while fetching or resolving external annotations
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Annotation service returned HTTP {status}")]
    Status { status: u16 },

    #[error("JSON encode/decode error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed variant identifier in response: '{0}'")]
    MalformedIdentifier(String),

    #[error(transparent)]
    Severity(#[from] SeverityError),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("Batch {batch}/{total} failed: {source}")]
    Batch {
        batch: usize,
        total: usize,
        #[source]
        source: Box<FetchError>,
    },
}

/// A service that answers one bulk query per call
#[async_trait]
pub trait AnnotationSource: Send + Sync {
    /// Look up a batch of `chrom-position-ref-alt` identifiers
    async fn fetch_batch(&self, tokens: &[String]) -> Result<BulkResponse, FetchError>;
}

/// Drives batched lookups against an [`AnnotationSource`]
pub struct AnnotationFetcher<S> {
    source: S,
    batch_size: usize,
    concurrency: usize,
}

impl<S: AnnotationSource> AnnotationFetcher<S> {
    /// Create a fetcher issuing sequential batches of MAX_BATCH_SIZE
    pub fn new(source: S) -> Self {
        Self {
            source,
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
        }
    }

    /// Set batch size, kept within 1..=MAX_BATCH_SIZE
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    /// Set how many batch requests may be in flight at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of requests needed for `count` variants
    pub fn batch_count(&self, count: usize) -> usize {
        count.div_ceil(self.batch_size)
    }

    /// Fetch and resolve annotations for every query
    ///
    /// Any failed batch fails the whole fetch; later lookups assume every
    /// queried site is present.
    pub async fn fetch(&self, queries: &[VariantQuery]) -> Result<AnnotationMap, FetchError> {
        let tokens: Vec<String> = queries.iter().map(VariantQuery::token).collect();
        let total = self.batch_count(tokens.len());

        info!(
            "Querying {} variants in {} batch(es) of up to {}",
            tokens.len(),
            total,
            self.batch_size
        );

        let mut responses = stream::iter(tokens.chunks(self.batch_size).enumerate())
            .map(|(index, batch)| async move {
                debug!("Requesting batch {}/{} ({} variants)", index + 1, total, batch.len());
                self.source
                    .fetch_batch(batch)
                    .await
                    .map_err(|e| FetchError::Batch {
                        batch: index + 1,
                        total,
                        source: Box::new(e),
                    })
            })
            .buffered(self.concurrency);

        let mut annotations = AnnotationMap::new();

        while let Some(response) = responses.next().await {
            let response = response?;

            for (token, entry) in &response {
                let (key, annotation) = resolve_entry(token, entry)?;
                annotations.insert(key, annotation);
            }
        }

        info!("Resolved annotations for {} sites", annotations.len());
        Ok(annotations)
    }
}

/// Resolve one response entry into its site key and annotation
///
/// The key keeps only `chrom-position`, so alternate alleles at the same site
/// collapse and the last one written wins.
pub fn resolve_entry(
    token: &str,
    entry: &BulkEntry,
) -> Result<(VariantKey, ExternalAnnotation), FetchError> {
    let mut parts = token.splitn(3, '-');

    let key = match (parts.next(), parts.next()) {
        (Some(chrom), Some(pos)) if !chrom.is_empty() && !pos.is_empty() => {
            VariantKey::new(chrom, pos)
        }
        _ => return Err(FetchError::MalformedIdentifier(token.to_string())),
    };

    let consequence = most_severe(entry.consequence_labels())?;

    Ok((
        key,
        ExternalAnnotation {
            allele_freq: AlleleFrequency::from(entry.variant.allele_freq),
            consequence,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Consequence;

    fn query(position: usize) -> VariantQuery {
        VariantQuery {
            chromosome: "1".to_string(),
            position: position.to_string(),
            ref_allele: "A".to_string(),
            alt_allele: "T".to_string(),
        }
    }

    fn queries(count: usize) -> Vec<VariantQuery> {
        (1..=count).map(query).collect()
    }

    #[test]
    fn test_resolve_entry_missense() {
        let entry = BulkEntry::new(Some(0.01), Some(&["missense_variant"]));
        let (key, annotation) = resolve_entry("chr1-100-A-T", &entry).unwrap();

        assert_eq!(key, VariantKey::new("chr1", "100"));
        assert_eq!(annotation.allele_freq, AlleleFrequency::Value(0.01));
        assert_eq!(
            annotation.consequence,
            Consequence::Label("missense_variant".to_string())
        );
    }

    #[test]
    fn test_resolve_entry_null_and_empty_consequence() {
        let null = BulkEntry::new(None, None);
        let (_, annotation) = resolve_entry("1-100-A-T", &null).unwrap();
        assert_eq!(annotation.consequence, Consequence::NotAvailable);
        assert_eq!(annotation.allele_freq, AlleleFrequency::NotAvailable);

        let empty = BulkEntry::new(Some(0.2), Some(&[]));
        let (_, annotation) = resolve_entry("1-100-A-T", &empty).unwrap();
        assert_eq!(annotation.consequence, Consequence::NotAvailable);
    }

    #[test]
    fn test_resolve_entry_ranks_multiple_consequences() {
        let entry = BulkEntry::new(
            None,
            Some(&["intron_variant", "splice_donor_variant", "stop_gained"]),
        );
        let (_, annotation) = resolve_entry("2-5-G-C", &entry).unwrap();
        assert_eq!(
            annotation.consequence,
            Consequence::Label("splice_donor_variant".to_string())
        );
    }

    #[test]
    fn test_resolve_entry_unknown_consequence_is_fatal() {
        let entry = BulkEntry::new(None, Some(&["missense_variant", "mystery_variant"]));
        let err = resolve_entry("2-5-G-C", &entry).unwrap_err();
        assert!(matches!(err, FetchError::Severity(_)));
    }

    #[test]
    fn test_resolve_entry_malformed_identifier() {
        let entry = BulkEntry::default();
        assert!(matches!(
            resolve_entry("nodash", &entry),
            Err(FetchError::MalformedIdentifier(_))
        ));
    }

    #[tokio::test]
    async fn test_exactly_one_batch_at_limit() {
        let source = MockAnnotationSource::new().with_default(BulkEntry::new(None, None));
        let fetcher = AnnotationFetcher::new(source);

        let annotations = fetcher.fetch(&queries(400)).await.unwrap();

        assert_eq!(fetcher.source().batch_sizes(), vec![400]);
        assert_eq!(annotations.len(), 400);
    }

    #[tokio::test]
    async fn test_two_batches_past_limit() {
        let source = MockAnnotationSource::new().with_default(BulkEntry::new(None, None));
        let fetcher = AnnotationFetcher::new(source);

        let annotations = fetcher.fetch(&queries(401)).await.unwrap();

        assert_eq!(fetcher.source().batch_sizes(), vec![400, 1]);
        assert_eq!(annotations.len(), 401);
    }

    #[tokio::test]
    async fn test_no_queries_no_requests() {
        let fetcher = AnnotationFetcher::new(MockAnnotationSource::new());
        let annotations = fetcher.fetch(&[]).await.unwrap();
        assert!(annotations.is_empty());
        assert!(fetcher.source().batch_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_batch_size_is_capped() {
        let source = MockAnnotationSource::new().with_default(BulkEntry::new(None, None));
        let fetcher = AnnotationFetcher::new(source).with_batch_size(10_000);
        assert_eq!(fetcher.batch_size(), MAX_BATCH_SIZE);

        fetcher.fetch(&queries(1000)).await.unwrap();
        assert_eq!(fetcher.source().batch_sizes(), vec![400, 400, 200]);
    }

    #[tokio::test]
    async fn test_concurrent_batches_union() {
        let source = MockAnnotationSource::new().with_default(BulkEntry::new(Some(0.1), None));
        let fetcher = AnnotationFetcher::new(source)
            .with_batch_size(3)
            .with_concurrency(4);

        let annotations = fetcher.fetch(&queries(10)).await.unwrap();

        let mut sizes = fetcher.source().batch_sizes();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![1, 3, 3, 3]);
        assert_eq!(annotations.len(), 10);
        assert!(annotations.contains_key(&VariantKey::new("1", "10")));
    }

    #[tokio::test]
    async fn test_multiallelic_identifiers_collapse_to_site() {
        let source = MockAnnotationSource::new()
            .with_entry("1-100-A-T", BulkEntry::new(Some(0.1), Some(&["intron_variant"])))
            .with_entry("1-100-A-G", BulkEntry::new(Some(0.2), Some(&["stop_gained"])));
        let fetcher = AnnotationFetcher::new(source);

        let mut first = query(100);
        first.alt_allele = "T".to_string();
        let mut second = query(100);
        second.alt_allele = "G".to_string();

        let annotations = fetcher.fetch(&[first, second]).await.unwrap();

        // The mock answers in query order, so "1-100-A-G" is written last
        assert_eq!(annotations.len(), 1);
        let site = &annotations[&VariantKey::new("1", "100")];
        assert_eq!(site.allele_freq, AlleleFrequency::Value(0.2));
        assert_eq!(site.consequence, Consequence::Label("stop_gained".to_string()));
    }

    #[test]
    fn test_collapsed_site_follows_response_order() {
        // Response order disagrees with sorted order: "1-100-A-G" sorts first
        let body = r#"{
            "1-100-A-T": {"variant": {"allele_freq": 0.1}, "consequence": null},
            "1-100-A-G": {"variant": {"allele_freq": 0.2}, "consequence": null}
        }"#;
        let response: BulkResponse = serde_json::from_str(body).unwrap();

        let mut annotations = AnnotationMap::new();
        for (token, entry) in &response {
            let (key, annotation) = resolve_entry(token, entry).unwrap();
            annotations.insert(key, annotation);
        }

        assert_eq!(annotations.len(), 1);
        assert_eq!(
            annotations[&VariantKey::new("1", "100")].allele_freq,
            AlleleFrequency::Value(0.2)
        );
    }

    #[tokio::test]
    async fn test_failed_batch_is_fatal() {
        let source = MockAnnotationSource::new()
            .with_default(BulkEntry::new(None, None))
            .failing_on_batch(2);
        let fetcher = AnnotationFetcher::new(source).with_batch_size(2);

        let err = fetcher.fetch(&queries(5)).await.unwrap_err();
        match err {
            FetchError::Batch { batch, total, source } => {
                assert_eq!(batch, 2);
                assert_eq!(total, 3);
                assert!(matches!(*source, FetchError::Status { status: 503 }));
            }
            e => panic!("Expected Batch error, got {}", e),
        }
    }
}
