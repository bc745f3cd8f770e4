// ==============================================================================
// processor.rs - Two-Pass Annotation Pipeline
// ==============================================================================
// Description: Collects variants, fetches external annotations in bulk, then
//              re-reads the input and writes annotated records
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Pass 1: input → variant queries (sentinel positions skipped)
// Fetch:  queries → batched lookups → annotation map (read-only afterwards)
// Pass 2: input → header rewrite / depth stats + ANNOT → output
// Each pass opens and closes its own reader.
// ==============================================================================

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::AnnotatorConfig;
use crate::depth::DepthAnnotator;
use crate::fetcher::{AnnotationFetcher, AnnotationSource, ExacClient};
use crate::models::AnnotationMap;
use crate::parsers::{VariantQuery, VcfLine, VcfLineReader};
use crate::rewriter::RecordRewriter;

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Variants sent to the annotation service
    pub variants_queried: usize,

    /// Batch requests issued
    pub batches: usize,

    /// Distinct sites with a resolved annotation
    pub sites_resolved: usize,

    /// Data lines written with ANNOT
    pub records_annotated: usize,

    /// Data lines dropped for an unresolvable position
    pub unresolvable_skipped: usize,

    /// Whether the ANNOT header declaration was written
    pub header_injected: bool,
}

/// Result of the first pass
#[derive(Debug, Clone, Default)]
pub struct CollectedVariants {
    pub queries: Vec<VariantQuery>,
    pub unresolvable: usize,
}

/// Result of the second pass
#[derive(Debug, Clone, Copy, Default)]
struct RewriteCounts {
    records: usize,
    unresolvable: usize,
    header_injected: bool,
}

/// Two-pass VCF annotation pipeline
pub struct AnnotationPipeline<S> {
    reader: VcfLineReader,
    fetcher: AnnotationFetcher<S>,
    depth: DepthAnnotator,
    rewriter: RecordRewriter,
}

impl AnnotationPipeline<ExacClient> {
    /// Build a pipeline backed by the ExAC bulk endpoint
    pub fn from_config(config: &AnnotatorConfig) -> Result<Self> {
        config.validate().context("Invalid annotator configuration")?;

        let client = ExacClient::new(&config.endpoint, config.request_timeout)
            .context("Failed to create annotation service client")?;
        info!("Annotation service endpoint: {}", client.endpoint());

        Ok(Self::new(client, config))
    }
}

impl<S: AnnotationSource> AnnotationPipeline<S> {
    pub fn new(source: S, config: &AnnotatorConfig) -> Self {
        Self {
            reader: VcfLineReader::new(),
            fetcher: AnnotationFetcher::new(source)
                .with_batch_size(config.batch_size)
                .with_concurrency(config.concurrency),
            depth: DepthAnnotator::new(config.depth_lookup.clone()),
            rewriter: RecordRewriter::new(),
        }
    }

    pub fn fetcher(&self) -> &AnnotationFetcher<S> {
        &self.fetcher
    }

    /// Annotate `input` and write the result to `output`
    pub async fn run<W: Write>(&self, input: &Path, output: W) -> Result<PipelineSummary> {
        info!("Starting annotation of {:?}", input);

        // 1. Collect identifiers
        let collected = self.collect_queries(input)?;
        info!(
            "Pass 1 complete: {} variants to annotate, {} unresolvable",
            collected.queries.len(),
            collected.unresolvable
        );

        // 2. Fetch external annotations
        let annotations = self
            .fetcher
            .fetch(&collected.queries)
            .await
            .context("Failed to fetch variant annotations")?;

        // 3. Rewrite with annotations
        let counts = self.rewrite(input, &annotations, output)?;
        info!("Pass 2 complete: {} records annotated", counts.records);

        if !counts.header_injected {
            warn!("No ##INFO=<ID=END header line found; ANNOT header not declared");
        }

        Ok(PipelineSummary {
            variants_queried: collected.queries.len(),
            batches: self.fetcher.batch_count(collected.queries.len()),
            sites_resolved: annotations.len(),
            records_annotated: counts.records,
            unresolvable_skipped: counts.unresolvable,
            header_injected: counts.header_injected,
        })
    }

    /// First pass: gather a service query for every resolvable record
    pub fn collect_queries(&self, input: &Path) -> Result<CollectedVariants> {
        let lines = self
            .reader
            .open(input)
            .with_context(|| format!("Failed to open input {:?}", input))?;

        let mut collected = CollectedVariants::default();

        for (index, line) in lines.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            match self.reader.parse_line(&line, index + 1)? {
                VcfLine::Header(_) => {}
                VcfLine::Record(record) => collected.queries.push(record.query()),
                VcfLine::Unresolvable => {
                    debug!("Line {}: unresolvable position, not queried", index + 1);
                    collected.unresolvable += 1;
                }
            }
        }

        Ok(collected)
    }

    /// Second pass: re-read the input and write annotated lines
    fn rewrite<W: Write>(
        &self,
        input: &Path,
        annotations: &AnnotationMap,
        mut output: W,
    ) -> Result<RewriteCounts> {
        let lines = self
            .reader
            .open(input)
            .with_context(|| format!("Failed to reopen input {:?}", input))?;

        let mut counts = RewriteCounts::default();

        for (index, line) in lines.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", index + 1))?;

            if line.trim().is_empty() {
                continue;
            }

            match self.reader.parse_line(&line, index + 1)? {
                VcfLine::Header(header) => {
                    let rewritten = self.rewriter.rewrite_header(header);
                    counts.header_injected |= rewritten.len() > 1;
                    for out_line in rewritten {
                        writeln!(output, "{}", out_line)?;
                    }
                }
                VcfLine::Record(record) => {
                    let annotated = self
                        .rewriter
                        .annotate_record(&record, annotations, &self.depth)
                        .with_context(|| format!("Failed to annotate line {}", index + 1))?;
                    writeln!(output, "{}", annotated)?;
                    counts.records += 1;
                }
                VcfLine::Unresolvable => counts.unresolvable += 1,
            }
        }

        output.flush().context("Failed to flush output")?;
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthLookup;
    use crate::fetcher::{BulkEntry, MockAnnotationSource};
    use crate::rewriter::RewriteError;
    use tempfile::NamedTempFile;

    const INPUT: &str = "\
##fileformat=VCFv4.2
##INFO=<ID=END,Number=1,Type=Integer,Description=\"End position\">
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Total depth\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNORMAL\tTUMOR
chr1\t100\t.\tA\tT\t50\tPASS\tAO=30;DP=100\tGT\t0/0\t0/1
chr1\t/\t.\tC\tG\t10\tPASS\tAO=1;DP=2\tGT\t0/0\t0/1
chr2\t200\trs7\tG\tA,C\t99\tPASS\tAO=10,20;DP=100\tGT\t0/0\t1/2
";

    fn create_test_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn mock_source() -> MockAnnotationSource {
        MockAnnotationSource::new()
            .with_entry("chr1-100-A-T", BulkEntry::new(Some(0.01), Some(&["missense_variant"])))
            .with_entry("chr2-200-G-A,C", BulkEntry::new(None, None))
    }

    async fn run(input: &str, source: MockAnnotationSource) -> (Result<PipelineSummary>, String) {
        let file = create_test_file(input);
        let pipeline = AnnotationPipeline::new(source, &AnnotatorConfig::default());
        let mut output = Vec::new();
        let result = pipeline.run(file.path(), &mut output).await;
        (result, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let (result, output) = run(INPUT, mock_source()).await;
        let summary = result.unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "##INFO=<ID=END,Number=1,Type=Integer,Description=\"End position\">");
        assert_eq!(lines[2], RecordRewriter::annotation_header());
        assert!(lines[4].starts_with("#CHROM"));
        assert_eq!(
            lines[5],
            "chr1\t100\t.\tA\tT\t50\tPASS\tAO=30;DP=100;ANNOT=30|100|0.300|missense_variant|0.01\tGT\t0/0\t0/1"
        );
        assert_eq!(
            lines[6],
            "chr2\t200\trs7\tG\tA,C\t99\tPASS\tAO=10,20;DP=100;ANNOT=10,20|100|0.100,0.200|NA|NA\tGT\t0/0\t1/2"
        );

        assert_eq!(
            summary,
            PipelineSummary {
                variants_queried: 2,
                batches: 1,
                sites_resolved: 2,
                records_annotated: 2,
                unresolvable_skipped: 1,
                header_injected: true,
            }
        );
    }

    #[tokio::test]
    async fn test_every_record_has_five_part_annot() {
        let (result, output) = run(INPUT, mock_source()).await;
        result.unwrap();

        for line in output.lines().filter(|l| !l.starts_with('#')) {
            let info = line.split('\t').nth(7).unwrap();
            let annot = info
                .split(';')
                .find_map(|e| e.strip_prefix("ANNOT="))
                .unwrap();
            assert!(!annot.is_empty());
            assert_eq!(annot.split('|').count(), 5);
        }
    }

    #[tokio::test]
    async fn test_collect_skips_unresolvable() {
        let file = create_test_file(INPUT);
        let pipeline = AnnotationPipeline::new(mock_source(), &AnnotatorConfig::default());

        let collected = pipeline.collect_queries(file.path()).unwrap();
        let tokens: Vec<String> = collected.queries.iter().map(VariantQuery::token).collect();

        assert_eq!(tokens, vec!["chr1-100-A-T", "chr2-200-G-A,C"]);
        assert_eq!(collected.unresolvable, 1);
        assert_eq!(pipeline.fetcher().batch_count(collected.queries.len()), 1);
    }

    #[tokio::test]
    async fn test_missing_service_entry_aborts() {
        let source = MockAnnotationSource::new()
            .with_entry("chr1-100-A-T", BulkEntry::new(Some(0.01), Some(&["missense_variant"])));

        let (result, _) = run(INPUT, source).await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RewriteError>(),
            Some(RewriteError::MissingAnnotation(_))
        ));
    }

    #[tokio::test]
    async fn test_service_failure_aborts_before_output() {
        let (result, output) = run(INPUT, mock_source().failing_on_batch(1)).await;
        assert!(result.is_err());
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_without_end_header() {
        let input = "\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr1\t100\t.\tA\tT\t50\tPASS\tAO=30;DP=100
";
        let (result, output) = run(input, mock_source()).await;
        let summary = result.unwrap();

        assert!(!summary.header_injected);
        assert_eq!(output.lines().count(), 2);
        assert!(output.ends_with("ANNOT=30|100|0.300|missense_variant|0.01\n"));
    }

    #[tokio::test]
    async fn test_positional_depth_lookup() {
        let input = "\
chr1\t100\t.\tA\tT\t50\tPASS\tAB=0;ABP=0;AC=1;AF=0.5;AN=2;AO=25;CIGAR=1X;DP=50
";
        let config = AnnotatorConfig {
            depth_lookup: DepthLookup::legacy_positional(),
            ..Default::default()
        };
        let file = create_test_file(input);
        let pipeline = AnnotationPipeline::new(mock_source(), &config);
        let mut output = Vec::new();

        pipeline.run(file.path(), &mut output).await.unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains(";ANNOT=25|50|0.500|missense_variant|0.01\n"));
    }

    #[tokio::test]
    async fn test_invalid_position_is_fatal() {
        let input = "chr1\tabc\t.\tA\tT\t50\tPASS\tAO=1;DP=2\n";
        let (result, _) = run(input, mock_source()).await;
        assert!(result.is_err());
    }
}
