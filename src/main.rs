// ==============================================================================
// main.rs - VCF Annotator Entry Point
// ==============================================================================
// Description: Annotates a VCF with ExAC allele frequency, most severe
//              consequence and alternate allele read depth percentage
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Usage:
//   vcf-annotator input.vcf [output.vcf]
// Without an output path the annotated VCF is written to stderr; logs go to
// stdout.
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vcf_annotator::config::AnnotatorConfig;
use vcf_annotator::depth::DepthLookup;
use vcf_annotator::fetcher::exac::DEFAULT_ENDPOINT;
use vcf_annotator::fetcher::MAX_BATCH_SIZE;
use vcf_annotator::processor::{AnnotationPipeline, PipelineSummary};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input VCF file (.vcf or .vcf.gz)
    input: PathBuf,

    /// Output VCF file (.gz suffix compresses); stderr if omitted
    output: Option<PathBuf>,

    /// ExAC bulk variant endpoint
    #[arg(long, env = "EXAC_BULK_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Variants per bulk request (at most 400)
    #[arg(long, default_value_t = MAX_BATCH_SIZE)]
    batch_size: usize,

    /// Bulk requests allowed in flight at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Read alt/total depth from INFO positions 5 and 7 instead of AO/DP keys
    #[arg(long)]
    positional_depth: bool,
}

impl Args {
    fn to_config(&self) -> AnnotatorConfig {
        AnnotatorConfig {
            endpoint: self.endpoint.clone(),
            batch_size: self.batch_size,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.timeout_secs),
            depth_lookup: if self.positional_depth {
                DepthLookup::legacy_positional()
            } else {
                DepthLookup::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vcf_annotator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = args.to_config();

    info!("VCF annotator starting");

    let pipeline = AnnotationPipeline::from_config(&config)?;

    let summary = match args.output.as_deref() {
        None => {
            let stderr = io::stderr();
            pipeline
                .run(&args.input, BufWriter::new(stderr.lock()))
                .await?
        }
        Some(path) if is_gzip(path) => {
            let file = create_output(path)?;
            let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
            let summary = pipeline.run(&args.input, &mut encoder).await?;
            encoder
                .finish()
                .and_then(|mut writer| writer.flush())
                .with_context(|| format!("Failed to finish compressed output {:?}", path))?;
            summary
        }
        Some(path) => {
            let file = create_output(path)?;
            pipeline.run(&args.input, BufWriter::new(file)).await?
        }
    };

    log_summary(&summary);
    Ok(())
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

fn create_output(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create output file {:?}", path))
}

fn log_summary(summary: &PipelineSummary) {
    info!(
        "Annotation complete: {} records annotated, {} unresolvable skipped",
        summary.records_annotated, summary.unresolvable_skipped
    );
    info!(
        "{} variants queried in {} batch(es), {} sites resolved",
        summary.variants_queried, summary.batches, summary.sites_resolved
    );
}
