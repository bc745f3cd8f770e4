// ==============================================================================
// rewriter.rs - Annotated Record Writer
// ==============================================================================
// Description: Appends the ANNOT INFO entry to records and declares it in the header
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Output:
//   ##INFO=<ID=END,...>
//   ##INFO=<ID=ANNOT,Description="...">        ← injected after the END line
//   1  100  .  A  T  50  PASS  AO=30;DP=100;ANNOT=30|100|0.300|missense_variant|0.01
// ANNOT = alt depth | total depth | alt depth percentage | consequence | allele freq
// ==============================================================================

use std::fmt;
use thiserror::Error;

use crate::depth::{DepthAnnotator, DepthError, DepthStats};
use crate::models::{AnnotationMap, ExternalAnnotation, VariantKey};
use crate::parsers::VariantRecord;

/// INFO key of the injected annotation
pub const ANNOT_ID: &str = "ANNOT";

/// Header line prefix after which the ANNOT declaration is inserted
pub const HEADER_ANCHOR: &str = "##INFO=<ID=END";

/// Errors that can occur while rewriting a record
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("No annotation was fetched for variant {0}")]
    MissingAnnotation(VariantKey),

    #[error("Depth calculation failed for variant {key}: {source}")]
    Depth {
        key: VariantKey,
        #[source]
        source: DepthError,
    },
}

/// The five pipe-separated ANNOT sub-values of one record
#[derive(Debug, Clone, Copy)]
pub struct AnnotField<'a> {
    pub depth: &'a DepthStats,
    pub external: &'a ExternalAnnotation,
}

impl fmt::Display for AnnotField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.depth, self.external.consequence, self.external.allele_freq
        )
    }
}

/// Rewrites header and data lines for the annotated output
#[derive(Debug, Clone)]
pub struct RecordRewriter {
    anchor: String,
    header_line: String,
}

impl Default for RecordRewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordRewriter {
    pub fn new() -> Self {
        Self {
            anchor: HEADER_ANCHOR.to_string(),
            header_line: Self::annotation_header(),
        }
    }

    /// Header line declaring the ANNOT INFO field
    pub fn annotation_header() -> String {
        format!(
            "##INFO=<ID={},Description=\"Variant annotations. Alternative allele read depth | \
             Total read depth | Alternative allele read depth percentage | \
             Variant consequence | EXaC allele frequency\">",
            ANNOT_ID
        )
    }

    /// Lines to emit for one header line: itself, plus the ANNOT declaration
    /// when it is the END anchor
    pub fn rewrite_header<'a>(&'a self, line: &'a str) -> Vec<&'a str> {
        if line.starts_with(&self.anchor) {
            vec![line, self.header_line.as_str()]
        } else {
            vec![line]
        }
    }

    /// Serialize a record with ANNOT appended to its INFO column
    pub fn rewrite_record(
        &self,
        record: &VariantRecord,
        external: &ExternalAnnotation,
        depth: &DepthStats,
    ) -> String {
        let field = AnnotField { depth, external };
        let info = format!("{};{}={}", record.info, ANNOT_ID, field);
        record.to_line_with_info(&info)
    }

    /// Look up a record's annotation, compute its depth statistics, and rewrite it
    pub fn annotate_record(
        &self,
        record: &VariantRecord,
        annotations: &AnnotationMap,
        depth: &DepthAnnotator,
    ) -> Result<String, RewriteError> {
        let key = record.key();

        let external = annotations
            .get(&key)
            .ok_or_else(|| RewriteError::MissingAnnotation(key.clone()))?;

        let stats = depth
            .annotate(&record.info_field())
            .map_err(|source| RewriteError::Depth { key, source })?;

        Ok(self.rewrite_record(record, external, &stats))
    }
}
