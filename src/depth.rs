// ==============================================================================
// depth.rs - Read Depth Statistics
// ==============================================================================
// Description: Computes alternate allele read depth percentage from INFO fields
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   alt_depth   = AO (comma-separated for multiallelic sites)
//   total_depth = DP
//   percentage  = alt / total per allele, fixed to 3 decimals
//   e.g. AO=10,20 DP=100 → "0.100,0.200"
// A total depth of zero is an error, never a guessed value.
// ==============================================================================

use std::fmt;
use thiserror::Error;

use crate::parsers::InfoField;

/// Default INFO key for alternate allele observation count
pub const ALT_DEPTH_KEY: &str = "AO";

/// Default INFO key for total read depth
pub const TOTAL_DEPTH_KEY: &str = "DP";

/// Legacy INFO positions for callers that always emit the same field order
pub const LEGACY_ALT_DEPTH_INDEX: usize = 5;
pub const LEGACY_TOTAL_DEPTH_INDEX: usize = 7;

/// Errors that can occur while computing depth statistics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DepthError {
    #[error("INFO field has no {0} entry")]
    MissingEntry(String),

    #[error("Invalid depth value '{value}' in {field}")]
    InvalidNumber { field: String, value: String },

    #[error("Total read depth is zero (alt depth {alt_depth})")]
    ZeroTotalDepth { alt_depth: String },
}

/// How the two depth entries are located inside INFO
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepthLookup {
    /// Find entries by key name
    ByKey { alt_key: String, total_key: String },

    /// Take entries at fixed positions
    ByIndex { alt_index: usize, total_index: usize },
}

impl Default for DepthLookup {
    fn default() -> Self {
        DepthLookup::ByKey {
            alt_key: ALT_DEPTH_KEY.to_string(),
            total_key: TOTAL_DEPTH_KEY.to_string(),
        }
    }
}

impl DepthLookup {
    pub fn legacy_positional() -> Self {
        DepthLookup::ByIndex {
            alt_index: LEGACY_ALT_DEPTH_INDEX,
            total_index: LEGACY_TOTAL_DEPTH_INDEX,
        }
    }

    fn alt_label(&self) -> String {
        match self {
            DepthLookup::ByKey { alt_key, .. } => alt_key.clone(),
            DepthLookup::ByIndex { alt_index, .. } => format!("INFO[{}]", alt_index),
        }
    }

    fn total_label(&self) -> String {
        match self {
            DepthLookup::ByKey { total_key, .. } => total_key.clone(),
            DepthLookup::ByIndex { total_index, .. } => format!("INFO[{}]", total_index),
        }
    }

    fn extract<'a>(&self, info: &'a InfoField) -> (Option<&'a str>, Option<&'a str>) {
        match self {
            DepthLookup::ByKey { alt_key, total_key } => (info.get(alt_key), info.get(total_key)),
            DepthLookup::ByIndex { alt_index, total_index } => {
                (info.value_at(*alt_index), info.value_at(*total_index))
            }
        }
    }
}

/// Depth statistics for one record
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStats {
    /// Alternate depth as written in the input (comma-separated if multiallelic)
    pub alt_depth: String,

    /// Total depth as written in the input
    pub total_depth: String,

    /// One 3-decimal fraction per alternate allele
    pub percentages: Vec<String>,
}

impl DepthStats {
    /// Percentages joined with ',' for the annotation field
    pub fn depth_percentage(&self) -> String {
        self.percentages.join(",")
    }
}

impl fmt::Display for DepthStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.alt_depth,
            self.total_depth,
            self.depth_percentage()
        )
    }
}

/// Computes per-record depth statistics
#[derive(Debug, Clone, Default)]
pub struct DepthAnnotator {
    pub lookup: DepthLookup,
}

impl DepthAnnotator {
    pub fn new(lookup: DepthLookup) -> Self {
        Self { lookup }
    }

    /// Compute depth statistics from a record's INFO field
    ///
    /// # Examples
    /// ```
    /// use vcf_annotator::depth::DepthAnnotator;
    /// use vcf_annotator::parsers::InfoField;
    ///
    /// let stats = DepthAnnotator::default()
    ///     .annotate(&InfoField::parse("AO=10,20;DP=100"))
    ///     .unwrap();
    /// assert_eq!(stats.depth_percentage(), "0.100,0.200");
    /// ```
    pub fn annotate(&self, info: &InfoField) -> Result<DepthStats, DepthError> {
        let (alt, total) = self.lookup.extract(info);

        let alt_depth = alt.ok_or_else(|| DepthError::MissingEntry(self.lookup.alt_label()))?;
        let total_depth =
            total.ok_or_else(|| DepthError::MissingEntry(self.lookup.total_label()))?;

        let total = parse_depth(total_depth, &self.lookup.total_label())?;
        if total == 0.0 {
            return Err(DepthError::ZeroTotalDepth {
                alt_depth: alt_depth.to_string(),
            });
        }

        let percentages = alt_depth
            .split(',')
            .map(|depth| {
                let depth = parse_depth(depth, &self.lookup.alt_label())?;
                Ok(format!("{:.3}", depth / total))
            })
            .collect::<Result<Vec<_>, DepthError>>()?;

        Ok(DepthStats {
            alt_depth: alt_depth.to_string(),
            total_depth: total_depth.to_string(),
            percentages,
        })
    }
}

fn parse_depth(value: &str, field: &str) -> Result<f64, DepthError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| DepthError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}
