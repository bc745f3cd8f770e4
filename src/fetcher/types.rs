// ==============================================================================
// fetcher/types.rs - Bulk Variant Wire Types
// ==============================================================================
// Description: Request payload and response schema for the bulk variant endpoint
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Request body:  ["1-69869-T-A","1-69870-C-G"]
// Response body:
//   {
//     "1-69869-T-A": {
//       "variant": {"allele_freq": 0.01, ...},
//       "consequence": {"missense_variant": {...}, ...}
//     }
//   }
// "consequence" must be present but may be null or {}. Entries keep the
// order the service returned them in.
// ==============================================================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response to one bulk query, keyed by `chrom-position-ref-alt`, in response order
pub type BulkResponse = IndexMap<String, BulkEntry>;

/// Annotation returned for one queried identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkEntry {
    pub variant: VariantSummary,

    /// Consequence label → per-transcript metadata (only labels are used)
    #[serde(deserialize_with = "Option::deserialize")]
    pub consequence: Option<BTreeMap<String, serde_json::Value>>,
}

/// Subset of the service's variant record that is read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allele_freq: Option<f64>,
}

impl BulkEntry {
    pub fn new(allele_freq: Option<f64>, consequences: Option<&[&str]>) -> Self {
        Self {
            variant: VariantSummary { allele_freq },
            consequence: consequences.map(|labels| {
                labels
                    .iter()
                    .map(|label| (label.to_string(), serde_json::json!({})))
                    .collect()
            }),
        }
    }

    /// Consequence labels reported for this identifier, empty if none
    pub fn consequence_labels(&self) -> Vec<&str> {
        self.consequence
            .as_ref()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Serialize identifiers into the bulk request body (a JSON array of strings)
pub fn bulk_payload(tokens: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tokens)
}
