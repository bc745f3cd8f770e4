// ==============================================================================
// models.rs - Annotation Data Models
// ==============================================================================
// Description: Per-run data structures shared by the fetch and rewrite passes
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::collections::HashMap;
use std::fmt;

use crate::severity::Consequence;

/// Sentinel written in place of any value the service could not supply
pub const NOT_AVAILABLE: &str = "NA";

/// Lookup key for a variant site: chromosome plus position
///
/// Multiallelic records and multiple service identifiers at the same site
/// collapse onto one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    pub chromosome: String,
    pub position: String,
}

impl VariantKey {
    pub fn new(chromosome: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            chromosome: chromosome.into(),
            position: position.into(),
        }
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.chromosome, self.position)
    }
}

/// Population allele frequency reported by the service
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlleleFrequency {
    Value(f64),
    NotAvailable,
}

impl fmt::Display for AlleleFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlleleFrequency::Value(value) => write!(f, "{}", value),
            AlleleFrequency::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl From<Option<f64>> for AlleleFrequency {
    fn from(value: Option<f64>) -> Self {
        value.map_or(AlleleFrequency::NotAvailable, AlleleFrequency::Value)
    }
}

/// External annotation resolved for one variant site
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalAnnotation {
    pub allele_freq: AlleleFrequency,
    pub consequence: Consequence,
}

/// Completed lookup table built before the rewrite pass and read-only after
pub type AnnotationMap = HashMap<VariantKey, ExternalAnnotation>;
