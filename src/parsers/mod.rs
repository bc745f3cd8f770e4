// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Parsers for variant call input files
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod vcf;

pub use vcf::{InfoField, VariantQuery, VariantRecord, VcfLine, VcfLineReader, VcfParseError};
