// ==============================================================================
// lib.rs - VCF Annotator Library
// ==============================================================================
// Description: Library interface for VCF variant annotation modules
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

pub mod config;
pub mod depth;
pub mod fetcher;
pub mod models;
pub mod parsers;
pub mod processor;
pub mod rewriter;
pub mod severity;
