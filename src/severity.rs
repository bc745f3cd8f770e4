// ==============================================================================
// severity.rs - Consequence Severity Ranking
// ==============================================================================
// Description: Resolves the single most severe consequence reported for a variant
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Algorithm:
//   Walk the labels keeping (best_label, best_severity), starting below any
//   real severity.
//   - severity > best          → replace label and severity
//   - severity == best         → replace label only if it sorts first
//   - severity < best          → keep current
//   A single label is returned as-is; no labels resolve to "NA".
// Levels: https://useast.ensembl.org/info/genome/variation/prediction/predicted_data.html
// ==============================================================================

use std::fmt;
use thiserror::Error;

use crate::models::NOT_AVAILABLE;

/// Ensembl impact level of a consequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Impact {
    Modifier = 0,
    Low = 1,
    Moderate = 2,
    High = 3,
}

/// Errors raised while ranking consequences
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeverityError {
    #[error("Unknown consequence label '{0}' (no severity ranking defined)")]
    UnknownConsequence(String),
}

/// Resolved consequence for one variant site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consequence {
    Label(String),
    NotAvailable,
}

impl fmt::Display for Consequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consequence::Label(label) => f.write_str(label),
            Consequence::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// Look up the fixed impact level of a consequence label
pub fn severity_of(label: &str) -> Result<Impact, SeverityError> {
    let impact = match label {
        "3_prime_UTR_variant"
        | "5_prime_UTR_variant"
        | "intron_variant"
        | "non_coding_transcript_exon_variant" => Impact::Modifier,
        "splice_region_variant" | "synonymous_variant" => Impact::Low,
        "stop_retained_variant" | "missense_variant" | "initiator_codon_variant" => {
            Impact::Moderate
        }
        "stop_lost" | "stop_gained" | "splice_donor_variant" | "splice_acceptor_variant" => {
            Impact::High
        }
        _ => return Err(SeverityError::UnknownConsequence(label.to_string())),
    };

    Ok(impact)
}

/// Pick the most severe consequence from the labels observed for one variant
///
/// Equal severities are broken by taking the lexicographically smallest
/// label, so the result does not depend on input order.
///
/// # Examples
/// ```
/// use vcf_annotator::severity::{most_severe, Consequence};
///
/// let resolved = most_severe(["intron_variant", "missense_variant"]).unwrap();
/// assert_eq!(resolved, Consequence::Label("missense_variant".to_string()));
///
/// let none: [&str; 0] = [];
/// assert_eq!(most_severe(none).unwrap(), Consequence::NotAvailable);
/// ```
pub fn most_severe<'a, I>(labels: I) -> Result<Consequence, SeverityError>
where
    I: IntoIterator<Item = &'a str>,
{
    let labels: Vec<&str> = labels.into_iter().collect();

    match labels.as_slice() {
        [] => return Ok(Consequence::NotAvailable),
        [only] => return Ok(Consequence::Label(only.to_string())),
        _ => {}
    }

    let mut best: Option<(&str, Impact)> = None;

    for label in labels {
        let impact = severity_of(label)?;

        best = match best {
            None => Some((label, impact)),
            Some((_, best_impact)) if impact > best_impact => Some((label, impact)),
            Some((best_label, best_impact)) if impact == best_impact && label < best_label => {
                Some((label, impact))
            }
            keep => keep,
        };
    }

    Ok(best.map_or(Consequence::NotAvailable, |(label, _)| {
        Consequence::Label(label.to_string())
    }))
}
