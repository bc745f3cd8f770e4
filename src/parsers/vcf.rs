// ==============================================================================
// parsers/vcf.rs - VCF line reader
// ==============================================================================
// Description: Splits VCF text lines into header lines and variant records
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited text, header lines prefixed with '#'
// Example:
//   ##INFO=<ID=END,Number=1,Type=Integer,Description="End position">
//   #CHROM  POS  ID  REF  ALT  QUAL  FILTER  INFO  FORMAT  sample1
//   1  69869  .  T  A  50  PASS  AO=30;DP=100  GT  0/1
// Records are kept as text so they re-serialize byte-for-byte.
// ==============================================================================

use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use crate::models::VariantKey;

/// Position token marking a record that cannot be looked up
pub const UNRESOLVABLE_POSITION: &str = "/";

/// Columns up to and including INFO are mandatory; FORMAT and samples are not
const MIN_COLUMNS: usize = 8;

/// VCF line reader errors
#[derive(Error, Debug)]
pub enum VcfParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected at least 8 tab-delimited columns, found {found}")]
    MissingColumns { line: usize, found: usize },

    #[error("Line {line}: invalid position value '{value}'")]
    InvalidPosition { line: usize, value: String },
}

/// One INFO entry: `key=value` or a bare flag
#[derive(Debug, Clone, PartialEq)]
pub struct InfoEntry {
    pub key: String,
    pub value: Option<String>,
}

/// Parsed INFO column, entries kept in their original order
#[derive(Debug, Clone, PartialEq)]
pub struct InfoField {
    pub entries: Vec<InfoEntry>,
}

impl InfoField {
    pub fn parse(info: &str) -> Self {
        let entries = info
            .split(';')
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => InfoEntry {
                    key: key.to_string(),
                    value: Some(value.to_string()),
                },
                None => InfoEntry {
                    key: entry.to_string(),
                    value: None,
                },
            })
            .collect();

        Self { entries }
    }

    /// Value of the first entry named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .and_then(|e| e.value.as_deref())
    }

    /// Value of the entry at a fixed position (text after its last '=')
    pub fn value_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|e| match &e.value {
            Some(value) => value.rsplit('=').next().unwrap_or(value.as_str()),
            None => e.key.as_str(),
        })
    }
}

/// One VCF data line
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRecord {
    pub chromosome: String,

    /// Verified numeric, kept verbatim
    pub position: String,

    pub id: String,
    pub ref_allele: String,

    /// Comma-joined for multiallelic sites
    pub alt_allele: String,

    pub qual: String,
    pub filter: String,

    /// Raw INFO column
    pub info: String,

    pub format: Option<String>,

    /// Genotype columns in file order
    pub genotypes: Vec<String>,
}

impl VariantRecord {
    pub fn key(&self) -> VariantKey {
        VariantKey::new(&self.chromosome, &self.position)
    }

    pub fn query(&self) -> VariantQuery {
        VariantQuery {
            chromosome: self.chromosome.clone(),
            position: self.position.clone(),
            ref_allele: self.ref_allele.clone(),
            alt_allele: self.alt_allele.clone(),
        }
    }

    pub fn info_field(&self) -> InfoField {
        InfoField::parse(&self.info)
    }

    /// Serialize back to a tab-delimited line with a replacement INFO column
    pub fn to_line_with_info(&self, info: &str) -> String {
        let mut columns: Vec<&str> = vec![
            self.chromosome.as_str(),
            self.position.as_str(),
            self.id.as_str(),
            self.ref_allele.as_str(),
            self.alt_allele.as_str(),
            self.qual.as_str(),
            self.filter.as_str(),
            info,
        ];

        if let Some(format) = &self.format {
            columns.push(format.as_str());
        }
        columns.extend(self.genotypes.iter().map(String::as_str));

        columns.join("\t")
    }
}

/// Variant as sent to the annotation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantQuery {
    pub chromosome: String,
    pub position: String,
    pub ref_allele: String,
    pub alt_allele: String,
}

impl VariantQuery {
    /// Service identifier: `chrom-position-ref-alt`
    pub fn token(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.chromosome, self.position, self.ref_allele, self.alt_allele
        )
    }
}

/// Classified input line
#[derive(Debug, Clone, PartialEq)]
pub enum VcfLine<'a> {
    /// Meta-information or column header line, passed through unchanged
    Header(&'a str),

    Record(VariantRecord),

    /// Data line whose position is the unresolvable sentinel
    Unresolvable,
}

/// Line-oriented VCF reader
#[derive(Debug, Clone, Default)]
pub struct VcfLineReader;

impl VcfLineReader {
    pub fn new() -> Self {
        Self
    }

    /// Open a VCF file for one pass, decompressing `.gz` input
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Box<dyn BufRead>, VcfParseError> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let is_gzip = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("gz"))
            .unwrap_or(false);

        if is_gzip {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
        } else {
            Ok(Box::new(BufReader::new(file)))
        }
    }

    /// Classify and split a single line (line terminator already removed)
    ///
    /// # Returns
    /// * `Ok(VcfLine::Header)` - line starts with '#'
    /// * `Ok(VcfLine::Unresolvable)` - position is the `/` sentinel
    /// * `Ok(VcfLine::Record)` - parsed data line
    /// * `Err(VcfParseError)` - too few columns or non-numeric position
    pub fn parse_line<'a>(&self, line: &'a str, line_number: usize) -> Result<VcfLine<'a>, VcfParseError> {
        if line.starts_with('#') {
            return Ok(VcfLine::Header(line));
        }

        let fields: Vec<&str> = line.split('\t').collect();

        if fields.len() >= 2 && fields[1] == UNRESOLVABLE_POSITION {
            return Ok(VcfLine::Unresolvable);
        }

        if fields.len() < MIN_COLUMNS {
            return Err(VcfParseError::MissingColumns {
                line: line_number,
                found: fields.len(),
            });
        }

        let position = fields[1];
        if position.parse::<u64>().is_err() {
            return Err(VcfParseError::InvalidPosition {
                line: line_number,
                value: position.to_string(),
            });
        }

        Ok(VcfLine::Record(VariantRecord {
            chromosome: fields[0].to_string(),
            position: position.to_string(),
            id: fields[2].to_string(),
            ref_allele: fields[3].to_string(),
            alt_allele: fields[4].to_string(),
            qual: fields[5].to_string(),
            filter: fields[6].to_string(),
            info: fields[7].to_string(),
            format: fields.get(8).map(|f| f.to_string()),
            genotypes: fields.iter().skip(9).map(|g| g.to_string()).collect(),
        }))
    }
}
