//! Survey codebook extraction from positioned HTML
//!
//! This crate turns the absolutely positioned HTML produced by
//! `pdf2txt --output_type html` for a survey codebook into one record per
//! variable:
//! - Trimming to the data pages and dropping page furniture
//! - Element extraction with integer geometry, in reading order
//! - Grouping into per-variable units on divider rules
//! - Scalar field extraction by heading bands
//! - Answer table reconstruction with total validation

pub mod debug;
pub mod element;
pub mod extractor;
pub mod fields;
pub mod grouper;
pub mod record;
pub mod tables;
pub mod trimmer;

pub use element::{Element, ElementKind};
pub use extractor::extract_elements;
pub use fields::FieldKind;
pub use grouper::{group_units, Unit};
pub use record::{extract_records, Record};
pub use tables::{AnswerTable, ColumnToken, TotalRow};
pub use trimmer::{trim_pages, PageRange};

use scraper::Html;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Options for a codebook extraction run
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Data-bearing pages, inclusive
    pub page_range: PageRange,
    /// Variables printed without an answer table
    pub no_answer_variables: Vec<String>,
    /// Variables whose single answer category is unlabelled
    pub blank_category_variables: Vec<String>,
    /// Directory for intermediate dumps; no dumps when unset
    pub debug_dir: Option<PathBuf>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_range: PageRange::default(),
            no_answer_variables: vec!["PUMFID".to_string(), "WTPP".to_string()],
            blank_category_variables: vec!["VERDATE".to_string()],
            debug_dir: None,
        }
    }
}

/// Run the full pipeline over an HTML document
pub fn process_codebook(html: &str, options: &ExtractOptions) -> Result<Vec<Record>, CodebookError> {
    let document = Html::parse_document(html);

    let boxes = trim_pages(&document, options.page_range)?;
    let elements = extract_elements(&boxes)?;
    if let Some(dir) = &options.debug_dir {
        debug::dump_elements(dir, &elements)?;
    }

    let units = group_units(&elements);
    if let Some(dir) = &options.debug_dir {
        debug::dump_units(dir, &units)?;
    }

    let records = extract_records(&units, options)?;
    if let Some(dir) = &options.debug_dir {
        debug::dump_records(dir, &records)?;
    }

    log::info!("Extracted {} variables", records.len());
    Ok(records)
}

/// Read an HTML file and run the full pipeline over it
pub fn process_codebook_file<P: AsRef<Path>>(
    path: P,
    options: &ExtractOptions,
) -> Result<Vec<Record>, CodebookError> {
    let html = std::fs::read_to_string(path)?;
    process_codebook(&html, options)
}

/// Write records as a two-space indented JSON array
pub fn write_records<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<(), CodebookError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, records)?;
    out.flush()?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum CodebookError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("page anchor {page} not found")]
    PageAnchorNotFound { page: u32 },
    #[error("structural error: {0}")]
    Structural(String),
    #[error("label {label:?} not found in unit")]
    LabelNotFound { label: String },
    #[error(
        "expected one variable name between x={left} and x={right} within {tolerance}px of y={top}, found {found:?}"
    )]
    VariableName {
        left: i32,
        right: i32,
        top: i32,
        tolerance: i32,
        found: Vec<String>,
    },
    #[error("alignment error: {0}")]
    Alignment(String),
    #[error("{column} value {value:?} is not a number")]
    InvalidNumber { column: &'static str, value: String },
    #[error("{column} total {printed} does not match sum {computed} within tolerance of {tolerance} (diff: {diff})")]
    Validation {
        column: &'static str,
        computed: f64,
        printed: f64,
        diff: f64,
        tolerance: f64,
    },
    #[error("unit {index} ({variable}): {source}")]
    Unit {
        index: usize,
        variable: String,
        source: Box<CodebookError>,
    },
}
