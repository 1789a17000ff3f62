//! Answer table reconstruction
//!
//! Rebuilds the five-column frequency table (answer category, code,
//! frequency, weighted frequency, percent) of one variable and checks the
//! printed total row against the column sums.
//!
//! Two layout artifacts are repaired along the way:
//! - a table split over a page break repeats its column headings;
//! - a category wrapped over several lines leaves a gap in the code column,
//!   so one code column box becomes two.

use crate::element::Element;
use crate::fields::{replace_characters, split_and_strip, FieldKind};
use crate::grouper::Unit;
use crate::CodebookError;
use serde::{Deserialize, Serialize};

/// Column alignment tolerance (px)
const POS_TOL: i32 = 10;
/// Margin kept from the frequency column's right edge
const POS_BUFFER: i32 = 10;
/// Right edge of the frequency column
const FREQ_RIGHT_POS: i32 = 386;

const FREQUENCY_TOLERANCE: f64 = 0.0;
const WEIGHTED_FREQUENCY_TOLERANCE: f64 = 1.0;
const PERCENT_TOLERANCE: f64 = 0.2;

/// One entry in a reconstructed category or code column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnToken {
    /// A cell line
    Value(String),
    /// The column heading was printed again after a page break
    PageBreak,
    /// Boundary between two code boxes split by a wrapped category
    SegmentBreak,
}

/// Column tokens grouped by the box they came from
pub type ColumnGroups = Vec<Vec<ColumnToken>>;

/// The printed total row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRow {
    pub frequency: String,
    pub weighted_frequency: String,
    pub percent: String,
}

/// A reconstructed answer table; all columns have one entry per answer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerTable {
    pub answer_categories: Vec<String>,
    pub code: Vec<String>,
    pub frequency: Vec<String>,
    pub weighted_frequency: Vec<String>,
    pub percent: Vec<String>,
    pub total: TotalRow,
}

impl AnswerTable {
    /// Number of answer rows, excluding the total row
    pub fn len(&self) -> usize {
        self.answer_categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answer_categories.is_empty()
    }
}

/// Rebuild and validate the answer table of a unit
pub fn reconstruct_answer_table(unit: &Unit) -> Result<AnswerTable, CodebookError> {
    let categories = collect_label_column(unit, FieldKind::AnswerCategories)?;
    let codes = insert_segment_breaks(collect_label_column(unit, FieldKind::Code)?);

    let category_count: usize = categories.iter().map(Vec::len).sum();
    let code_count: usize = codes.iter().map(Vec::len).sum();
    if category_count != code_count {
        return Err(CodebookError::Alignment(format!(
            "{} answer category entries but {} code entries with breaks\nanswer categories: {:?}\ncodes: {:?}",
            category_count, code_count, categories, codes
        )));
    }

    let (answer_categories, code) = merge_categories_and_codes(
        categories.into_iter().flatten().collect(),
        codes.into_iter().flatten().collect(),
    )?;
    let answer_categories: Vec<String> =
        answer_categories.iter().map(|s| replace_characters(s)).collect();
    let code: Vec<String> = code.iter().map(|s| replace_characters(s)).collect();

    let mut frequency = strip_commas(collect_numeric_column(unit, FieldKind::Frequency)?);
    let mut weighted_frequency =
        strip_commas(collect_numeric_column(unit, FieldKind::WeightedFrequency)?);
    let mut percent = collect_numeric_column(unit, FieldKind::Percent)?;

    if frequency.len() != weighted_frequency.len() || frequency.len() != percent.len() {
        return Err(CodebookError::Alignment(format!(
            "frequency, weighted frequency and percent columns differ in length: {}, {}, {}\nfrequency: {:?}\nweighted frequency: {:?}\npercent: {:?}",
            frequency.len(),
            weighted_frequency.len(),
            percent.len(),
            frequency,
            weighted_frequency,
            percent
        )));
    }

    let total = match (frequency.pop(), weighted_frequency.pop(), percent.pop()) {
        (Some(frequency), Some(weighted_frequency), Some(percent)) => TotalRow {
            frequency,
            weighted_frequency,
            percent,
        },
        _ => {
            return Err(CodebookError::Alignment(
                "answer table has no total row".to_string(),
            ))
        }
    };

    if frequency.len() != answer_categories.len() {
        return Err(CodebookError::Alignment(format!(
            "{} answer rows but {} frequency rows\nanswer categories: {:?}\nfrequency: {:?}",
            answer_categories.len(),
            frequency.len(),
            answer_categories,
            frequency
        )));
    }

    validate_total(FieldKind::Frequency, &frequency, &total.frequency)?;
    validate_total(
        FieldKind::WeightedFrequency,
        &weighted_frequency,
        &total.weighted_frequency,
    )?;
    validate_total(FieldKind::Percent, &percent, &total.percent)?;

    Ok(AnswerTable {
        answer_categories,
        code,
        frequency,
        weighted_frequency,
        percent,
        total,
    })
}

/// Copy of `unit` with a blank answer category just below the heading.
///
/// For variables whose only category is unlabelled, so the category column
/// still lines up with the code column.
pub fn with_blank_category(unit: &Unit) -> Result<Unit, CodebookError> {
    let heading = unit.find(FieldKind::AnswerCategories.heading())?;
    let blank = Element::text(heading.left, heading.top + 10, 10, 10, "");
    Ok(unit.with_element(blank))
}

/// Collect the category (left-aligned) or code (right-aligned) column.
///
/// Starts at the first heading; any later copy of the heading becomes a
/// page break marker.
fn collect_label_column(unit: &Unit, field: FieldKind) -> Result<ColumnGroups, CodebookError> {
    let label = field.heading();
    let heading = unit.find(label)?;
    let (top, left, right) = (heading.top, heading.left, heading.right());

    let mut groups = Vec::new();
    let mut headings_seen = 0;
    for e in unit.iter().filter(|e| e.top >= top) {
        if e.text.contains(label) {
            if headings_seen > 0 {
                groups.push(vec![ColumnToken::PageBreak]);
            }
            headings_seen += 1;
            continue;
        }
        let aligned = match field {
            FieldKind::AnswerCategories => left - POS_TOL < e.left && e.left < left + POS_TOL,
            _ => right - POS_TOL < e.right() && e.right() < right + POS_TOL,
        };
        if aligned {
            groups.push(
                split_and_strip(&e.text)
                    .into_iter()
                    .map(ColumnToken::Value)
                    .collect(),
            );
        }
    }
    Ok(groups)
}

fn is_page_break(group: &[ColumnToken]) -> bool {
    matches!(group, [ColumnToken::PageBreak])
}

/// Put a segment break between every two consecutive code boxes that are
/// not separated by a page break.
pub fn insert_segment_breaks(groups: ColumnGroups) -> ColumnGroups {
    let mut out: ColumnGroups = Vec::with_capacity(groups.len() * 2);
    for group in groups {
        if let Some(previous) = out.last() {
            if !is_page_break(previous) && !is_page_break(&group) {
                out.push(vec![ColumnToken::SegmentBreak]);
            }
        }
        out.push(group);
    }
    out
}

/// Walk categories and codes in lock-step into one value per answer row.
///
/// Page breaks must line up and are dropped. A segment break in the codes
/// means the current category line continues the previous category.
pub fn merge_categories_and_codes(
    categories: Vec<ColumnToken>,
    codes: Vec<ColumnToken>,
) -> Result<(Vec<String>, Vec<String>), CodebookError> {
    if categories.len() != codes.len() {
        return Err(CodebookError::Alignment(format!(
            "{} answer category tokens but {} code tokens\nanswer categories: {:?}\ncodes: {:?}",
            categories.len(),
            codes.len(),
            categories,
            codes
        )));
    }

    let mut answers: Vec<String> = Vec::new();
    let mut values: Vec<String> = Vec::new();
    for (i, (category, code)) in categories.into_iter().zip(codes).enumerate() {
        match (category, code) {
            (ColumnToken::PageBreak, ColumnToken::PageBreak) => continue,
            (category @ ColumnToken::PageBreak, code) | (category, code @ ColumnToken::PageBreak) => {
                return Err(CodebookError::Alignment(format!(
                    "page break mismatch at {}\nanswer: {:?}\ncode: {:?}",
                    i, category, code
                )))
            }
            (ColumnToken::Value(answer), ColumnToken::SegmentBreak) => match answers.last_mut() {
                Some(previous) => {
                    previous.push(' ');
                    previous.push_str(&answer);
                }
                None => {
                    return Err(CodebookError::Alignment(format!(
                        "segment break at {} with no preceding answer category",
                        i
                    )))
                }
            },
            (ColumnToken::Value(answer), ColumnToken::Value(code)) => {
                answers.push(answer);
                values.push(code);
            }
            (ColumnToken::SegmentBreak, code) => {
                return Err(CodebookError::Alignment(format!(
                    "segment break in answer categories at {} (code: {:?})",
                    i, code
                )))
            }
        }
    }
    Ok((answers, values))
}

/// Collect a numeric column below its heading, one string per line
fn collect_numeric_column(unit: &Unit, field: FieldKind) -> Result<Vec<String>, CodebookError> {
    let label = field.heading();
    let heading = unit.find(label)?;
    let (top, left, right) = (heading.top, heading.left, heading.right());

    let in_column = |e: &Element| match field {
        // Frequency sits under the left half of the shared frequency heading
        FieldKind::Frequency => left < e.left && e.left < FREQ_RIGHT_POS - POS_BUFFER,
        _ => right - POS_TOL < e.right() && e.right() < right + POS_TOL,
    };

    Ok(unit
        .iter()
        .filter(|e| e.top >= top && !e.text.contains(label))
        .filter(|&e| in_column(e))
        .flat_map(|e| split_and_strip(&e.text))
        .collect())
}

fn strip_commas(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.replace(',', "")).collect()
}

/// Round to two decimals from the exact binary value, so 0.205 (stored
/// just below the tie) gives 0.2
fn round2(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

fn parse_int(field: FieldKind, value: &str) -> Result<i64, CodebookError> {
    value.trim().parse().map_err(|_| CodebookError::InvalidNumber {
        column: field.key(),
        value: value.to_string(),
    })
}

fn parse_float(field: FieldKind, value: &str) -> Result<f64, CodebookError> {
    value.trim().parse().map_err(|_| CodebookError::InvalidNumber {
        column: field.key(),
        value: value.to_string(),
    })
}

/// Check a column sum against its printed total.
///
/// Frequencies must match exactly, weighted frequencies within 1 and
/// percentages within 0.2 (after rounding the difference to two decimals).
pub fn validate_total(field: FieldKind, values: &[String], printed: &str) -> Result<(), CodebookError> {
    let (computed, printed_total, tolerance) = match field {
        FieldKind::Frequency | FieldKind::WeightedFrequency => {
            let sum = values
                .iter()
                .map(|v| parse_int(field, v))
                .sum::<Result<i64, _>>()?;
            let tolerance = if field == FieldKind::Frequency {
                FREQUENCY_TOLERANCE
            } else {
                WEIGHTED_FREQUENCY_TOLERANCE
            };
            (sum as f64, parse_int(field, printed)? as f64, tolerance)
        }
        _ => {
            let sum = values
                .iter()
                .map(|v| parse_float(field, v))
                .sum::<Result<f64, _>>()?;
            (sum, parse_float(field, printed)?, PERCENT_TOLERANCE)
        }
    };

    let diff = round2((computed - printed_total).abs());
    if diff > tolerance {
        return Err(CodebookError::Validation {
            column: field.key(),
            computed,
            printed: printed_total,
            diff,
            tolerance,
        });
    }
    Ok(())
}
