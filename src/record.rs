//! Per-variable records
//!
//! A [`Record`] holds the scalar fields of one variable plus, for variables
//! that have one, its reconstructed answer table.

use crate::fields::{
    extract_banded, extract_banded_broad, extract_inline, extract_variable_name, FieldKind,
};
use crate::grouper::Unit;
use crate::tables::{reconstruct_answer_table, with_blank_category, AnswerTable};
use crate::{CodebookError, ExtractOptions};
use serde::{Deserialize, Serialize};

/// Extracted data for one codebook variable.
///
/// The answer table fields are flattened into the record and left out
/// entirely for variables without a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub variable_name: String,
    pub length: String,
    pub position: String,
    pub question_name: String,
    pub concept: String,
    pub question_text: String,
    pub universe: String,
    pub note: String,
    pub source: String,
    #[serde(flatten)]
    pub answers: Option<AnswerTable>,
}

/// Extract one record from a unit
pub fn extract_record(unit: &Unit, options: &ExtractOptions) -> Result<Record, CodebookError> {
    let variable_name = extract_variable_name(unit)?;
    let has_answers = !options
        .no_answer_variables
        .iter()
        .any(|v| *v == variable_name);

    // Without a table there is no answer categories heading to close the
    // source band, and the source is blank anyway
    let source = if has_answers {
        extract_banded(unit, FieldKind::Source, FieldKind::AnswerCategories)?
    } else {
        String::new()
    };

    let answers = if !has_answers {
        None
    } else if options
        .blank_category_variables
        .iter()
        .any(|v| *v == variable_name)
    {
        Some(reconstruct_answer_table(&with_blank_category(unit)?)?)
    } else {
        Some(reconstruct_answer_table(unit)?)
    };

    Ok(Record {
        length: extract_inline(unit, FieldKind::Length)?,
        position: extract_inline(unit, FieldKind::Position)?,
        question_name: extract_banded(unit, FieldKind::QuestionName, FieldKind::Concept)?,
        concept: extract_banded(unit, FieldKind::Concept, FieldKind::QuestionText)?,
        question_text: extract_banded_broad(unit, FieldKind::QuestionText, FieldKind::Universe)?,
        universe: extract_banded(unit, FieldKind::Universe, FieldKind::Note)?,
        note: extract_banded(unit, FieldKind::Note, FieldKind::Source)?,
        variable_name,
        source,
        answers,
    })
}

/// Extract records for all units in order.
///
/// An empty last unit (left after a trailing divider) is skipped. Any other
/// empty unit, or the first failing unit, aborts the whole run.
pub fn extract_records(units: &[Unit], options: &ExtractOptions) -> Result<Vec<Record>, CodebookError> {
    let mut records = Vec::with_capacity(units.len());

    for (index, unit) in units.iter().enumerate() {
        if unit.is_empty() {
            if index + 1 == units.len() {
                log::warn!("Skipping empty trailing unit {}", index);
                continue;
            }
            log::error!("Unit {} is empty", index);
            return Err(CodebookError::Unit {
                index,
                variable: "?".to_string(),
                source: Box::new(CodebookError::Structural(
                    "empty unit between adjacent dividers".to_string(),
                )),
            });
        }

        match extract_record(unit, options) {
            Ok(record) => {
                log::debug!("Unit {}: {}", index, record.variable_name);
                records.push(record);
            }
            Err(e) => {
                log::error!("Unit causing error: {:?}", unit);
                let variable = extract_variable_name(unit).unwrap_or_else(|_| "?".to_string());
                return Err(CodebookError::Unit {
                    index,
                    variable,
                    source: Box::new(e),
                });
            }
        }
    }

    Ok(records)
}
