//! Scalar field extraction
//!
//! Every variable block prints its headings (`Question Name:`, `Concept:`,
//! ...) in a fixed vertical order with the values in a narrow text column
//! to their right. A field's value is whatever sits in that column between
//! its own heading and the next one down.

use crate::element::{sort_reading_order, Element};
use crate::grouper::Unit;
use crate::CodebookError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Left edge of the value column
const TEXT_LEFT_POS: i32 = 178;
const TEXT_LEFT_BUFFER: i32 = 5;
/// Right limit for the wide question text window
const TEXT_RIGHT_POS: i32 = 567;
/// How far above the top heading the band starts
const TOP_TOLERANCE: i32 = 10;
/// How far above the bottom heading the band stops
const BOTTOM_BUFFER: i32 = 10;
/// Vertical tolerance for the variable name row
const VARIABLE_NAME_TOLERANCE: i32 = 5;
/// Vertical offset between lines split out of one box
const LINE_SPLIT_STEP: i32 = 10;

/// Known mis-extracted characters and their replacements
pub const CHARACTER_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\u{fb01}", "fi"),
    ("\u{fb02}", "fl"),
    ("\u{fb00}", "ff"),
    ("\u{fb03}", "ffi"),
    ("\u{fb04}", "ffl"),
    ("\u{2019}", "'"),
];

static LINE_HYPHEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])- ([a-z])").unwrap());

/// Codebook fields and the heading text that labels them on the page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    VariableName,
    Length,
    Position,
    QuestionName,
    Concept,
    QuestionText,
    Universe,
    Note,
    Source,
    AnswerCategories,
    Code,
    Frequency,
    WeightedFrequency,
    Percent,
    Total,
}

impl FieldKind {
    /// Literal heading text printed in the codebook
    pub fn heading(self) -> &'static str {
        match self {
            FieldKind::VariableName => "Variable Name:",
            FieldKind::Length => "Length:",
            FieldKind::Position => "Position:",
            FieldKind::QuestionName => "Question Name:",
            FieldKind::Concept => "Concept:",
            FieldKind::QuestionText => "Question Text:",
            FieldKind::Universe => "Universe:",
            FieldKind::Note => "Note:",
            FieldKind::Source => "Source:",
            FieldKind::AnswerCategories => "Answer Categories",
            FieldKind::Code => "Code",
            FieldKind::Frequency => "Frequency",
            FieldKind::WeightedFrequency => "Weighted Frequency",
            FieldKind::Percent => "%",
            FieldKind::Total => "Total",
        }
    }

    /// Output key of the field
    pub fn key(self) -> &'static str {
        match self {
            FieldKind::VariableName => "variable_name",
            FieldKind::Length => "length",
            FieldKind::Position => "position",
            FieldKind::QuestionName => "question_name",
            FieldKind::Concept => "concept",
            FieldKind::QuestionText => "question_text",
            FieldKind::Universe => "universe",
            FieldKind::Note => "note",
            FieldKind::Source => "source",
            FieldKind::AnswerCategories => "answer_categories",
            FieldKind::Code => "code",
            FieldKind::Frequency => "frequency",
            FieldKind::WeightedFrequency => "weighted_frequency",
            FieldKind::Percent => "percent",
            FieldKind::Total => "total",
        }
    }
}

// ============================================================================
// Text cleanup
// ============================================================================

/// Apply the character substitution table
pub fn replace_characters(text: &str) -> String {
    CHARACTER_SUBSTITUTIONS
        .iter()
        .fold(text.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Collapse line breaks and runs of whitespace into single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Undo hyphenation introduced by line wrapping.
///
/// `"conclu- sion"` becomes `"conclusion"`. A hyphen before a capital
/// (`"you- Bought"`) is kept.
pub fn remove_line_hyphenation(text: &str) -> String {
    let mut out = text.to_string();
    // Adjacent matches share a letter, so one pass can miss every other one
    loop {
        match LINE_HYPHEN_RE.replace_all(&out, "${1}${2}") {
            Cow::Borrowed(_) => return out,
            Cow::Owned(next) => out = next,
        }
    }
}

/// Split a cell on line breaks and trim each line
pub fn split_and_strip(text: &str) -> Vec<String> {
    text.split('\n').map(|line| line.trim().to_string()).collect()
}

/// Join element texts into a single cleaned field value
pub fn join_field_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let joined = parts.into_iter().collect::<Vec<_>>().join(" ");
    let replaced = replace_characters(&joined);
    remove_line_hyphenation(&normalize_whitespace(&replaced))
}

// ============================================================================
// Extraction
// ============================================================================

/// Vertical band between two headings, exclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Band {
    top: i32,
    bottom: i32,
}

impl Band {
    fn between(unit: &Unit, top: FieldKind, bottom: FieldKind) -> Result<Self, CodebookError> {
        Ok(Self {
            top: unit.find(top.heading())?.top - TOP_TOLERANCE,
            bottom: unit.find(bottom.heading())?.top - BOTTOM_BUFFER,
        })
    }

    fn contains(&self, element: &Element) -> bool {
        self.top < element.top && element.top < self.bottom
    }
}

fn in_text_column(element: &Element) -> bool {
    TEXT_LEFT_POS - TEXT_LEFT_BUFFER < element.left && element.left < TEXT_LEFT_POS + TEXT_LEFT_BUFFER
}

fn in_broad_window(element: &Element) -> bool {
    TEXT_LEFT_POS - TEXT_LEFT_BUFFER < element.left && element.left < TEXT_RIGHT_POS
}

/// Variable name: the single box on the heading row between
/// `Variable Name:` and `Length:`
pub fn extract_variable_name(unit: &Unit) -> Result<String, CodebookError> {
    let label = unit.find(FieldKind::VariableName.heading())?;
    let length = unit.find(FieldKind::Length.heading())?;
    let (left, right, row) = (label.left, length.left, label.top);

    let found: Vec<&Element> = unit
        .iter()
        .filter(|e| left < e.left && e.left < right)
        .filter(|e| row - VARIABLE_NAME_TOLERANCE < e.top && e.top < row + VARIABLE_NAME_TOLERANCE)
        .collect();

    match found.as_slice() {
        [single] => Ok(single.text.clone()),
        _ => Err(CodebookError::VariableName {
            left,
            right,
            top: row,
            tolerance: VARIABLE_NAME_TOLERANCE,
            found: found.iter().map(|e| e.text.clone()).collect(),
        }),
    }
}

/// Value printed inline after a heading's colon, e.g. `Length: 4`
pub fn extract_inline(unit: &Unit, field: FieldKind) -> Result<String, CodebookError> {
    let element = unit.find(field.heading())?;
    element
        .text
        .split(':')
        .nth(1)
        .map(|value| value.trim().to_string())
        .ok_or_else(|| CodebookError::LabelNotFound {
            label: field.heading().to_string(),
        })
}

/// Text in the value column between the `field` heading and the `next` one
pub fn extract_banded(unit: &Unit, field: FieldKind, next: FieldKind) -> Result<String, CodebookError> {
    let band = Band::between(unit, field, next)?;
    Ok(join_field_text(
        unit.iter()
            .filter(|e| band.contains(e) && in_text_column(e))
            .map(|e| e.text.as_str()),
    ))
}

/// Banded extraction over a wide window, for fields that may be printed as
/// a left fragment plus a right-shifted fragment on the same line.
pub fn extract_banded_broad(
    unit: &Unit,
    field: FieldKind,
    next: FieldKind,
) -> Result<String, CodebookError> {
    let band = Band::between(unit, field, next)?;
    let collected: Vec<&Element> = unit
        .iter()
        .filter(|e| band.contains(e) && in_broad_window(e))
        .collect();

    let mut repaired = realign_fragments(&split_lines(&collected));
    sort_reading_order(&mut repaired);

    Ok(join_field_text(repaired.iter().map(|e| e.text.as_str())))
}

/// Replace every multi-line element by one element per line, each moved
/// down by a fixed step so the lines keep their order.
pub fn split_lines(elements: &[&Element]) -> Vec<Element> {
    let mut out = Vec::with_capacity(elements.len());
    for element in elements {
        if !element.text.contains('\n') {
            out.push((*element).clone());
            continue;
        }
        for (i, line) in element.text.split('\n').enumerate() {
            out.push(Element {
                top: element.top + i as i32 * LINE_SPLIT_STEP,
                text: line.trim().to_string(),
                ..(*element).clone()
            });
        }
    }
    out
}

/// Move every element outside the value column onto the row of its
/// nearest in-column element.
///
/// When two in-column rows are equally near, the upper one wins. Elements
/// are never modified in place; the result is a new collection.
pub fn realign_fragments(elements: &[Element]) -> Vec<Element> {
    let anchors: Vec<i32> = elements
        .iter()
        .filter(|e| in_text_column(e))
        .map(|e| e.top)
        .collect();

    elements
        .iter()
        .map(|e| {
            if in_text_column(e) {
                return e.clone();
            }
            match anchors.iter().min_by_key(|&&top| ((top - e.top).abs(), top)) {
                Some(&top) => e.with_top(top),
                None => e.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(left: i32, top: i32, text: &str) -> Element {
        Element::text(left, top, 100, 10, text)
    }

    fn heading_unit(mut extra: Vec<Element>) -> Unit {
        let mut elements = vec![
            at(36, 100, "Variable Name:"),
            at(120, 100, "AGE"),
            at(300, 100, "Length: 2"),
            at(450, 100, "Position: 17"),
            at(36, 120, "Question Name:"),
            at(36, 140, "Concept:"),
            at(36, 160, "Question Text:"),
            at(36, 220, "Universe:"),
        ];
        elements.append(&mut extra);
        sort_reading_order(&mut elements);
        Unit::new(elements)
    }

    #[test]
    fn test_headings_table() {
        assert_eq!(FieldKind::QuestionText.heading(), "Question Text:");
        assert_eq!(FieldKind::Percent.heading(), "%");
        assert_eq!(FieldKind::WeightedFrequency.key(), "weighted_frequency");
    }

    #[test]
    fn test_dehyphenation() {
        assert_eq!(remove_line_hyphenation("conclu- sion"), "conclusion");
        assert_eq!(remove_line_hyphenation("you- Bought"), "you- Bought");
        assert_eq!(remove_line_hyphenation("a- b- c"), "abc");
        let once = remove_line_hyphenation("pre- vious con- cern");
        assert_eq!(once, "previous concern");
        assert_eq!(remove_line_hyphenation(&once), once);
    }

    #[test]
    fn test_replace_characters() {
        assert_eq!(replace_characters("\u{fb01}nal"), "final");
        assert_eq!(replace_characters("don\u{2019}t"), "don't");
    }

    #[test]
    fn test_join_field_text() {
        let joined = join_field_text(["In the past year,\n  did you\nexperi-", "ence a con\u{fb02}ict?"]);
        assert_eq!(joined, "In the past year, did you experience a conflict?");
    }

    #[test]
    fn test_split_and_strip() {
        assert_eq!(split_and_strip(" Yes \n No"), vec!["Yes", "No"]);
        assert_eq!(split_and_strip(""), vec![""]);
    }

    #[test]
    fn test_variable_name() {
        let unit = heading_unit(vec![]);
        assert_eq!(extract_variable_name(&unit).unwrap(), "AGE");
    }

    #[test]
    fn test_variable_name_ambiguous() {
        let unit = heading_unit(vec![at(200, 102, "EXTRA")]);
        match extract_variable_name(&unit) {
            Err(CodebookError::VariableName { found, .. }) => {
                assert_eq!(found, vec!["AGE".to_string(), "EXTRA".to_string()]);
            }
            other => panic!("expected variable name error, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_values() {
        let unit = heading_unit(vec![]);
        assert_eq!(extract_inline(&unit, FieldKind::Length).unwrap(), "2");
        assert_eq!(extract_inline(&unit, FieldKind::Position).unwrap(), "17");
    }

    #[test]
    fn test_banded_extraction() {
        let unit = heading_unit(vec![
            at(178, 120, "Q12"),
            at(178, 140, "Age of"),
            at(180, 148, "respon- dent"),
            // outside the value column
            at(300, 142, "ignored"),
        ]);
        assert_eq!(
            extract_banded(&unit, FieldKind::QuestionName, FieldKind::Concept).unwrap(),
            "Q12"
        );
        assert_eq!(
            extract_banded(&unit, FieldKind::Concept, FieldKind::QuestionText).unwrap(),
            "Age of respondent"
        );
    }

    #[test]
    fn test_banded_missing_label() {
        let unit = heading_unit(vec![]);
        let err = extract_banded(&unit, FieldKind::Note, FieldKind::Source).unwrap_err();
        assert!(matches!(err, CodebookError::LabelNotFound { .. }));
    }

    #[test]
    fn test_split_lines_offsets() {
        let e = at(178, 160, "first\n  second");
        let lines = split_lines(&[&e]);
        assert_eq!(lines.len(), 2);
        assert_eq!((lines[0].top, lines[0].text.as_str()), (160, "first"));
        assert_eq!((lines[1].top, lines[1].text.as_str()), (170, "second"));
    }

    #[test]
    fn test_realign_nearest_and_tie() {
        let elements = vec![at(178, 160, "a"), at(178, 170, "b"), at(400, 168, "frag"), at(400, 165, "tie")];
        let aligned = realign_fragments(&elements);
        assert_eq!(aligned[2].top, 170);
        assert_eq!(aligned[3].top, 160);
        // input untouched
        assert_eq!(elements[2].top, 168);
    }

    #[test]
    fn test_broad_extraction_joins_fragments() {
        let unit = heading_unit(vec![
            at(178, 160, "Only report actions\n taken in Canada."),
            at(360, 172, "- Contacted the other party"),
        ]);
        let text = extract_banded_broad(&unit, FieldKind::QuestionText, FieldKind::Universe).unwrap();
        assert_eq!(
            text,
            "Only report actions taken in Canada. - Contacted the other party"
        );
    }
}
