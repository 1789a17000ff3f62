//! Intermediate dumps for inspecting a run
//!
//! Each stage's output is written one item per line so that a failing
//! variable can be tracked down with plain text tools.

use crate::element::Element;
use crate::grouper::Unit;
use crate::record::Record;
use crate::CodebookError;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const ELEMENTS_FILE: &str = "debug_elements.txt";
pub const UNITS_FILE: &str = "debug_units.txt";
pub const QUESTIONS_FILE: &str = "debug_questions.txt";
pub const ANSWERS_FILE: &str = "debug_answers.txt";

/// Write each item's debug representation on its own line
pub fn write_debug_lines<T: Debug>(path: &Path, items: &[T]) -> Result<(), CodebookError> {
    let mut out = BufWriter::new(File::create(path)?);
    for item in items {
        writeln!(out, "{:?}", item)?;
    }
    out.flush()?;
    Ok(())
}

pub fn dump_elements(dir: &Path, elements: &[Element]) -> Result<PathBuf, CodebookError> {
    let path = dir.join(ELEMENTS_FILE);
    write_debug_lines(&path, elements)?;
    log::debug!("Elements written to {}", path.display());
    Ok(path)
}

pub fn dump_units(dir: &Path, units: &[Unit]) -> Result<PathBuf, CodebookError> {
    let path = dir.join(UNITS_FILE);
    write_debug_lines(&path, units)?;
    log::debug!("Units written to {}", path.display());
    Ok(path)
}

/// Write full records, then a narrower file with only the answer tables
pub fn dump_records(dir: &Path, records: &[Record]) -> Result<(PathBuf, PathBuf), CodebookError> {
    let questions = dir.join(QUESTIONS_FILE);
    let mut out = BufWriter::new(File::create(&questions)?);
    for record in records {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    out.flush()?;
    log::debug!("Questions written to {}", questions.display());

    let answers = dir.join(ANSWERS_FILE);
    let mut out = BufWriter::new(File::create(&answers)?);
    for record in records {
        match &record.answers {
            Some(table) => writeln!(out, "{}", serde_json::to_string(table)?)?,
            None => writeln!(out, "{{}}")?,
        }
    }
    out.flush()?;
    log::debug!("Answers written to {}", answers.display());

    Ok((questions, answers))
}
