//! Splitting the element stream into per-variable units

use crate::element::{sort_reading_order, Element};
use crate::CodebookError;

/// The text elements describing one codebook variable, in reading order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unit {
    pub elements: Vec<Element>,
}

impl Unit {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.elements.iter()
    }

    /// First element whose text contains `label`
    pub fn find(&self, label: &str) -> Result<&Element, CodebookError> {
        self.elements
            .iter()
            .find(|e| e.text.contains(label))
            .ok_or_else(|| CodebookError::LabelNotFound {
                label: label.to_string(),
            })
    }

    /// Copy of this unit with one more element, kept in reading order
    pub fn with_element(&self, element: Element) -> Unit {
        let mut elements = self.elements.clone();
        elements.push(element);
        sort_reading_order(&mut elements);
        Unit { elements }
    }
}

/// Group elements into units, one per divider-delimited block.
///
/// Every divider closes the open unit, even an empty one. The unit left
/// open after the last divider is emitted too, so `n` dividers always give
/// `n + 1` units.
pub fn group_units(elements: &[Element]) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut current = Vec::new();

    for element in elements {
        if element.is_divider() {
            units.push(Unit::new(std::mem::take(&mut current)));
        } else {
            current.push(element.clone());
        }
    }
    units.push(Unit::new(current));

    log::debug!("Grouped {} elements into {} units", elements.len(), units.len());
    units
}
