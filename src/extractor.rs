//! Element extraction from trimmed HTML boxes
//!
//! Reads the inline `left/top/width/height` style of every box and turns it
//! into an [`Element`] with integer geometry, in reading order.

use crate::element::{sort_reading_order, Element, ElementKind};
use crate::CodebookError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;

static LEFT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"left:(\d+)px;").unwrap());
static TOP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"top:(\d+)px;").unwrap());
static WIDTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"width:(\d+)px;").unwrap());
static HEIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"height:(\d+)px;").unwrap());

/// Box geometry parsed from an inline style attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// Convert trimmed boxes into elements sorted top-to-bottom, left-to-right
pub fn extract_elements(boxes: &[ElementRef<'_>]) -> Result<Vec<Element>, CodebookError> {
    let mut elements = boxes
        .iter()
        .map(|b| extract_element(*b))
        .collect::<Result<Vec<_>, _>>()?;

    sort_reading_order(&mut elements);
    log::debug!("Extracted {} elements", elements.len());

    Ok(elements)
}

/// Convert a single box: `div` is text, `span` is a divider
pub fn extract_element(node: ElementRef<'_>) -> Result<Element, CodebookError> {
    let style = node.value().attr("style").ok_or_else(|| {
        CodebookError::Structural(format!("box has no style attribute: {}", node.html()))
    })?;
    let geometry = parse_geometry(style).ok_or_else(|| {
        CodebookError::Structural(format!(
            "box style lacks left/top/width/height: {:?} in {}",
            style,
            node.html()
        ))
    })?;

    let kind = match node.value().name() {
        "div" => ElementKind::Text,
        "span" => ElementKind::Divider,
        other => {
            return Err(CodebookError::Structural(format!(
                "unexpected <{}> box: {}",
                other,
                node.html()
            )))
        }
    };

    let text = match kind {
        ElementKind::Text => node.text().collect::<String>().trim().to_string(),
        ElementKind::Divider => String::new(),
    };

    Ok(Element {
        kind,
        left: geometry.left,
        top: geometry.top,
        width: geometry.width,
        height: geometry.height,
        text,
    })
}

/// Parse `left:Npx; top:Npx; width:Npx; height:Npx;` out of a style string
pub fn parse_geometry(style: &str) -> Option<Geometry> {
    Some(Geometry {
        left: capture_px(&LEFT_RE, style)?,
        top: capture_px(&TOP_RE, style)?,
        width: capture_px(&WIDTH_RE, style)?,
        height: capture_px(&HEIGHT_RE, style)?,
    })
}

fn capture_px(re: &Regex, style: &str) -> Option<i32> {
    re.captures(style)?.get(1)?.as_str().parse().ok()
}
