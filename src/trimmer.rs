//! Page range trimming and page furniture removal
//!
//! The codebook HTML is a flat run of absolutely positioned boxes directly
//! under `<body>`. Pages are marked by `<div><a name="N">Page N</a></div>`
//! anchor boxes. Trimming keeps the boxes from the start page anchor up to
//! the box holding the anchor of the page after the last data page, then
//! drops everything that is not data: decorative rules, running
//! headers/footers and the anchor boxes themselves.

use crate::CodebookError;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Inclusive range of data-bearing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub start: u32,
    pub end: u32,
}

impl Default for PageRange {
    fn default() -> Self {
        Self { start: 9, end: 126 }
    }
}

/// Variable dividers are zero-height rules at this exact offset
const DIVIDER_LEFT_MATCH: &str = "left:36px;";
const DIVIDER_HEIGHT_MATCH: &str = "height:0px;";
/// Only text-bearing boxes carry font styling
const FONT_FAMILY_MATCH: &str = "font-family";

/// Running header/footer text repeated on every page
const BANNER_TEXTS: &[&str] = &[
    "CLPS 2021 - Data Dictionary",
    "Totals may not add up due to rounding",
];

static PAGE_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Page.*-").unwrap());
static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static SPAN_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("span").unwrap());

/// Restrict the document to the data pages and strip page furniture.
///
/// Returns the surviving top-level boxes in document order.
pub fn trim_pages(document: &Html, range: PageRange) -> Result<Vec<ElementRef<'_>>, CodebookError> {
    let start_name = range.start.to_string();
    let stop_name = (range.end + 1).to_string();

    let start_box = document
        .select(&ANCHOR_SELECTOR)
        .find(|a| a.value().attr("name") == Some(start_name.as_str()))
        .and_then(|a| a.parent())
        .and_then(ElementRef::wrap)
        .ok_or(CodebookError::PageAnchorNotFound { page: range.start })?;

    let mut boxes = vec![start_box];
    for sibling in start_box.next_siblings().filter_map(ElementRef::wrap) {
        if anchor_name(sibling) == Some(stop_name.as_str()) {
            break;
        }
        boxes.push(sibling);
    }
    let total = boxes.len();

    let kept: Vec<ElementRef<'_>> = boxes
        .into_iter()
        .filter(|b| !is_decorative_rule(*b))
        .filter(|b| !is_page_banner(*b))
        .filter(|b| anchor_name(*b).is_none())
        .collect();

    log::debug!(
        "Trimmed pages {}-{}: kept {} of {} boxes",
        range.start,
        range.end,
        kept.len(),
        total
    );

    Ok(kept)
}

/// Name of the first anchor inside a box, if any
fn anchor_name(node: ElementRef<'_>) -> Option<&str> {
    node.select(&ANCHOR_SELECTOR)
        .next()
        .and_then(|a| a.value().attr("name"))
}

/// Whether a box is a bare style rule that must not survive trimming.
///
/// Text spans carry a font family; variable dividers sit at a fixed left
/// offset with zero height. Every other span is page decoration.
pub fn is_decorative_rule(node: ElementRef<'_>) -> bool {
    if node.value().name() != "span" {
        return false;
    }
    let style = node.value().attr("style").unwrap_or_default();
    if style.contains(FONT_FAMILY_MATCH) {
        return false;
    }
    !(style.contains(DIVIDER_LEFT_MATCH) && style.contains(DIVIDER_HEIGHT_MATCH))
}

/// Whether a box is a running header, footer or page number
pub fn is_page_banner(node: ElementRef<'_>) -> bool {
    let Some(span) = node.select(&SPAN_SELECTOR).next() else {
        return false;
    };
    let text: String = span.text().collect();
    BANNER_TEXTS.iter().any(|banner| text.contains(banner)) || PAGE_NUMBER_RE.is_match(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{}</body></html>", body))
    }

    fn first_box(doc: &Html) -> ElementRef<'_> {
        let body = Selector::parse("body").unwrap();
        doc.select(&body)
            .next()
            .unwrap()
            .children()
            .find_map(ElementRef::wrap)
            .unwrap()
    }

    #[test]
    fn test_divider_is_not_decorative() {
        let doc = page(
            r#"<span style="position:absolute; border: black 1px solid; left:36px; top:200px; width:540px; height:0px;"></span>"#,
        );
        assert!(!is_decorative_rule(first_box(&doc)));
    }

    #[test]
    fn test_offset_rule_is_decorative() {
        let doc = page(
            r#"<span style="position:absolute; border: black 1px solid; left:360px; top:200px; width:40px; height:0px;"></span>"#,
        );
        assert!(is_decorative_rule(first_box(&doc)));
    }

    #[test]
    fn test_text_span_is_not_decorative() {
        let doc = page(r#"<span style="font-family: Arial; font-size:9px">x</span>"#);
        assert!(!is_decorative_rule(first_box(&doc)));
    }

    #[test]
    fn test_page_banner() {
        let doc = page(
            r#"<div style="left:36px; top:10px; width:100px; height:10px;"><span style="font-family: A">Page 12 - 126</span></div>"#,
        );
        assert!(is_page_banner(first_box(&doc)));

        let doc = page(
            r#"<div style="left:36px; top:10px; width:100px; height:10px;"><span style="font-family: A">Concept:</span></div>"#,
        );
        assert!(!is_page_banner(first_box(&doc)));
    }

    #[test]
    fn test_missing_start_anchor() {
        let doc = page(r#"<div style="position:absolute; top:0px;"><a name="1">Page 1</a></div>"#);
        let err = trim_pages(&doc, PageRange { start: 9, end: 10 }).unwrap_err();
        assert!(matches!(err, CodebookError::PageAnchorNotFound { page: 9 }));
    }

    #[test]
    fn test_trim_stops_before_next_page() {
        let doc = page(concat!(
            r#"<div style="position:absolute; top:0px;"><a name="1">Page 1</a></div>"#,
            r#"<div style="left:40px; top:10px; width:10px; height:10px;"><span style="font-family: A">before</span></div>"#,
            r#"<div style="position:absolute; top:100px;"><a name="2">Page 2</a></div>"#,
            r#"<div style="left:40px; top:110px; width:10px; height:10px;"><span style="font-family: A">kept</span></div>"#,
            r#"<div style="position:absolute; top:200px;"><a name="3">Page 3</a></div>"#,
            r#"<div style="left:40px; top:210px; width:10px; height:10px;"><span style="font-family: A">after</span></div>"#,
        ));
        let kept = trim_pages(&doc, PageRange { start: 2, end: 2 }).unwrap();
        let texts: Vec<String> = kept.iter().map(|b| b.text().collect()).collect();
        assert_eq!(texts, vec!["kept".to_string()]);
    }
}
