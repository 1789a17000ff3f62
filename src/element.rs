//! Positioned content boxes
//!
//! Every later stage works on [`Element`]s: integer pixel geometry taken
//! from the source layout plus the box's text.

/// Kind of positioned box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Text-bearing container
    Text,
    /// Thin horizontal rule separating two variables
    Divider,
}

/// A positioned box with integer geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    /// Left edge (px)
    pub left: i32,
    /// Top edge (px, grows downwards)
    pub top: i32,
    pub width: i32,
    pub height: i32,
    /// Text content, empty for dividers
    pub text: String,
}

impl Element {
    /// Create a text element
    pub fn text(left: i32, top: i32, width: i32, height: i32, text: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Text,
            left,
            top,
            width,
            height,
            text: text.into(),
        }
    }

    /// Create a divider element
    pub fn divider(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            kind: ElementKind::Divider,
            left,
            top,
            width,
            height,
            text: String::new(),
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn is_divider(&self) -> bool {
        self.kind == ElementKind::Divider
    }

    /// Copy of this element moved to a new top position
    pub fn with_top(&self, top: i32) -> Self {
        Self {
            top,
            ..self.clone()
        }
    }
}

/// Sort elements into reading order: top to bottom, then left to right.
///
/// The sort is stable, so boxes sharing both coordinates keep their
/// document order.
pub fn sort_reading_order(elements: &mut [Element]) {
    elements.sort_by_key(|e| (e.top, e.left));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_edges() {
        let e = Element::text(36, 100, 50, 12, "Length: 4");
        assert_eq!(e.right(), 86);
        assert_eq!(e.bottom(), 112);
        assert!(!e.is_divider());
        assert!(Element::divider(36, 90, 540, 0).is_divider());
    }

    #[test]
    fn test_reading_order_top_first() {
        let mut elements = vec![
            Element::text(10, 200, 5, 5, "low left"),
            Element::text(300, 100, 5, 5, "high right"),
        ];
        sort_reading_order(&mut elements);
        assert_eq!(elements[0].text, "high right");
        assert_eq!(elements[1].text, "low left");
    }

    #[test]
    fn test_reading_order_ties_left_to_right_and_stable() {
        let mut elements = vec![
            Element::text(300, 100, 5, 5, "right"),
            Element::text(10, 100, 5, 5, "first"),
            Element::text(10, 100, 5, 5, "second"),
        ];
        sort_reading_order(&mut elements);
        let texts: Vec<_> = elements.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "right"]);
    }

    #[test]
    fn test_with_top_leaves_original() {
        let e = Element::text(400, 105, 20, 10, "fragment");
        let moved = e.with_top(100);
        assert_eq!(moved.top, 100);
        assert_eq!(e.top, 105);
        assert_eq!(moved.text, e.text);
    }
}
