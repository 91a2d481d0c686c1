//! The read-only element view the style engine matches selectors against.

use super::node::{ElementData, ElementId};
use super::tree::Document;

/// Read access to one element and its surroundings.
///
/// Implementors are cheap handles (typically a reference plus an id); the
/// style engine walks `parent` and `previous_sibling` when checking
/// combinators.
pub trait StyledElement: Sized {
    /// Tag name, matched by type selectors.
    fn tag(&self) -> &str;

    fn id(&self) -> Option<&str>;

    /// Classes in document order.
    fn classes(&self) -> &[String];

    /// Whether a pseudo-class such as `hover` is currently active.
    fn has_pseudo_class(&self, pseudo_class: &str) -> bool;

    fn parent(&self) -> Option<Self>;

    fn previous_sibling(&self) -> Option<Self>;

    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }
}

/// A [`StyledElement`] handle into a [`Document`].
#[derive(Debug, Clone, Copy)]
pub struct ElementRef<'a> {
    document: &'a Document,
    id: ElementId,
    data: &'a ElementData,
}

impl<'a> ElementRef<'a> {
    /// `None` if `id` is not in `document`.
    pub(crate) fn new(document: &'a Document, id: ElementId) -> Option<Self> {
        document.get(id).map(|data| Self { document, id, data })
    }

    pub fn element_id(&self) -> ElementId {
        self.id
    }

    pub fn data(&self) -> &'a ElementData {
        self.data
    }
}

impl StyledElement for ElementRef<'_> {
    fn tag(&self) -> &str {
        &self.data.tag
    }

    fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    fn classes(&self) -> &[String] {
        &self.data.classes
    }

    fn has_pseudo_class(&self, pseudo_class: &str) -> bool {
        self.data.has_pseudo_class(pseudo_class)
    }

    fn parent(&self) -> Option<Self> {
        self.document.element(self.document.parent(self.id)?)
    }

    fn previous_sibling(&self) -> Option<Self> {
        self.document.element(self.document.previous_sibling(self.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ref_reads_document() {
        let mut doc = Document::new();
        let body = doc.insert(ElementData::new("body"));
        let first = doc.insert_child(body, ElementData::new("p").with_class("lead"));
        let second = doc.insert_child(
            body,
            ElementData::new("p").with_id("x").with_pseudo_class("hover"),
        );

        let el = doc.element(second).unwrap();
        assert_eq!(el.tag(), "p");
        assert_eq!(el.id(), Some("x"));
        assert!(el.has_pseudo_class("hover"));
        assert!(!el.has_class("lead"));

        let prev = el.previous_sibling().unwrap();
        assert_eq!(prev.element_id(), first);
        assert!(prev.has_class("lead"));
        assert!(prev.previous_sibling().is_none());

        let parent = el.parent().unwrap();
        assert_eq!(parent.tag(), "body");
        assert!(parent.parent().is_none());
    }
}
