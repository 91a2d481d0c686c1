//! Tree operations: insert, remove, walk, sibling lookup.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::element::ElementRef;
use super::node::{ElementData, ElementId};

/// Empty slice constant for returning when an element has no children.
const EMPTY_CHILDREN: &[ElementId] = &[];

/// A document tree, backed by a slotmap arena.
///
/// All elements live in a single `SlotMap`. Parent/child relationships are
/// stored in secondary maps so that removal is O(subtree size) and lookup is
/// O(1).
#[derive(Debug)]
pub struct Document {
    elements: SlotMap<ElementId, ElementData>,
    children: SecondaryMap<ElementId, Vec<ElementId>>,
    parent: SecondaryMap<ElementId, ElementId>,
    root: Option<ElementId>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            elements: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            root: None,
        }
    }

    /// Insert a parentless element. The first one becomes the root.
    pub fn insert(&mut self, data: ElementData) -> ElementId {
        let id = self.elements.insert(data);
        self.children.insert(id, Vec::new());
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert an element as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics (debug) if `parent` does not exist in the tree.
    pub fn insert_child(&mut self, parent: ElementId, data: ElementData) -> ElementId {
        debug_assert!(
            self.elements.contains_key(parent),
            "parent element does not exist"
        );
        let id = self.elements.insert(data);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        id
    }

    /// Remove an element and all its descendants.
    ///
    /// Returns the data of the removed element, or `None` if it didn't exist.
    pub fn remove(&mut self, id: ElementId) -> Option<ElementData> {
        if !self.elements.contains_key(id) {
            return None;
        }

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }

        if self.root == Some(id) {
            self.root = None;
        }

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            let data = self.elements.remove(current);
            if current == id {
                removed = data;
            }
        }

        removed
    }

    /// Get the parent of an element, if it has one.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.parent.get(id).copied()
    }

    /// Children in document order. Empty if the element has none or does not
    /// exist.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// The sibling immediately before `id` under the same parent.
    pub fn previous_sibling(&self, id: ElementId) -> Option<ElementId> {
        let siblings = self.children(self.parent(id)?);
        let index = siblings.iter().position(|&s| s == id)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    /// Ancestor ids from the immediate parent up to the root.
    pub fn ancestors(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// Immutable access to an element's data.
    pub fn get(&self, id: ElementId) -> Option<&ElementData> {
        self.elements.get(id)
    }

    /// Mutable access to an element's data.
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementData> {
        self.elements.get_mut(id)
    }

    /// A styleable handle to an element.
    pub fn element(&self, id: ElementId) -> Option<ElementRef<'_>> {
        ElementRef::new(self, id)
    }

    /// The current root element, if set.
    pub fn root(&self) -> Option<ElementId> {
        self.root
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.elements.contains_key(current) {
                continue;
            }
            result.push(current);
            // Push children in reverse so the first child is visited first.
            stack.extend(self.children(current).iter().rev());
        }
        result
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a small test tree:
    /// ```text
    ///       body
    ///      /    \
    ///    a        b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Document, ElementId, ElementId, ElementId, ElementId, ElementId) {
        let mut doc = Document::new();
        let body = doc.insert(ElementData::new("body"));
        let a = doc.insert_child(body, ElementData::new("div").with_id("a").with_class("left"));
        let b = doc.insert_child(body, ElementData::new("div").with_id("b").with_class("right"));
        let c = doc.insert_child(a, ElementData::new("button").with_id("c"));
        let d = doc.insert_child(a, ElementData::new("p").with_id("d"));
        (doc, body, a, b, c, d)
    }

    #[test]
    fn insert_sets_root() {
        let mut doc = Document::new();
        let first = doc.insert(ElementData::new("body"));
        let _second = doc.insert(ElementData::new("body"));
        assert_eq!(doc.root(), Some(first));
    }

    #[test]
    fn parent_and_children() {
        let (doc, body, a, b, c, d) = build_tree();
        assert_eq!(doc.parent(a), Some(body));
        assert_eq!(doc.parent(body), None);
        assert_eq!(doc.children(body), &[a, b]);
        assert_eq!(doc.children(a), &[c, d]);
        assert!(doc.children(c).is_empty());
    }

    #[test]
    fn previous_sibling() {
        let (doc, body, a, b, c, d) = build_tree();
        assert_eq!(doc.previous_sibling(b), Some(a));
        assert_eq!(doc.previous_sibling(d), Some(c));
        assert_eq!(doc.previous_sibling(a), None);
        assert_eq!(doc.previous_sibling(body), None);
    }

    #[test]
    fn ancestors() {
        let (doc, body, a, _b, c, _d) = build_tree();
        assert_eq!(doc.ancestors(c), vec![a, body]);
        assert!(doc.ancestors(body).is_empty());
    }

    #[test]
    fn remove_subtree() {
        let (mut doc, body, a, b, c, d) = build_tree();
        assert_eq!(doc.remove(a).map(|data| data.tag), Some("div".to_string()));
        assert!(!doc.contains(c));
        assert!(!doc.contains(d));
        assert_eq!(doc.children(body), &[b]);
        assert_eq!(doc.len(), 2);
        assert!(doc.remove(a).is_none());
        assert!(doc.element(a).is_none());
    }

    #[test]
    fn remove_root() {
        let (mut doc, body, ..) = build_tree();
        doc.remove(body);
        assert!(doc.is_empty());
        assert_eq!(doc.root(), None);
    }

    #[test]
    fn walk_depth_first() {
        let (doc, body, a, b, c, d) = build_tree();
        assert_eq!(doc.walk_depth_first(body), vec![body, a, c, d, b]);
        assert_eq!(doc.walk_depth_first(a), vec![a, c, d]);
    }

    #[test]
    fn get_mut_changes_state() {
        let (mut doc, _body, a, ..) = build_tree();
        if let Some(data) = doc.get_mut(a) {
            data.set_pseudo_class("hover", true);
        }
        assert!(doc.get(a).unwrap().has_pseudo_class("hover"));
    }
}
