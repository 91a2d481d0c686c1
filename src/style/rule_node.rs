//! Rule node tree: a prefix tree of selector segments.
//!
//! Each node is one compound selector plus the combinator joining it to its
//! parent. Rules sharing a selector prefix share the nodes for that prefix;
//! declarations live on the node where their selector ends. The root is a
//! structural anchor that matches nothing.
//!
//! ```text
//!            root
//!           /    \
//!        div      .menu
//!         |          \ (>)
//!       p.note        a:hover
//! ```
//!
//! Matching is right to left: the terminal node's qualifier is checked
//! against the element, then each ancestor node against the element's
//! ancestors or preceding siblings, as its combinator dictates.

use std::fmt;

use slotmap::{new_key_type, SlotMap};

use crate::css::model::{Combinator, CompoundSelector, Selector, SelectorComponent};
use crate::css::properties::PropertyDictionary;
use crate::css::specificity::Specificity;
use crate::dom::element::StyledElement;

new_key_type! {
    /// Identifier of a node in a [`RuleTree`].
    pub struct RuleNodeId;
}

// ---------------------------------------------------------------------------
// Qualifier
// ---------------------------------------------------------------------------

/// One selector segment in canonical form.
///
/// Classes and pseudo-classes are sorted and de-duplicated so that `.a.b`
/// and `.b.a` share a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Qualifier {
    /// `None` matches any tag.
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub pseudo_classes: Vec<String>,
    /// How this segment relates to the segment before it.
    pub combinator: Combinator,
}

impl Qualifier {
    pub fn from_compound(compound: &CompoundSelector, combinator: Combinator) -> Self {
        let mut qualifier = Qualifier {
            combinator,
            ..Qualifier::default()
        };
        for component in &compound.components {
            match component {
                SelectorComponent::Type(tag) => qualifier.tag = Some(tag.clone()),
                SelectorComponent::Id(id) => qualifier.id = Some(id.clone()),
                SelectorComponent::Class(class) => qualifier.classes.push(class.clone()),
                SelectorComponent::PseudoClass(p) => qualifier.pseudo_classes.push(p.clone()),
                SelectorComponent::Universal => {}
            }
        }
        qualifier.classes.sort();
        qualifier.classes.dedup();
        qualifier.pseudo_classes.sort();
        qualifier.pseudo_classes.dedup();
        qualifier
    }

    /// Whether the element itself satisfies this segment (combinator aside).
    pub fn matches<E: StyledElement>(&self, element: &E) -> bool {
        self.tag.as_deref().is_none_or(|tag| tag == element.tag())
            && self.id.as_deref().is_none_or(|id| element.id() == Some(id))
            && self.classes.iter().all(|c| element.has_class(c))
            && self.pseudo_classes.iter().all(|p| element.has_pseudo_class(p))
    }

    /// Specificity of this segment alone.
    pub fn specificity(&self) -> Specificity {
        Specificity {
            id_count: u16::from(self.id.is_some()),
            class_count: (self.classes.len() + self.pseudo_classes.len()).min(u16::MAX as usize) as u16,
            type_count: u16::from(self.tag.is_some()),
        }
    }

    /// Returns `true` if the segment constrains nothing (`*`).
    pub fn is_universal(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.pseudo_classes.is_empty()
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_universal() {
            return f.write_str("*");
        }
        if let Some(tag) = &self.tag {
            f.write_str(tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for pseudo in &self.pseudo_classes {
            write!(f, ":{pseudo}")?;
        }
        Ok(())
    }
}

/// Outcome of matching a selector chain from one element upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChainMatch {
    Matched,
    /// Failed here; an earlier sibling of this element may still match.
    RetryLaterSibling,
    /// Failed for this element and its siblings; only a farther ancestor
    /// of an enclosing descendant step can help.
    RetryDescendant,
    /// No candidate anywhere up the tree can match.
    FailedGlobally,
}

// ---------------------------------------------------------------------------
// RuleNode
// ---------------------------------------------------------------------------

/// One node of a [`RuleTree`].
#[derive(Debug, Clone)]
pub struct RuleNode {
    qualifier: Qualifier,
    /// Sum over this node and its ancestors.
    specificity: Specificity,
    properties: PropertyDictionary,
    parent: Option<RuleNodeId>,
    /// In insertion order.
    children: Vec<RuleNodeId>,
}

impl RuleNode {
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    pub fn specificity(&self) -> Specificity {
        self.specificity
    }

    pub fn properties(&self) -> &PropertyDictionary {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyDictionary {
        &mut self.properties
    }

    pub fn parent(&self) -> Option<RuleNodeId> {
        self.parent
    }

    pub fn children(&self) -> &[RuleNodeId] {
        &self.children
    }
}

// ---------------------------------------------------------------------------
// RuleTree
// ---------------------------------------------------------------------------

/// Arena-backed rule node tree owned by one style sheet.
#[derive(Debug, Clone)]
pub struct RuleTree {
    nodes: SlotMap<RuleNodeId, RuleNode>,
    root: RuleNodeId,
}

impl RuleTree {
    /// Create a tree holding only the root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(RuleNode {
            qualifier: Qualifier::default(),
            specificity: Specificity::new(),
            properties: PropertyDictionary::new(),
            parent: None,
            children: Vec::new(),
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> RuleNodeId {
        self.root
    }

    pub fn get(&self, id: RuleNodeId) -> Option<&RuleNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: RuleNodeId) -> Option<&mut RuleNode> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes, root excluded.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert `selector`, reusing existing nodes for a shared prefix, and
    /// cascade `properties` into the terminal node. Returns the terminal node.
    pub fn insert(&mut self, selector: &Selector, properties: &PropertyDictionary) -> RuleNodeId {
        let mut current = self.root;
        for (combinator, compound) in selector.segments() {
            current = self.child_or_insert(current, Qualifier::from_compound(compound, combinator));
        }
        debug_assert!(current != self.root, "empty selector");

        if let Some(node) = self.nodes.get_mut(current) {
            node.properties.merge(properties);
        }
        current
    }

    /// Deep-merge `other` into this tree, shifting the layers of its
    /// declarations up by `layer_offset`.
    pub fn merge(&mut self, other: &RuleTree, layer_offset: u32) {
        // (node in `other`, matching node in `self`)
        let mut stack = vec![(other.root, self.root)];
        while let Some((theirs, ours)) = stack.pop() {
            let Some(their_node) = other.nodes.get(theirs) else {
                continue;
            };
            if theirs != other.root {
                if let Some(node) = self.nodes.get_mut(ours) {
                    node.properties.import(&their_node.properties, layer_offset);
                }
            }
            // Children are created in order; the stack visits them reversed.
            let mapped: Vec<(RuleNodeId, RuleNodeId)> = their_node
                .children
                .iter()
                .filter_map(|&child| {
                    let qualifier = other.nodes.get(child)?.qualifier.clone();
                    Some((child, self.child_or_insert(ours, qualifier)))
                })
                .collect();
            stack.extend(mapped.into_iter().rev());
        }
    }

    /// The child of `parent` with `qualifier`, created if absent.
    fn child_or_insert(&mut self, parent: RuleNodeId, qualifier: Qualifier) -> RuleNodeId {
        let Some(parent_node) = self.nodes.get(parent) else {
            return parent;
        };
        if let Some(&existing) = parent_node
            .children
            .iter()
            .find(|&&child| self.nodes.get(child).is_some_and(|n| n.qualifier == qualifier))
        {
            return existing;
        }

        let specificity = parent_node.specificity + qualifier.specificity();
        let id = self.nodes.insert(RuleNode {
            qualifier,
            specificity,
            properties: PropertyDictionary::new(),
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(id);
        }
        id
    }

    /// Pre-order traversal of every node except the root, children in
    /// insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleNodeId, &RuleNode)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<RuleNodeId> = self.children_of(self.root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.children_of(id).iter().rev());
        }
        order
            .into_iter()
            .filter_map(move |id| self.nodes.get(id).map(|node| (id, node)))
    }

    /// Mutable access to every node's properties (root included; it has
    /// none).
    pub fn properties_mut(&mut self) -> impl Iterator<Item = &mut PropertyDictionary> {
        self.nodes.values_mut().map(|node| &mut node.properties)
    }

    /// Drop every instantiated list value in the tree.
    pub fn reset_deferred(&mut self) {
        self.properties_mut().for_each(PropertyDictionary::reset_deferred);
    }

    fn children_of(&self, id: RuleNodeId) -> &[RuleNodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Whether the selector chain ending at `node` matches `element`.
    pub fn is_applicable<E: StyledElement>(&self, node: RuleNodeId, element: &E) -> bool {
        match self.nodes.get(node) {
            Some(n) if node != self.root => self.match_from(n, element) == ChainMatch::Matched,
            _ => false,
        }
    }

    /// Match the chain ending at `node` against `element`, right to left.
    ///
    /// Descendant and general-sibling steps try farther candidates when a
    /// nearer one fails, but a failure reports how far back a retry can
    /// still succeed, so each step scans its candidates at most once per
    /// restart point instead of enumerating every ancestor combination.
    fn match_from<E: StyledElement>(&self, node: &RuleNode, element: &E) -> ChainMatch {
        if !node.qualifier.matches(element) {
            return ChainMatch::RetryLaterSibling;
        }
        let Some(parent_id) = node.parent.filter(|&p| p != self.root) else {
            return ChainMatch::Matched;
        };
        let Some(parent) = self.nodes.get(parent_id) else {
            return ChainMatch::FailedGlobally;
        };

        let combinator = node.qualifier.combinator;
        let is_sibling = matches!(combinator, Combinator::AdjacentSibling | Combinator::GeneralSibling);
        let next = |e: &E| if is_sibling { e.previous_sibling() } else { e.parent() };

        let mut candidate = next(element);
        while let Some(current) = candidate {
            let result = self.match_from(parent, &current);
            match (result, combinator) {
                (ChainMatch::Matched | ChainMatch::FailedGlobally, _) | (_, Combinator::AdjacentSibling) => {
                    return result
                }
                (_, Combinator::Child) => return ChainMatch::RetryDescendant,
                (ChainMatch::RetryDescendant, Combinator::GeneralSibling) => return result,
                _ => {}
            }
            candidate = next(&current);
        }

        // Out of siblings: an enclosing descendant step may still find
        // another ancestor. Out of ancestors: nothing further up can match.
        if is_sibling {
            ChainMatch::RetryDescendant
        } else {
            ChainMatch::FailedGlobally
        }
    }

    /// The selector text of the chain ending at `node`, e.g. `div > p.note`.
    pub fn selector_text(&self, node: RuleNodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current.filter(|&id| id != self.root) {
            let Some(n) = self.nodes.get(id) else { break };
            segments.push(n);
            current = n.parent;
        }

        let mut text = String::new();
        for (i, n) in segments.iter().rev().enumerate() {
            if i > 0 {
                text.push_str(match n.qualifier.combinator {
                    Combinator::Descendant => " ",
                    Combinator::Child => " > ",
                    Combinator::AdjacentSibling => " + ",
                    Combinator::GeneralSibling => " ~ ",
                });
            }
            text.push_str(&n.qualifier.to_string());
        }
        text
    }
}

impl Default for RuleTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::css::parser::parse_css;
    use crate::dom::element::ElementRef;
    use crate::dom::{Document, ElementData};

    fn selector(text: &str) -> Selector {
        let sheet = parse_css(&format!("{text} {{ }}")).unwrap();
        sheet.rules[0].selectors[0].clone()
    }

    fn compound(text: &str) -> CompoundSelector {
        selector(text).segments()[0].1.clone()
    }

    fn tree_of(selectors: &[&str]) -> (RuleTree, Vec<RuleNodeId>) {
        let mut tree = RuleTree::new();
        let ids = selectors
            .iter()
            .map(|s| tree.insert(&selector(s), &PropertyDictionary::new()))
            .collect();
        (tree, ids)
    }

    // ── Qualifier ────────────────────────────────────────────────────

    #[test]
    fn qualifier_is_canonical() {
        let a = Qualifier::from_compound(&compound(".b.a.b:hover"), Combinator::Child);
        let b = Qualifier::from_compound(&compound(".a:hover.b"), Combinator::Child);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), ".a.b:hover");
        assert_eq!(a.specificity().class_count, 3);
        assert_eq!(Qualifier::default().to_string(), "*");
    }

    #[test]
    fn qualifier_matches_element() {
        let mut doc = Document::new();
        let id = doc.insert(ElementData::new("p").with_id("x").with_classes(["a", "b"]).with_pseudo_class("hover"));
        let el = doc.element(id).unwrap();

        let q = |text: &str| Qualifier::from_compound(&compound(text), Combinator::Descendant);
        assert!(q("p#x.a:hover").matches(&el));
        assert!(q("*").matches(&el));
        assert!(q(".b").matches(&el));
        assert!(!q("div").matches(&el));
        assert!(!q("p.c").matches(&el));
        assert!(!q("p:focus").matches(&el));
        assert!(!q("#y").matches(&el));
    }

    // ── Construction ─────────────────────────────────────────────────

    #[test]
    fn shared_prefixes_share_nodes() {
        let (tree, ids) = tree_of(&["div p", "div span", "div p", "div > p"]);
        // div, p, span, >p
        assert_eq!(tree.len(), 4);
        assert_eq!(ids[0], ids[2]);
        assert_ne!(ids[0], ids[3]);

        let div = tree.get(ids[0]).and_then(|n| n.parent()).unwrap();
        assert_eq!(tree.get(div).unwrap().children(), &[ids[0], ids[1], ids[3]]);
        assert_eq!(tree.selector_text(ids[3]), "div > p");
    }

    #[test]
    fn cumulative_specificity() {
        let (tree, ids) = tree_of(&["#nav a:hover"]);
        assert_eq!(
            tree.get(ids[0]).unwrap().specificity(),
            Specificity {
                id_count: 1,
                class_count: 1,
                type_count: 1
            }
        );
    }

    #[test]
    fn iter_is_preorder_in_insertion_order() {
        let (tree, _) = tree_of(&["a b", "c", "a d"]);
        let texts: Vec<String> = tree.iter().map(|(id, _)| tree.selector_text(id)).collect();
        assert_eq!(texts, vec!["a", "a b", "a d", "c"]);
    }

    #[test]
    fn merge_maps_equivalent_nodes() {
        let (mut base, _) = tree_of(&["a b", "c"]);
        let (overlay, _) = tree_of(&["a b", "a e", "f + g"]);
        base.merge(&overlay, 1);
        let texts: Vec<String> = base.iter().map(|(id, _)| base.selector_text(id)).collect();
        assert_eq!(texts, vec!["a", "a b", "a e", "c", "f", "f + g"]);
    }

    // ── Matching ─────────────────────────────────────────────────────

    #[test]
    fn descendant_matching_backtracks() {
        // section.x > div > ... > div > p: the nearest div's parent is not
        // section.x, but a farther div's is.
        let mut doc = Document::new();
        let section = doc.insert(ElementData::new("section").with_class("x"));
        let outer = doc.insert_child(section, ElementData::new("div"));
        let inner = doc.insert_child(outer, ElementData::new("div"));
        let p = doc.insert_child(inner, ElementData::new("p"));

        let (tree, ids) = tree_of(&["section.x > div p", "section.y > div p", "div div p"]);
        let el = doc.element(p).unwrap();
        assert!(tree.is_applicable(ids[0], &el));
        assert!(!tree.is_applicable(ids[1], &el));
        assert!(tree.is_applicable(ids[2], &el));
    }

    #[test]
    fn child_matching() {
        let mut doc = Document::new();
        let ul = doc.insert(ElementData::new("ul"));
        let li = doc.insert_child(ul, ElementData::new("li"));
        let a = doc.insert_child(li, ElementData::new("a"));

        let (tree, ids) = tree_of(&["ul > a", "li > a", "ul a"]);
        let el = doc.element(a).unwrap();
        assert!(!tree.is_applicable(ids[0], &el));
        assert!(tree.is_applicable(ids[1], &el));
        assert!(tree.is_applicable(ids[2], &el));
    }

    #[test]
    fn sibling_matching() {
        let mut doc = Document::new();
        let body = doc.insert(ElementData::new("body"));
        let _h1 = doc.insert_child(body, ElementData::new("h1"));
        let first = doc.insert_child(body, ElementData::new("p"));
        let second = doc.insert_child(body, ElementData::new("p"));

        let (tree, ids) = tree_of(&["h1 + p", "h1 ~ p", "p + p"]);
        let first = doc.element(first).unwrap();
        let second = doc.element(second).unwrap();
        assert!(tree.is_applicable(ids[0], &first));
        assert!(!tree.is_applicable(ids[0], &second));
        assert!(tree.is_applicable(ids[1], &first));
        assert!(tree.is_applicable(ids[1], &second));
        assert!(!tree.is_applicable(ids[2], &first));
        assert!(tree.is_applicable(ids[2], &second));
    }

    #[test]
    fn sibling_inside_descendant_step() {
        // body > (div.a, div > p): the p's parent has an earlier div.a sibling.
        let mut doc = Document::new();
        let body = doc.insert(ElementData::new("body"));
        let _a = doc.insert_child(body, ElementData::new("div").with_class("a"));
        let wrapper = doc.insert_child(body, ElementData::new("div"));
        let p = doc.insert_child(wrapper, ElementData::new("p"));

        let (tree, ids) = tree_of(&["div.a ~ div p", "div.a + div p", "body > div.a ~ div > p", "div.b ~ div p"]);
        let el = doc.element(p).unwrap();
        assert!(tree.is_applicable(ids[0], &el));
        assert!(tree.is_applicable(ids[1], &el));
        assert!(tree.is_applicable(ids[2], &el));
        assert!(!tree.is_applicable(ids[3], &el));
    }

    /// Counts every step up or across the tree.
    #[derive(Clone, Copy)]
    struct Counted<'a> {
        inner: ElementRef<'a>,
        steps: &'a Cell<usize>,
    }

    impl StyledElement for Counted<'_> {
        fn tag(&self) -> &str {
            self.inner.tag()
        }
        fn id(&self) -> Option<&str> {
            self.inner.id()
        }
        fn classes(&self) -> &[String] {
            self.inner.classes()
        }
        fn has_pseudo_class(&self, pseudo_class: &str) -> bool {
            self.inner.has_pseudo_class(pseudo_class)
        }
        fn parent(&self) -> Option<Self> {
            self.steps.set(self.steps.get() + 1);
            self.inner.parent().map(|inner| Counted { inner, ..*self })
        }
        fn previous_sibling(&self) -> Option<Self> {
            self.steps.set(self.steps.get() + 1);
            self.inner.previous_sibling().map(|inner| Counted { inner, ..*self })
        }
    }

    #[test]
    fn deep_chain_miss_is_bounded() {
        let depth = 40;
        let mut doc = Document::new();
        let mut current = doc.insert(ElementData::new("div"));
        for _ in 1..depth {
            current = doc.insert_child(current, ElementData::new("div"));
        }
        let span = doc.insert_child(current, ElementData::new("span"));

        let text = format!(".root {}span", "div ".repeat(10));
        let (tree, ids) = tree_of(&[text.as_str()]);

        let steps = Cell::new(0);
        let el = Counted {
            inner: doc.element(span).unwrap(),
            steps: &steps,
        };
        assert!(!tree.is_applicable(ids[0], &el));
        // Exhaustive backtracking would walk C(40, 10) ancestor combinations.
        assert!(steps.get() <= 11 * (depth + 1), "walked {} steps", steps.get());

        // The same chain still matches once the outermost div carries .root.
        let mut doc = Document::new();
        let mut current = doc.insert(ElementData::new("div").with_class("root"));
        for _ in 1..depth {
            current = doc.insert_child(current, ElementData::new("div"));
        }
        let span = doc.insert_child(current, ElementData::new("span"));
        assert!(tree.is_applicable(ids[0], &doc.element(span).unwrap()));
    }

    #[test]
    fn root_never_applies() {
        let mut doc = Document::new();
        let id = doc.insert(ElementData::new("p"));
        let tree = RuleTree::new();
        assert!(!tree.is_applicable(tree.root(), &doc.element(id).unwrap()));
        assert!(tree.is_empty());
    }
}
