//! Candidate lookup for rule nodes.
//!
//! Every terminal rule node is filed under one primary key taken from its own
//! qualifier: its id if it has one, else its first class, else its tag, else
//! the universal bucket. An element can only match a node whose key it
//! carries, so the candidates for an element are the union of the buckets for
//! its id, each of its classes, its tag and the universal bucket.

use std::collections::HashMap;

use crate::dom::element::StyledElement;
use crate::style::rule_node::{Qualifier, RuleNodeId};

/// The bucket a rule node is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexKey {
    Id(String),
    Class(String),
    Tag(String),
    Universal,
}

impl IndexKey {
    pub fn for_qualifier(qualifier: &Qualifier) -> Self {
        if let Some(id) = &qualifier.id {
            IndexKey::Id(id.clone())
        } else if let Some(class) = qualifier.classes.first() {
            IndexKey::Class(class.clone())
        } else if let Some(tag) = &qualifier.tag {
            IndexKey::Tag(tag.clone())
        } else {
            IndexKey::Universal
        }
    }
}

/// Rule nodes bucketed by [`IndexKey`].
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    by_id: HashMap<String, Vec<RuleNodeId>>,
    by_class: HashMap<String, Vec<RuleNodeId>>,
    by_tag: HashMap<String, Vec<RuleNodeId>>,
    universal: Vec<RuleNodeId>,
    len: usize,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, qualifier: &Qualifier, node: RuleNodeId) {
        let bucket = match IndexKey::for_qualifier(qualifier) {
            IndexKey::Id(id) => self.by_id.entry(id).or_default(),
            IndexKey::Class(class) => self.by_class.entry(class).or_default(),
            IndexKey::Tag(tag) => self.by_tag.entry(tag).or_default(),
            IndexKey::Universal => &mut self.universal,
        };
        bucket.push(node);
        self.len += 1;
    }

    /// The nodes filed under `key`.
    pub fn get(&self, key: &IndexKey) -> &[RuleNodeId] {
        let bucket = match key {
            IndexKey::Id(id) => self.by_id.get(id),
            IndexKey::Class(class) => self.by_class.get(class),
            IndexKey::Tag(tag) => self.by_tag.get(tag),
            IndexKey::Universal => return &self.universal,
        };
        bucket.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every node `element` could match, sorted and de-duplicated. The
    /// caller still has to run the full selector match on each.
    pub fn candidates<E: StyledElement>(&self, element: &E) -> Vec<RuleNodeId> {
        let mut nodes: Vec<RuleNodeId> = self.universal.clone();
        if let Some(bucket) = element.id().and_then(|id| self.by_id.get(id)) {
            nodes.extend_from_slice(bucket);
        }
        for class in element.classes() {
            if let Some(bucket) = self.by_class.get(class) {
                nodes.extend_from_slice(bucket);
            }
        }
        if let Some(bucket) = self.by_tag.get(element.tag()) {
            nodes.extend_from_slice(bucket);
        }
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::model::Selector;
    use crate::css::parser::parse_css;
    use crate::css::properties::PropertyDictionary;
    use crate::dom::{Document, ElementData};
    use crate::style::rule_node::RuleTree;

    fn build(selectors: &[&str]) -> (RuleTree, NodeIndex, Vec<RuleNodeId>) {
        let sheet = parse_css(&format!("{} {{ }}", selectors.join(", "))).unwrap();
        let mut tree = RuleTree::new();
        let ids: Vec<RuleNodeId> = sheet.rules[0]
            .selectors
            .iter()
            .map(|s: &Selector| tree.insert(s, &PropertyDictionary::new()))
            .collect();
        let mut index = NodeIndex::new();
        for &id in &ids {
            index.insert(tree.get(id).unwrap().qualifier(), id);
        }
        (tree, index, ids)
    }

    #[test]
    fn primary_key_priority() {
        let (tree, _, ids) = build(&["p#a.b", "p.b.c", "p:hover", "*", ":focus"]);
        let key = |i: usize| IndexKey::for_qualifier(tree.get(ids[i]).unwrap().qualifier());
        assert_eq!(key(0), IndexKey::Id("a".into()));
        assert_eq!(key(1), IndexKey::Class("b".into()));
        assert_eq!(key(2), IndexKey::Tag("p".into()));
        assert_eq!(key(3), IndexKey::Universal);
        assert_eq!(key(4), IndexKey::Universal);
    }

    #[test]
    fn candidates_cover_every_key() {
        let (_, index, ids) = build(&["#main", ".a", ".b", "div", "span", "*"]);
        assert_eq!(index.len(), 6);

        let mut doc = Document::new();
        let el = doc.insert(ElementData::new("div").with_id("main").with_classes(["b", "a"]));
        let mut candidates = index.candidates(&doc.element(el).unwrap());
        candidates.sort();

        let mut expected = vec![ids[0], ids[1], ids[2], ids[3], ids[5]];
        expected.sort();
        assert_eq!(candidates, expected);
    }

    #[test]
    fn candidates_are_deduplicated() {
        let mut index = NodeIndex::new();
        let (tree, _, ids) = build(&[".a"]);
        let qualifier = tree.get(ids[0]).unwrap().qualifier();
        index.insert(qualifier, ids[0]);
        index.insert(qualifier, ids[0]);

        let mut doc = Document::new();
        let el = doc.insert(ElementData::new("p").with_class("a"));
        assert_eq!(index.candidates(&doc.element(el).unwrap()), vec![ids[0]]);
    }

    #[test]
    fn clear_empties_index() {
        let (_, mut index, _) = build(&["a", "b"]);
        assert_eq!(index.get(&IndexKey::Tag("a".into())).len(), 1);
        index.clear();
        assert!(index.is_empty());
        assert!(index.get(&IndexKey::Tag("a".into())).is_empty());
    }
}
