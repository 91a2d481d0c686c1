//! Shared element definitions keyed by the set of rule nodes that produced
//! them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use crate::style::definition::ElementDefinition;
use crate::style::rule_node::RuleNodeId;

/// Prune dead entries once the map grows past this many.
const INITIAL_PRUNE_THRESHOLD: usize = 64;

/// The sorted, de-duplicated ids of the rule nodes an element matched.
///
/// Elements with equal signatures receive the same definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature(Box<[RuleNodeId]>);

impl Signature {
    pub fn new(mut nodes: Vec<RuleNodeId>) -> Self {
        nodes.sort_unstable();
        nodes.dedup();
        Self(nodes.into_boxed_slice())
    }

    pub fn nodes(&self) -> &[RuleNodeId] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Weak map from [`Signature`] to compiled definition.
///
/// The cache never keeps a definition alive; it is freed once every holder
/// drops its `Arc`.
#[derive(Debug)]
pub struct DefinitionCache {
    entries: RefCell<HashMap<Signature, Weak<ElementDefinition>>>,
    prune_at: Cell<usize>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
            prune_at: Cell::new(INITIAL_PRUNE_THRESHOLD),
        }
    }

    /// The live definition for `signature`, or a fresh one from `compile`.
    ///
    /// `compile` runs without the map borrowed.
    pub fn get_or_insert_with(
        &self,
        signature: Signature,
        compile: impl FnOnce(&Signature) -> ElementDefinition,
    ) -> Arc<ElementDefinition> {
        if let Some(live) = self.entries.borrow().get(&signature).and_then(Weak::upgrade) {
            return live;
        }

        let definition = Arc::new(compile(&signature));
        let mut entries = self.entries.borrow_mut();
        entries.insert(signature, Arc::downgrade(&definition));

        if entries.len() >= self.prune_at.get() {
            entries.retain(|_, weak| weak.strong_count() > 0);
            self.prune_at.set((entries.len() * 2).max(INITIAL_PRUNE_THRESHOLD));
        }
        definition
    }

    /// Number of entries, dead ones included.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.prune_at.set(INITIAL_PRUNE_THRESHOLD);
    }
}

impl Default for DefinitionCache {
    fn default() -> Self {
        Self::new()
    }
}
