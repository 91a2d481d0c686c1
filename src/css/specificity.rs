//! CSS specificity and the cascade precedence comparator.
//!
//! [`Specificity`] is the classic `(ids, classes, types)` triple, summed over
//! every compound selector in a chain. [`Precedence`] ranks two declarations
//! competing for the same property:
//!
//! ```text
//! (important, specificity, layer, order)
//! ```
//!
//! Fields are ordered so that the derived `Ord` (lexicographic) gives the
//! cascade result directly:
//! - `!important` beats normal declarations
//! - Higher selector specificity wins
//! - At equal specificity, the declaration from the later stylesheet layer
//!   wins; each load and each merged overlay gets a higher layer
//! - At equal layer, the later declaration wins

use std::ops::Add;

use crate::css::model::{CompoundSelector, Selector, SelectorComponent, SelectorPart};

/// Selector specificity as an `(id, class, type)` triple.
///
/// `Ord` is lexicographic: any id beats any number of classes, and any class
/// or pseudo-class beats any number of type selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    /// Number of ID selectors (`#id`).
    pub id_count: u16,
    /// Number of class + pseudo-class selectors (`.class`, `:hover`).
    pub class_count: u16,
    /// Number of type selectors (`div`, `button`).
    pub type_count: u16,
}

impl Specificity {
    /// Create a zero specificity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specificity of a single compound selector.
    pub fn from_compound(compound: &CompoundSelector) -> Self {
        let mut spec = Self::new();
        for component in &compound.components {
            match component {
                SelectorComponent::Id(_) => spec.id_count = spec.id_count.saturating_add(1),
                SelectorComponent::Class(_) | SelectorComponent::PseudoClass(_) => {
                    spec.class_count = spec.class_count.saturating_add(1)
                }
                SelectorComponent::Type(_) => spec.type_count = spec.type_count.saturating_add(1),
                // Universal selector has zero specificity.
                SelectorComponent::Universal => {}
            }
        }
        spec
    }

    /// Specificity of a full selector chain.
    pub fn from_selector(selector: &Selector) -> Self {
        selector
            .parts
            .iter()
            .filter_map(|part| match part {
                SelectorPart::Compound(compound) => Some(Self::from_compound(compound)),
                SelectorPart::Combinator(_) => None,
            })
            .fold(Self::new(), |acc, s| acc + s)
    }
}

impl Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Self) -> Self {
        Self {
            id_count: self.id_count.saturating_add(rhs.id_count),
            class_count: self.class_count.saturating_add(rhs.class_count),
            type_count: self.type_count.saturating_add(rhs.type_count),
        }
    }
}

/// Total ordering of competing declarations for one property.
///
/// Higher compares greater and wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Precedence {
    /// Whether the declaration carried `!important`.
    pub important: bool,
    /// Specificity of the selector chain the declaration belongs to.
    pub specificity: Specificity,
    /// Stylesheet layer: `specificity_offset` of the originating sheet.
    pub layer: u32,
    /// Declaration order within the layer.
    pub order: u32,
}

impl Precedence {
    pub fn new(specificity: Specificity, layer: u32, order: u32) -> Self {
        Self {
            important: false,
            specificity,
            layer,
            order,
        }
    }

    /// Mark as `!important` (builder).
    pub fn with_important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    /// The same declaration moved up by `offset` layers. Saturates rather
    /// than wrapping, so ordering between layers is never inverted.
    pub fn shifted(self, offset: u32) -> Self {
        Self {
            layer: self.layer.saturating_add(offset),
            ..self
        }
    }
}
