//! The compiled style of one class of elements.

use std::fmt;
use std::sync::Arc;

use crate::css::properties::{Property, PropertyDictionary, PropertyId, PropertyValue};
use crate::style::decorator::Decorator;
use crate::style::font_effect::FontEffect;
use crate::style::keyframes::Animation;

/// Flattened properties of every rule node an element matched, with
/// decorator, font-effect and animation lists resolved.
///
/// Shared between all elements with the same match signature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementDefinition {
    properties: PropertyDictionary,
}

impl ElementDefinition {
    pub fn new(properties: PropertyDictionary) -> Self {
        Self { properties }
    }

    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(id)
    }

    pub fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.properties.value(id)
    }

    pub fn properties(&self) -> &PropertyDictionary {
        &self.properties
    }

    /// Resolved `decorator` list; empty if unset or nothing instanced.
    pub fn decorators(&self) -> &[Arc<Decorator>] {
        match self.properties.value(PropertyId::Decorator) {
            Some(PropertyValue::Decorators(d)) => d.resolved().map(|list| &list[..]).unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn font_effects(&self) -> &[Arc<FontEffect>] {
        match self.properties.value(PropertyId::FontEffect) {
            Some(PropertyValue::FontEffects(d)) => d.resolved().map(|list| &list[..]).unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn animations(&self) -> &[Animation] {
        match self.properties.value(PropertyId::Animation) {
            Some(PropertyValue::Animations(d)) => d.resolved().map(Vec::as_slice).unwrap_or(&[]),
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Display for ElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, property) in self.properties.iter() {
            writeln!(f, "{id}: {};", property.value)?;
        }
        Ok(())
    }
}
