//! Instancer registry: decorator and font-effect type names → factories.
//!
//! [`InstancerRegistry`] maps a type name (`image`, `gradient`, `shadow`, ...)
//! to a plain factory function that turns a property dictionary into a tagged
//! instance. The `with_defaults()` constructor installs the built-in types.
//! Hosts add their own types with [`InstancerRegistry::register_decorator`]
//! and [`InstancerRegistry::register_font_effect`], typically returning a
//! `Custom` payload.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::css::color::Color;
use crate::css::parser::parse_values;
use crate::css::scalar::{Scalar, Unit};
use crate::style::decorator::{self, Decorator, DecoratorKind, ImageSource};
use crate::style::font_effect::{self, FontEffect, FontEffectKind};
use crate::style::sprite::SpritesheetList;

/// Errors from instancing a decorator or font effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InstanceError {
    #[error("unknown {kind} type '{name}'")]
    UnknownType { kind: &'static str, name: String },
    #[error("unknown decorator '{0}'")]
    UnknownName(String),
    #[error("malformed list item '{0}'")]
    Malformed(String),
    #[error("too many arguments for '{type_name}': expected at most {expected}, got {got}")]
    TooManyArguments {
        type_name: String,
        expected: usize,
        got: usize,
    },
    #[error("'{type_name}' requires property '{property}'")]
    MissingProperty { type_name: String, property: String },
    #[error("invalid value '{value}' for '{type_name}' property '{property}'")]
    InvalidProperty {
        type_name: String,
        property: String,
        value: String,
    },
}

// ---------------------------------------------------------------------------
// CustomData
// ---------------------------------------------------------------------------

/// Opaque payload produced by a host-registered factory.
///
/// Equality is identity.
#[derive(Clone)]
pub struct CustomData(pub Arc<dyn Any + Send + Sync>);

impl CustomData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for CustomData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CustomData(..)")
    }
}

impl PartialEq for CustomData {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ---------------------------------------------------------------------------
// InstanceArgs
// ---------------------------------------------------------------------------

/// The properties a factory is instancing from, with typed accessors.
#[derive(Debug, Clone, Copy)]
pub struct InstanceArgs<'a> {
    type_name: &'a str,
    properties: &'a BTreeMap<String, String>,
    sprites: &'a SpritesheetList,
}

impl<'a> InstanceArgs<'a> {
    pub fn new(
        type_name: &'a str,
        properties: &'a BTreeMap<String, String>,
        sprites: &'a SpritesheetList,
    ) -> Self {
        Self {
            type_name,
            properties,
            sprites,
        }
    }

    pub fn type_name(&self) -> &'a str {
        self.type_name
    }

    /// Raw text of a property, if present.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.properties.get(name).map(|v| v.trim())
    }

    pub fn require(&self, name: &str) -> Result<&'a str, InstanceError> {
        self.get(name).ok_or_else(|| InstanceError::MissingProperty {
            type_name: self.type_name.to_string(),
            property: name.to_string(),
        })
    }

    /// Build an [`InstanceError::InvalidProperty`] for `name`.
    pub fn invalid(&self, name: &str, value: &str) -> InstanceError {
        InstanceError::InvalidProperty {
            type_name: self.type_name.to_string(),
            property: name.to_string(),
            value: value.to_string(),
        }
    }

    /// An image property: a sprite name if the sheet knows one, else a path.
    pub fn image(&self, name: &str) -> Option<ImageSource> {
        self.get(name).map(|value| {
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            match self.sprites.get_sprite(value) {
                Some(sprite) => ImageSource::Sprite(sprite.clone()),
                None => ImageSource::File(value.to_string()),
            }
        })
    }

    pub fn require_image(&self, name: &str) -> Result<ImageSource, InstanceError> {
        self.require(name)?;
        self.image(name).ok_or_else(|| self.invalid(name, ""))
    }

    /// A color property, or `default` when absent.
    pub fn color(&self, name: &str, default: Color) -> Result<Color, InstanceError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => Color::parse(value).ok_or_else(|| self.invalid(name, value)),
        }
    }

    /// A pixel length property (`2px` or `2`), or `default` when absent.
    pub fn length(&self, name: &str, default: f32) -> Result<f32, InstanceError> {
        let Some(value) = self.get(name) else {
            return Ok(default);
        };
        let scalar = match parse_values(value).ok().as_deref() {
            Some([v]) => Scalar::from_value(v),
            _ => None,
        };
        match scalar {
            Some(Scalar {
                value,
                unit: Unit::Px | Unit::Dp | Unit::Number,
            }) => Ok(value),
            _ => Err(self.invalid(name, value)),
        }
    }

    /// One of `allowed` (case-insensitive), or `None` when absent.
    pub fn keyword(&self, name: &str, allowed: &[&'static str]) -> Result<Option<&'static str>, InstanceError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => allowed
                .iter()
                .find(|k| k.eq_ignore_ascii_case(value))
                .map(|k| Some(*k))
                .ok_or_else(|| self.invalid(name, value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

pub type DecoratorFactory = fn(&InstanceArgs<'_>) -> Result<DecoratorKind, InstanceError>;
pub type FontEffectFactory = fn(&InstanceArgs<'_>) -> Result<FontEffectKind, InstanceError>;

/// A registered decorator type.
#[derive(Debug, Clone, Copy)]
pub struct DecoratorType {
    /// Property names bound, in order, to `type(args)` shorthand arguments.
    pub shorthand: &'static [&'static str],
    pub factory: DecoratorFactory,
}

/// A registered font-effect type.
#[derive(Debug, Clone, Copy)]
pub struct FontEffectType {
    /// Property names bound, in order, to `type(args)` shorthand arguments.
    pub shorthand: &'static [&'static str],
    pub factory: FontEffectFactory,
}

/// Type name → factory tables for decorators and font effects.
#[derive(Debug, Clone, Default)]
pub struct InstancerRegistry {
    decorators: HashMap<String, DecoratorType>,
    font_effects: HashMap<String, FontEffectType>,
}

impl InstancerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in types.
    ///
    /// Decorators: `image`, `tiled-horizontal`, `tiled-vertical`,
    /// `tiled-box`, `gradient`.
    /// Font effects: `shadow`, `outline`, `glow`, `blur`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        decorator::register_builtins(&mut registry);
        font_effect::register_builtins(&mut registry);
        registry
    }

    /// Register a decorator type. Replaces (and returns) any existing type of
    /// the same name.
    pub fn register_decorator(&mut self, name: impl Into<String>, ty: DecoratorType) -> Option<DecoratorType> {
        self.decorators.insert(name.into(), ty)
    }

    /// Register a font-effect type. Replaces (and returns) any existing type
    /// of the same name.
    pub fn register_font_effect(&mut self, name: impl Into<String>, ty: FontEffectType) -> Option<FontEffectType> {
        self.font_effects.insert(name.into(), ty)
    }

    pub fn decorator(&self, name: &str) -> Option<&DecoratorType> {
        self.decorators.get(name)
    }

    pub fn font_effect(&self, name: &str) -> Option<&FontEffectType> {
        self.font_effects.get(name)
    }

    /// Run the factory registered for `type_name`.
    pub fn instance_decorator(
        &self,
        type_name: &str,
        properties: &BTreeMap<String, String>,
        sprites: &SpritesheetList,
    ) -> Result<Decorator, InstanceError> {
        let ty = self.decorator(type_name).ok_or_else(|| InstanceError::UnknownType {
            kind: "decorator",
            name: type_name.to_string(),
        })?;
        let kind = (ty.factory)(&InstanceArgs::new(type_name, properties, sprites))?;
        Ok(Decorator {
            decorator_type: type_name.to_string(),
            kind,
        })
    }

    /// Run the factory registered for `type_name`.
    pub fn instance_font_effect(
        &self,
        type_name: &str,
        properties: &BTreeMap<String, String>,
        sprites: &SpritesheetList,
    ) -> Result<FontEffect, InstanceError> {
        let ty = self.font_effect(type_name).ok_or_else(|| InstanceError::UnknownType {
            kind: "font effect",
            name: type_name.to_string(),
        })?;
        let kind = (ty.factory)(&InstanceArgs::new(type_name, properties, sprites))?;
        Ok(FontEffect {
            effect_type: type_name.to_string(),
            kind,
        })
    }
}
