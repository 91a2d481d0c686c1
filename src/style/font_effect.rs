//! Font effects: `font-effect: shadow(2px 2px #000), outline(1px red);`
//!
//! Font effects have no named at-rule; every list item is an inline
//! shorthand. Lengths are in pixels.

use std::ops::Deref;
use std::sync::Arc;

use crate::css::color::Color;
use crate::style::registry::{
    CustomData, FontEffectType, InstanceArgs, InstanceError, InstancerRegistry,
};

const WHITE: Color = Color::rgb(255, 255, 255);

/// What a font effect renders.
#[derive(Debug, Clone, PartialEq)]
pub enum FontEffectKind {
    Shadow {
        offset_x: f32,
        offset_y: f32,
        color: Color,
    },
    Outline {
        width: f32,
        color: Color,
    },
    Glow {
        width_outline: f32,
        width_blur: f32,
        offset_x: f32,
        offset_y: f32,
        color: Color,
    },
    Blur {
        width: f32,
        color: Color,
    },
    /// Produced by a host-registered factory.
    Custom(CustomData),
}

/// An instantiated font effect.
#[derive(Debug, Clone, PartialEq)]
pub struct FontEffect {
    pub effect_type: String,
    pub kind: FontEffectKind,
}

/// Resolved value of a `font-effect` property. Equality is element-wise
/// identity.
#[derive(Debug, Clone, Default)]
pub struct FontEffectList(Vec<Arc<FontEffect>>);

impl FontEffectList {
    pub fn new(effects: Vec<Arc<FontEffect>>) -> Self {
        Self(effects)
    }
}

impl Deref for FontEffectList {
    type Target = [Arc<FontEffect>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Arc<FontEffect>> for FontEffectList {
    fn from_iter<I: IntoIterator<Item = Arc<FontEffect>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl PartialEq for FontEffectList {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

pub(crate) fn register_builtins(registry: &mut InstancerRegistry) {
    registry.register_font_effect(
        "shadow",
        FontEffectType {
            shorthand: &["offset-x", "offset-y", "color"],
            factory: shadow,
        },
    );
    registry.register_font_effect(
        "outline",
        FontEffectType {
            shorthand: &["width", "color"],
            factory: outline,
        },
    );
    registry.register_font_effect(
        "glow",
        FontEffectType {
            shorthand: &["width-outline", "width-blur", "offset-x", "offset-y", "color"],
            factory: glow,
        },
    );
    registry.register_font_effect(
        "blur",
        FontEffectType {
            shorthand: &["width", "color"],
            factory: blur,
        },
    );
}

fn shadow(args: &InstanceArgs<'_>) -> Result<FontEffectKind, InstanceError> {
    Ok(FontEffectKind::Shadow {
        offset_x: args.length("offset-x", 0.0)?,
        offset_y: args.length("offset-y", 0.0)?,
        color: args.color("color", WHITE)?,
    })
}

fn outline(args: &InstanceArgs<'_>) -> Result<FontEffectKind, InstanceError> {
    args.require("width")?;
    Ok(FontEffectKind::Outline {
        width: args.length("width", 0.0)?,
        color: args.color("color", WHITE)?,
    })
}

fn glow(args: &InstanceArgs<'_>) -> Result<FontEffectKind, InstanceError> {
    Ok(FontEffectKind::Glow {
        width_outline: args.length("width-outline", 0.0)?,
        width_blur: args.length("width-blur", 0.0)?,
        offset_x: args.length("offset-x", 0.0)?,
        offset_y: args.length("offset-y", 0.0)?,
        color: args.color("color", WHITE)?,
    })
}

fn blur(args: &InstanceArgs<'_>) -> Result<FontEffectKind, InstanceError> {
    args.require("width")?;
    Ok(FontEffectKind::Blur {
        width: args.length("width", 0.0)?,
        color: args.color("color", WHITE)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::shorthand::bind_arguments;
    use crate::style::sprite::SpritesheetList;

    fn build(type_name: &str, args: &[&str]) -> Result<FontEffectKind, InstanceError> {
        let registry = InstancerRegistry::with_defaults();
        let ty = registry.font_effect(type_name).copied().ok_or_else(|| InstanceError::UnknownType {
            kind: "font effect",
            name: type_name.into(),
        })?;
        let properties = bind_arguments(type_name, ty.shorthand, args)?;
        registry
            .instance_font_effect(type_name, &properties, &SpritesheetList::new())
            .map(|e| e.kind)
    }

    #[test]
    fn shadow_effect() {
        assert_eq!(
            build("shadow", &["2px", "3px", "#000"]),
            Ok(FontEffectKind::Shadow {
                offset_x: 2.0,
                offset_y: 3.0,
                color: Color::rgb(0, 0, 0),
            })
        );
    }

    #[test]
    fn outline_defaults_to_white() {
        assert_eq!(
            build("outline", &["1px"]),
            Ok(FontEffectKind::Outline {
                width: 1.0,
                color: WHITE
            })
        );
        assert!(build("outline", &[]).is_err());
    }

    #[test]
    fn glow_effect() {
        assert!(matches!(
            build("glow", &["1px", "4px", "0", "0", "yellow"]),
            Ok(FontEffectKind::Glow { width_blur, .. }) if width_blur == 4.0
        ));
    }

    #[test]
    fn invalid_length_is_rejected() {
        let err = build("blur", &["wide"]).unwrap_err();
        assert!(matches!(err, InstanceError::InvalidProperty { property, .. } if property == "width"));
    }
}
