//! Decorators: named `@decorator` specifications and the built-in types.
//!
//! ```css
//! @decorator panel : tiled-box {
//!     top-left-image: panel-tl;
//!     center-image: panel-c;
//! }
//! div { decorator: panel, gradient(vertical #fff #000); }
//! ```
//!
//! A [`DecoratorSpecification`] is instantiated at most once; every consumer
//! of the name shares the resulting `Arc<Decorator>`.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use crate::css::color::Color;
use crate::css::model::DecoratorRule;
use crate::css::properties::SourceLocation;
use crate::style::registry::{
    CustomData, DecoratorType, InstanceArgs, InstanceError, InstancerRegistry,
};
use crate::style::sprite::{Sprite, SpritesheetList};

/// Where a decorator image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// A sprite declared in an `@spritesheet`.
    Sprite(Sprite),
    /// A plain image path.
    File(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientDirection {
    Horizontal,
    Vertical,
}

/// The nine tiles of a `tiled-box` decorator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoxTiles {
    pub top_left: Option<ImageSource>,
    pub top: Option<ImageSource>,
    pub top_right: Option<ImageSource>,
    pub left: Option<ImageSource>,
    pub center: Option<ImageSource>,
    pub right: Option<ImageSource>,
    pub bottom_left: Option<ImageSource>,
    pub bottom: Option<ImageSource>,
    pub bottom_right: Option<ImageSource>,
}

/// What a decorator draws.
#[derive(Debug, Clone, PartialEq)]
pub enum DecoratorKind {
    Image(ImageSource),
    TiledHorizontal {
        left: Option<ImageSource>,
        center: ImageSource,
        right: Option<ImageSource>,
    },
    TiledVertical {
        top: Option<ImageSource>,
        center: ImageSource,
        bottom: Option<ImageSource>,
    },
    TiledBox(Box<BoxTiles>),
    Gradient {
        direction: GradientDirection,
        start: Color,
        stop: Color,
    },
    /// Produced by a host-registered factory.
    Custom(CustomData),
}

/// An instantiated decorator.
#[derive(Debug, Clone, PartialEq)]
pub struct Decorator {
    /// The registered type name it was built from.
    pub decorator_type: String,
    pub kind: DecoratorKind,
}

/// Resolved value of a `decorator` property.
///
/// Equality is element-wise identity: two lists are equal when they share
/// the same instances in the same order.
#[derive(Debug, Clone, Default)]
pub struct DecoratorList(Vec<Arc<Decorator>>);

impl DecoratorList {
    pub fn new(decorators: Vec<Arc<Decorator>>) -> Self {
        Self(decorators)
    }
}

impl Deref for DecoratorList {
    type Target = [Arc<Decorator>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromIterator<Arc<Decorator>> for DecoratorList {
    fn from_iter<I: IntoIterator<Item = Arc<Decorator>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl PartialEq for DecoratorList {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().zip(&other.0).all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

// ---------------------------------------------------------------------------
// DecoratorSpecification
// ---------------------------------------------------------------------------

/// A named `@decorator` block, instantiated lazily.
#[derive(Debug)]
pub struct DecoratorSpecification {
    pub name: String,
    pub decorator_type: String,
    pub properties: BTreeMap<String, String>,
    pub source: SourceLocation,
    instance: OnceLock<Option<Arc<Decorator>>>,
}

impl Clone for DecoratorSpecification {
    /// Clones start uninstantiated: a copy may resolve sprites against a
    /// different sheet.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            decorator_type: self.decorator_type.clone(),
            properties: self.properties.clone(),
            source: self.source.clone(),
            instance: OnceLock::new(),
        }
    }
}

impl DecoratorSpecification {
    pub fn new(
        name: impl Into<String>,
        decorator_type: impl Into<String>,
        properties: BTreeMap<String, String>,
        source: SourceLocation,
    ) -> Self {
        Self {
            name: name.into(),
            decorator_type: decorator_type.into(),
            properties,
            source,
            instance: OnceLock::new(),
        }
    }

    pub fn from_rule(rule: &DecoratorRule, source_name: &Arc<str>) -> Self {
        let properties = rule
            .declarations
            .iter()
            .map(|decl| (decl.property.to_ascii_lowercase(), decl.raw.clone()))
            .collect();
        Self::new(
            rule.name.clone(),
            rule.decorator_type.clone(),
            properties,
            SourceLocation::new(source_name.clone(), rule.line),
        )
    }

    /// The shared instance, built on first call. A failed build is logged
    /// once and yields `None` from then on.
    pub fn instance(&self, registry: &InstancerRegistry, sprites: &SpritesheetList) -> Option<Arc<Decorator>> {
        self.instance
            .get_or_init(|| {
                match registry.instance_decorator(&self.decorator_type, &self.properties, sprites) {
                    Ok(decorator) => Some(Arc::new(decorator)),
                    Err(error) => {
                        tracing::warn!(
                            location = %self.source,
                            decorator = %self.name,
                            %error,
                            "failed to instance decorator"
                        );
                        None
                    }
                }
            })
            .clone()
    }

    pub fn is_instanced(&self) -> bool {
        self.instance.get().is_some()
    }
}

// ---------------------------------------------------------------------------
// Built-in types
// ---------------------------------------------------------------------------

pub(crate) fn register_builtins(registry: &mut InstancerRegistry) {
    registry.register_decorator(
        "image",
        DecoratorType {
            shorthand: &["image"],
            factory: image,
        },
    );
    registry.register_decorator(
        "tiled-horizontal",
        DecoratorType {
            shorthand: &["left-image", "center-image", "right-image"],
            factory: tiled_horizontal,
        },
    );
    registry.register_decorator(
        "tiled-vertical",
        DecoratorType {
            shorthand: &["top-image", "center-image", "bottom-image"],
            factory: tiled_vertical,
        },
    );
    registry.register_decorator(
        "tiled-box",
        DecoratorType {
            shorthand: &[
                "top-left-image",
                "top-image",
                "top-right-image",
                "left-image",
                "center-image",
                "right-image",
                "bottom-left-image",
                "bottom-image",
                "bottom-right-image",
            ],
            factory: tiled_box,
        },
    );
    registry.register_decorator(
        "gradient",
        DecoratorType {
            shorthand: &["direction", "start-color", "stop-color"],
            factory: gradient,
        },
    );
}

fn image(args: &InstanceArgs<'_>) -> Result<DecoratorKind, InstanceError> {
    Ok(DecoratorKind::Image(args.require_image("image")?))
}

fn tiled_horizontal(args: &InstanceArgs<'_>) -> Result<DecoratorKind, InstanceError> {
    Ok(DecoratorKind::TiledHorizontal {
        left: args.image("left-image"),
        center: args.require_image("center-image")?,
        right: args.image("right-image"),
    })
}

fn tiled_vertical(args: &InstanceArgs<'_>) -> Result<DecoratorKind, InstanceError> {
    Ok(DecoratorKind::TiledVertical {
        top: args.image("top-image"),
        center: args.require_image("center-image")?,
        bottom: args.image("bottom-image"),
    })
}

fn tiled_box(args: &InstanceArgs<'_>) -> Result<DecoratorKind, InstanceError> {
    let tiles = BoxTiles {
        top_left: args.image("top-left-image"),
        top: args.image("top-image"),
        top_right: args.image("top-right-image"),
        left: args.image("left-image"),
        center: args.image("center-image"),
        right: args.image("right-image"),
        bottom_left: args.image("bottom-left-image"),
        bottom: args.image("bottom-image"),
        bottom_right: args.image("bottom-right-image"),
    };
    if tiles == BoxTiles::default() {
        args.require("center-image")?;
    }
    Ok(DecoratorKind::TiledBox(Box::new(tiles)))
}

fn gradient(args: &InstanceArgs<'_>) -> Result<DecoratorKind, InstanceError> {
    let direction = match args.keyword("direction", &["horizontal", "vertical"])? {
        Some("horizontal") => GradientDirection::Horizontal,
        _ => GradientDirection::Vertical,
    };
    Ok(DecoratorKind::Gradient {
        direction,
        start: args.color("start-color", Color::rgb(255, 255, 255))?,
        stop: args.color("stop-color", Color::rgb(255, 255, 255))?,
    })
}
