//! Sprite sheets declared with `@spritesheet`.
//!
//! ```css
//! @spritesheet theme {
//!     src: invader.png;
//!     resolution: 2x;
//!     icon-ok: 0px 0px 32px 32px;
//! }
//! ```
//!
//! `src` names the image, `resolution` (optional, default `1x`) scales the
//! sprites' display size, every other declaration defines a sprite rectangle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::css::model::{DeclarationValue, SpritesheetRule};
use crate::css::properties::SourceLocation;
use crate::css::scalar::{Scalar, Unit};

/// A rectangle in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One `@spritesheet` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Spritesheet {
    pub name: String,
    /// Image path, as written after `src:`.
    pub image_source: String,
    pub definition_source: Arc<str>,
    pub definition_line: u32,
    /// Multiplier from image pixels to display pixels (`1 / resolution`).
    pub display_scale: f32,
}

/// A named region of a sprite sheet image.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub rectangle: Rectangle,
    pub sheet: Arc<Spritesheet>,
}

/// All sprites known to a style sheet, keyed by sprite name.
#[derive(Debug, Clone, Default)]
pub struct SpritesheetList {
    sheets: Vec<Arc<Spritesheet>>,
    sprites: HashMap<String, Sprite>,
}

impl SpritesheetList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the sheet and sprites of one `@spritesheet` rule.
    ///
    /// Returns `false` (and registers nothing) if the rule has no `src`.
    /// Malformed sprite entries are logged and skipped.
    pub fn add_rule(&mut self, rule: &SpritesheetRule, source_name: &Arc<str>) -> bool {
        let location = SourceLocation::new(source_name.clone(), rule.line);

        let mut image_source = None;
        let mut resolution = 1.0f32;
        let mut rectangles = Vec::new();

        for decl in &rule.declarations {
            let decl_location = SourceLocation::new(source_name.clone(), decl.line);
            match decl.property.as_str() {
                "src" => image_source = Some(unquote(&decl.raw).to_string()),
                "resolution" => match decl.values.as_slice() {
                    [DeclarationValue::Dimension(n, unit)] if unit == "x" && *n > 0.0 => {
                        resolution = *n
                    }
                    [DeclarationValue::Number(n)] if *n > 0.0 => resolution = *n,
                    _ => tracing::warn!(
                        location = %decl_location,
                        value = %decl.raw,
                        "invalid sprite sheet resolution, expected e.g. '2x'"
                    ),
                },
                name => match parse_rectangle(&decl.values) {
                    Some(rect) => rectangles.push((name.to_string(), rect)),
                    None => tracing::warn!(
                        location = %decl_location,
                        sprite = name,
                        value = %decl.raw,
                        "invalid sprite rectangle, expected 'x y width height'"
                    ),
                },
            }
        }

        let Some(image_source) = image_source else {
            tracing::warn!(
                location = %location,
                spritesheet = %rule.name,
                "sprite sheet has no 'src' declaration, ignored"
            );
            return false;
        };

        let sheet = Arc::new(Spritesheet {
            name: rule.name.clone(),
            image_source,
            definition_source: source_name.clone(),
            definition_line: rule.line,
            display_scale: 1.0 / resolution,
        });

        for (name, rectangle) in rectangles {
            if self.sprites.contains_key(&name) {
                tracing::warn!(
                    location = %location,
                    sprite = %name,
                    "sprite name already defined, replacing"
                );
            }
            self.sprites.insert(
                name,
                Sprite {
                    rectangle,
                    sheet: sheet.clone(),
                },
            );
        }
        self.sheets.push(sheet);
        true
    }

    /// Add every sheet of `overlay`; its sprites shadow ours by name.
    pub fn merge(&mut self, overlay: &SpritesheetList) {
        self.sheets.extend(overlay.sheets.iter().cloned());
        for (name, sprite) in &overlay.sprites {
            self.sprites.insert(name.clone(), sprite.clone());
        }
    }

    pub fn get_sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprites.get(name)
    }

    pub fn sheets(&self) -> &[Arc<Spritesheet>] {
        &self.sheets
    }

    /// Number of sprites.
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

/// Four pixel lengths: `x y width height`.
fn parse_rectangle(values: &[DeclarationValue]) -> Option<Rectangle> {
    let pixels: Vec<f32> = values
        .iter()
        .map(|v| match Scalar::from_value(v)? {
            Scalar {
                value,
                unit: Unit::Px | Unit::Number,
            } => Some(value),
            _ => None,
        })
        .collect::<Option<_>>()?;

    match pixels.as_slice() {
        [x, y, width, height] => Some(Rectangle::new(*x, *y, *width, *height)),
        _ => None,
    }
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .or_else(|| raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
        .unwrap_or(raw)
}
