//! Property parsing: declaration tokens → typed values keyed by [`PropertyId`].
//!
//! Every supported property has a [`PropertyId`] and a value kind. Shorthands
//! (`margin`, `padding`, `border-width`, `border-color`, `border`,
//! `overflow`) expand into their longhands. Decorator, font-effect and
//! animation lists are kept as raw text in a [`Deferred`] until the style
//! sheet instantiates them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::css::color::Color;
use crate::css::model::{Declaration, DeclarationValue};
use crate::css::scalar::{Scalar, ScalarBox};
use crate::css::specificity::Precedence;
use crate::style::decorator::DecoratorList;
use crate::style::font_effect::FontEffectList;
use crate::style::keyframes::AnimationList;

/// Errors from property parsing.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    #[error("unknown property: {0}")]
    UnknownProperty(String),
    #[error("invalid value for {property}: {message}")]
    InvalidValue { property: String, message: String },
}

impl PropertyError {
    fn invalid(property: &str, message: impl Into<String>) -> Self {
        PropertyError::InvalidValue {
            property: property.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// PropertyId
// ---------------------------------------------------------------------------

/// How a property's value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Keyword(&'static [&'static str]),
    Length,
    LengthOrAuto,
    Number,
    NumberOrAuto,
    Color,
    Text,
    Decorators,
    FontEffects,
    Animations,
}

/// Identifier of a supported (longhand) property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyId {
    Display,
    Visibility,
    Position,
    Float,
    OverflowX,
    OverflowY,
    ZIndex,
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    Top,
    Right,
    Bottom,
    Left,
    MarginTop,
    MarginRight,
    MarginBottom,
    MarginLeft,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    BorderTopWidth,
    BorderRightWidth,
    BorderBottomWidth,
    BorderLeftWidth,
    BorderTopColor,
    BorderRightColor,
    BorderBottomColor,
    BorderLeftColor,
    Color,
    BackgroundColor,
    ImageColor,
    Opacity,
    FontFamily,
    FontSize,
    FontWeight,
    FontStyle,
    LineHeight,
    TextAlign,
    TextDecoration,
    TextTransform,
    WhiteSpace,
    Cursor,
    PointerEvents,
    Decorator,
    FontEffect,
    Animation,
}

const OVERFLOW: &[&str] = &["visible", "hidden", "auto", "scroll"];

/// Name and value kind per property, in `PropertyId` declaration order.
const PROPERTY_TABLE: &[(PropertyId, &str, ValueKind)] = &[
    (PropertyId::Display, "display", ValueKind::Keyword(&["none", "block", "inline", "inline-block", "flex", "table"])),
    (PropertyId::Visibility, "visibility", ValueKind::Keyword(&["visible", "hidden"])),
    (PropertyId::Position, "position", ValueKind::Keyword(&["static", "relative", "absolute", "fixed"])),
    (PropertyId::Float, "float", ValueKind::Keyword(&["none", "left", "right"])),
    (PropertyId::OverflowX, "overflow-x", ValueKind::Keyword(OVERFLOW)),
    (PropertyId::OverflowY, "overflow-y", ValueKind::Keyword(OVERFLOW)),
    (PropertyId::ZIndex, "z-index", ValueKind::NumberOrAuto),
    (PropertyId::Width, "width", ValueKind::LengthOrAuto),
    (PropertyId::Height, "height", ValueKind::LengthOrAuto),
    (PropertyId::MinWidth, "min-width", ValueKind::Length),
    (PropertyId::MaxWidth, "max-width", ValueKind::Length),
    (PropertyId::MinHeight, "min-height", ValueKind::Length),
    (PropertyId::MaxHeight, "max-height", ValueKind::Length),
    (PropertyId::Top, "top", ValueKind::LengthOrAuto),
    (PropertyId::Right, "right", ValueKind::LengthOrAuto),
    (PropertyId::Bottom, "bottom", ValueKind::LengthOrAuto),
    (PropertyId::Left, "left", ValueKind::LengthOrAuto),
    (PropertyId::MarginTop, "margin-top", ValueKind::LengthOrAuto),
    (PropertyId::MarginRight, "margin-right", ValueKind::LengthOrAuto),
    (PropertyId::MarginBottom, "margin-bottom", ValueKind::LengthOrAuto),
    (PropertyId::MarginLeft, "margin-left", ValueKind::LengthOrAuto),
    (PropertyId::PaddingTop, "padding-top", ValueKind::Length),
    (PropertyId::PaddingRight, "padding-right", ValueKind::Length),
    (PropertyId::PaddingBottom, "padding-bottom", ValueKind::Length),
    (PropertyId::PaddingLeft, "padding-left", ValueKind::Length),
    (PropertyId::BorderTopWidth, "border-top-width", ValueKind::Length),
    (PropertyId::BorderRightWidth, "border-right-width", ValueKind::Length),
    (PropertyId::BorderBottomWidth, "border-bottom-width", ValueKind::Length),
    (PropertyId::BorderLeftWidth, "border-left-width", ValueKind::Length),
    (PropertyId::BorderTopColor, "border-top-color", ValueKind::Color),
    (PropertyId::BorderRightColor, "border-right-color", ValueKind::Color),
    (PropertyId::BorderBottomColor, "border-bottom-color", ValueKind::Color),
    (PropertyId::BorderLeftColor, "border-left-color", ValueKind::Color),
    (PropertyId::Color, "color", ValueKind::Color),
    (PropertyId::BackgroundColor, "background-color", ValueKind::Color),
    (PropertyId::ImageColor, "image-color", ValueKind::Color),
    (PropertyId::Opacity, "opacity", ValueKind::Number),
    (PropertyId::FontFamily, "font-family", ValueKind::Text),
    (PropertyId::FontSize, "font-size", ValueKind::Length),
    (PropertyId::FontWeight, "font-weight", ValueKind::Keyword(&["normal", "bold"])),
    (PropertyId::FontStyle, "font-style", ValueKind::Keyword(&["normal", "italic"])),
    (PropertyId::LineHeight, "line-height", ValueKind::Length),
    (PropertyId::TextAlign, "text-align", ValueKind::Keyword(&["left", "right", "center", "justify"])),
    (PropertyId::TextDecoration, "text-decoration", ValueKind::Keyword(&["none", "underline", "overline", "line-through"])),
    (PropertyId::TextTransform, "text-transform", ValueKind::Keyword(&["none", "capitalize", "uppercase", "lowercase"])),
    (PropertyId::WhiteSpace, "white-space", ValueKind::Keyword(&["normal", "pre", "nowrap", "pre-wrap", "pre-line"])),
    (PropertyId::Cursor, "cursor", ValueKind::Text),
    (PropertyId::PointerEvents, "pointer-events", ValueKind::Keyword(&["auto", "none"])),
    (PropertyId::Decorator, "decorator", ValueKind::Decorators),
    (PropertyId::FontEffect, "font-effect", ValueKind::FontEffects),
    (PropertyId::Animation, "animation", ValueKind::Animations),
];

impl PropertyId {
    /// The CSS name of this property.
    pub fn name(self) -> &'static str {
        PROPERTY_TABLE[self as usize].1
    }

    /// Look up a longhand property by CSS name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTY_TABLE
            .iter()
            .find(|(_, n, _)| n.eq_ignore_ascii_case(name))
            .map(|(id, _, _)| *id)
    }

    /// All supported properties, in declaration order.
    pub fn all() -> impl Iterator<Item = PropertyId> {
        PROPERTY_TABLE.iter().map(|(id, _, _)| *id)
    }

    fn kind(self) -> ValueKind {
        PROPERTY_TABLE[self as usize].2
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A value kept as source text until it can be instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct Deferred<T> {
    raw: String,
    resolved: Option<T>,
}

impl<T> Deferred<T> {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            resolved: None,
        }
    }

    /// The value as written in the stylesheet.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn resolved(&self) -> Option<&T> {
        self.resolved.as_ref()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    pub fn resolve(&mut self, value: T) {
        self.resolved = Some(value);
    }

    /// Drop the instantiated value, keeping the source text.
    pub fn reset(&mut self) {
        self.resolved = None;
    }
}

/// A typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Keyword(String),
    Number(f32),
    Scalar(Scalar),
    Color(Color),
    String(String),
    Decorators(Deferred<DecoratorList>),
    FontEffects(Deferred<FontEffectList>),
    Animations(Deferred<AnimationList>),
}

impl PropertyValue {
    /// Returns `true` for a list value that has not been instantiated yet.
    pub fn is_unresolved(&self) -> bool {
        match self {
            PropertyValue::Decorators(d) => !d.is_resolved(),
            PropertyValue::FontEffects(d) => !d.is_resolved(),
            PropertyValue::Animations(d) => !d.is_resolved(),
            _ => false,
        }
    }

    fn reset(&mut self) {
        match self {
            PropertyValue::Decorators(d) => d.reset(),
            PropertyValue::FontEffects(d) => d.reset(),
            PropertyValue::Animations(d) => d.reset(),
            _ => {}
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Keyword(k) => f.write_str(k),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Scalar(s) => write!(f, "{s}"),
            PropertyValue::Color(c) => write!(f, "{c}"),
            PropertyValue::String(s) => write!(f, "\"{s}\""),
            PropertyValue::Decorators(d) => f.write_str(d.raw()),
            PropertyValue::FontEffects(d) => f.write_str(d.raw()),
            PropertyValue::Animations(d) => f.write_str(d.raw()),
        }
    }
}

// ---------------------------------------------------------------------------
// Property / PropertyDictionary
// ---------------------------------------------------------------------------

/// Where a declaration was written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<Arc<str>>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A declared value together with its cascade metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub value: PropertyValue,
    pub precedence: Precedence,
    pub source: SourceLocation,
}

impl Property {
    pub fn new(value: PropertyValue, precedence: Precedence, source: SourceLocation) -> Self {
        Self {
            value,
            precedence,
            source,
        }
    }
}

/// Ordered map of property id → winning declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDictionary {
    properties: BTreeMap<PropertyId, Property>,
}

impl PropertyDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn get(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(&id)
    }

    /// Shortcut for the value of `id`.
    pub fn value(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.properties.get(&id).map(|p| &p.value)
    }

    /// Store `property` unless an existing declaration outranks it.
    ///
    /// Returns `true` if the property was stored. On an exact precedence tie
    /// the incoming declaration wins.
    pub fn set(&mut self, id: PropertyId, property: Property) -> bool {
        match self.properties.get(&id) {
            Some(existing) if existing.precedence > property.precedence => false,
            _ => {
                self.properties.insert(id, property);
                true
            }
        }
    }

    /// Cascade every property of `other` into this dictionary.
    pub fn merge(&mut self, other: &PropertyDictionary) {
        for (id, property) in &other.properties {
            self.set(*id, property.clone());
        }
    }

    /// Cascade `other` into this dictionary with its layers shifted up by
    /// `layer_offset`.
    pub fn import(&mut self, other: &PropertyDictionary, layer_offset: u32) {
        for (id, property) in &other.properties {
            let mut property = property.clone();
            property.precedence = property.precedence.shifted(layer_offset);
            self.set(*id, property);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PropertyId, &Property)> {
        self.properties.iter().map(|(id, p)| (*id, p))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (PropertyId, &mut Property)> {
        self.properties.iter_mut().map(|(id, p)| (*id, p))
    }

    /// Property ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.properties.keys().copied()
    }

    /// Drop every instantiated list value, keeping the source text.
    pub fn reset_deferred(&mut self) {
        for property in self.properties.values_mut() {
            property.value.reset();
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse one declaration into its longhand `(id, value)` pairs.
///
/// Shorthands expand into several longhands; everything else yields exactly
/// one pair.
pub fn parse_declaration(
    decl: &Declaration,
) -> Result<Vec<(PropertyId, PropertyValue)>, PropertyError> {
    use PropertyId::*;

    let name = decl.property.to_ascii_lowercase();
    match name.as_str() {
        "margin" => parse_box(&name, &decl.values, [MarginTop, MarginRight, MarginBottom, MarginLeft]),
        "padding" => parse_box(&name, &decl.values, [PaddingTop, PaddingRight, PaddingBottom, PaddingLeft]),
        "border-width" => parse_box(
            &name,
            &decl.values,
            [BorderTopWidth, BorderRightWidth, BorderBottomWidth, BorderLeftWidth],
        ),
        "border-color" => parse_box(
            &name,
            &decl.values,
            [BorderTopColor, BorderRightColor, BorderBottomColor, BorderLeftColor],
        ),
        "border" => parse_border(&decl.values),
        "overflow" => match decl.values.as_slice() {
            [both] => {
                let value = parse_single(OverflowX, both)?;
                Ok(vec![(OverflowX, value.clone()), (OverflowY, value)])
            }
            [x, y] => Ok(vec![(OverflowX, parse_single(OverflowX, x)?), (OverflowY, parse_single(OverflowY, y)?)]),
            values => Err(PropertyError::invalid(&name, format!("expected 1-2 values, got {}", values.len()))),
        },
        _ => {
            let id = PropertyId::from_name(&name).ok_or_else(|| PropertyError::UnknownProperty(decl.property.clone()))?;
            Ok(vec![(id, parse_value(id, decl)?)])
        }
    }
}

/// Parse the full value of a longhand declaration.
fn parse_value(id: PropertyId, decl: &Declaration) -> Result<PropertyValue, PropertyError> {
    let raw = decl.raw.trim();
    match id.kind() {
        ValueKind::Decorators => Ok(PropertyValue::Decorators(Deferred::new(require_raw(id, raw)?))),
        ValueKind::FontEffects => Ok(PropertyValue::FontEffects(Deferred::new(require_raw(id, raw)?))),
        ValueKind::Animations => Ok(PropertyValue::Animations(Deferred::new(require_raw(id, raw)?))),
        ValueKind::Text => match decl.values.as_slice() {
            [DeclarationValue::String(s)] => Ok(PropertyValue::String(s.clone())),
            _ => Ok(PropertyValue::String(require_raw(id, raw)?.to_string())),
        },
        _ => match decl.values.as_slice() {
            [value] => parse_single(id, value),
            values => Err(PropertyError::invalid(
                id.name(),
                format!("expected 1 value, got {}", values.len()),
            )),
        },
    }
}

fn require_raw(id: PropertyId, raw: &str) -> Result<&str, PropertyError> {
    if raw.is_empty() {
        Err(PropertyError::invalid(id.name(), "missing value"))
    } else {
        Ok(raw)
    }
}

/// Parse one value token for a single-token property kind.
fn parse_single(id: PropertyId, value: &DeclarationValue) -> Result<PropertyValue, PropertyError> {
    let is_auto = matches!(value, DeclarationValue::Ident(name) if name.eq_ignore_ascii_case("auto"));

    match id.kind() {
        ValueKind::Keyword(allowed) => match value {
            DeclarationValue::Ident(name) => allowed
                .iter()
                .find(|k| k.eq_ignore_ascii_case(name))
                .map(|k| PropertyValue::Keyword((*k).to_string()))
                .ok_or_else(|| {
                    PropertyError::invalid(id.name(), format!("expected {}, got: {name}", allowed.join("|")))
                }),
            other => Err(PropertyError::invalid(id.name(), format!("expected identifier, got: {other:?}"))),
        },
        ValueKind::LengthOrAuto | ValueKind::NumberOrAuto if is_auto => Ok(PropertyValue::Keyword("auto".into())),
        ValueKind::Length | ValueKind::LengthOrAuto => Scalar::from_value(value)
            .map(PropertyValue::Scalar)
            .ok_or_else(|| PropertyError::invalid(id.name(), format!("expected length, got: {value:?}"))),
        ValueKind::Number | ValueKind::NumberOrAuto => match value {
            DeclarationValue::Number(n) => Ok(PropertyValue::Number(*n)),
            other => Err(PropertyError::invalid(id.name(), format!("expected number, got: {other:?}"))),
        },
        ValueKind::Color => Color::from_value(value)
            .map(PropertyValue::Color)
            .ok_or_else(|| PropertyError::invalid(id.name(), format!("expected color, got: {value:?}"))),
        ValueKind::Text | ValueKind::Decorators | ValueKind::FontEffects | ValueKind::Animations => {
            Err(PropertyError::invalid(id.name(), "cannot be used in a shorthand"))
        }
    }
}

/// Expand a 1-4 value box shorthand into four longhands.
fn parse_box(
    shorthand: &str,
    values: &[DeclarationValue],
    sides: [PropertyId; 4],
) -> Result<Vec<(PropertyId, PropertyValue)>, PropertyError> {
    let indices: Vec<usize> = (0..values.len()).collect();
    let layout = ScalarBox::from_shorthand(&indices).ok_or_else(|| {
        PropertyError::invalid(shorthand, format!("expected 1-4 values, got {}", values.len()))
    })?;

    sides
        .into_iter()
        .zip(layout.sides())
        .map(|(id, index)| Ok((id, parse_single(id, &values[index])?)))
        .collect()
}

/// `border: <width> [<color>]` in either order, applied to all four sides.
fn parse_border(values: &[DeclarationValue]) -> Result<Vec<(PropertyId, PropertyValue)>, PropertyError> {
    const WIDTHS: [PropertyId; 4] = [
        PropertyId::BorderTopWidth,
        PropertyId::BorderRightWidth,
        PropertyId::BorderBottomWidth,
        PropertyId::BorderLeftWidth,
    ];
    const COLORS: [PropertyId; 4] = [
        PropertyId::BorderTopColor,
        PropertyId::BorderRightColor,
        PropertyId::BorderBottomColor,
        PropertyId::BorderLeftColor,
    ];

    if values.is_empty() || values.len() > 2 {
        return Err(PropertyError::invalid(
            "border",
            format!("expected 1-2 values, got {}", values.len()),
        ));
    }

    let mut width = None;
    let mut color = None;
    for value in values {
        if let Some(scalar) = Scalar::from_value(value).filter(|_| width.is_none()) {
            width = Some(scalar);
        } else if let Some(c) = Color::from_value(value).filter(|_| color.is_none()) {
            color = Some(c);
        } else {
            return Err(PropertyError::invalid("border", format!("unexpected value: {value:?}")));
        }
    }

    let mut expanded = Vec::new();
    if let Some(width) = width {
        for id in WIDTHS {
            expanded.push((id, PropertyValue::Scalar(width)));
        }
    }
    if let Some(color) = color {
        for id in COLORS {
            expanded.push((id, PropertyValue::Color(color)));
        }
    }
    Ok(expanded)
}
