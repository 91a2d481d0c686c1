//! RGBA colors: hex notation, named colors and `rgb()`/`rgba()`.

use std::fmt;

use crate::css::model::DeclarationValue;
use crate::css::parser::parse_values;

/// An 8-bit-per-channel RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("transparent", Color::rgba(0, 0, 0, 0)),
    ("black", Color::rgb(0, 0, 0)),
    ("white", Color::rgb(255, 255, 255)),
    ("red", Color::rgb(255, 0, 0)),
    ("green", Color::rgb(0, 128, 0)),
    ("blue", Color::rgb(0, 0, 255)),
    ("yellow", Color::rgb(255, 255, 0)),
    ("orange", Color::rgb(255, 165, 0)),
    ("gray", Color::rgb(128, 128, 128)),
    ("grey", Color::rgb(128, 128, 128)),
    ("silver", Color::rgb(192, 192, 192)),
    ("maroon", Color::rgb(128, 0, 0)),
    ("purple", Color::rgb(128, 0, 128)),
    ("fuchsia", Color::rgb(255, 0, 255)),
    ("lime", Color::rgb(0, 255, 0)),
    ("olive", Color::rgb(128, 128, 0)),
    ("navy", Color::rgb(0, 0, 128)),
    ("teal", Color::rgb(0, 128, 128)),
    ("aqua", Color::rgb(0, 255, 255)),
];

impl Color {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Look up a CSS color keyword (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
    }

    /// Parse 3, 4, 6 or 8 hex digits (without the leading `#`).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;

        match digits.as_slice() {
            [r, g, b] => Some(Self::rgb(r * 17, g * 17, b * 17)),
            [r, g, b, a] => Some(Self::rgba(r * 17, g * 17, b * 17, a * 17)),
            [r1, r2, g1, g2, b1, b2] => Some(Self::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            [r1, r2, g1, g2, b1, b2, a1, a2] => Some(Self::rgba(
                r1 * 16 + r2,
                g1 * 16 + g2,
                b1 * 16 + b2,
                a1 * 16 + a2,
            )),
            _ => None,
        }
    }

    /// Parse a single color value: `#hex`, a keyword, or `rgb()`/`rgba()`.
    pub fn from_value(value: &DeclarationValue) -> Option<Self> {
        match value {
            DeclarationValue::Color(hex) => Self::from_hex(hex),
            DeclarationValue::Ident(name) => Self::named(name),
            DeclarationValue::Function(name, args) => {
                let channels: Vec<f32> = args
                    .iter()
                    .filter(|a| !matches!(a, DeclarationValue::Comma))
                    .map(|a| match a {
                        DeclarationValue::Number(n) => Some(*n),
                        _ => None,
                    })
                    .collect::<Option<_>>()?;
                let channel = |v: f32| v.clamp(0.0, 255.0).round() as u8;
                match (name.as_str(), channels.as_slice()) {
                    ("rgb", [r, g, b]) => Some(Self::rgb(channel(*r), channel(*g), channel(*b))),
                    ("rgba", [r, g, b, a]) => Some(Self::rgba(
                        channel(*r),
                        channel(*g),
                        channel(*b),
                        channel(*a),
                    )),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Parse a color written as free text, e.g. an instancer property.
    pub fn parse(text: &str) -> Option<Self> {
        match parse_values(text).ok()?.as_slice() {
            [value] => Self::from_value(value),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}
