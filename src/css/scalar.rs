//! CSS scalar values: a number with a unit (`10px`, `1.5em`, `50%`, `2dp`),
//! plus [`ScalarBox`] for the four-sided box shorthands.

use std::fmt;

use crate::css::model::DeclarationValue;

/// A CSS unit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Unitless number (`line-height: 1.2`, `opacity: 0.5`).
    Number,
    /// Device pixels.
    Px,
    /// Density-independent pixels.
    Dp,
    /// Relative to the element's font size.
    Em,
    /// Relative to the root font size.
    Rem,
    /// Percentage of a containing dimension.
    Percent,
}

impl Unit {
    /// Parse a unit suffix as written in CSS. Returns `None` for unknown units.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.to_ascii_lowercase().as_str() {
            "px" => Some(Unit::Px),
            "dp" => Some(Unit::Dp),
            "em" => Some(Unit::Em),
            "rem" => Some(Unit::Rem),
            "%" => Some(Unit::Percent),
            _ => None,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Unit::Number => "",
            Unit::Px => "px",
            Unit::Dp => "dp",
            Unit::Em => "em",
            Unit::Rem => "rem",
            Unit::Percent => "%",
        }
    }
}

/// A scalar value with a unit, e.g. `10px`, `50%`, `1.2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar {
    pub value: f32,
    pub unit: Unit,
}

impl Scalar {
    /// Create a unitless number.
    pub fn number(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Number,
        }
    }

    /// Create a scalar in pixels.
    pub fn px(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Px,
        }
    }

    /// Create a scalar in density-independent pixels.
    pub fn dp(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Dp,
        }
    }

    /// Create a scalar in `em`.
    pub fn em(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Em,
        }
    }

    /// Create a scalar as a percentage.
    pub fn percent(value: f32) -> Self {
        Self {
            value,
            unit: Unit::Percent,
        }
    }

    /// Convert a single declaration value. Bare numbers become unitless
    /// scalars; unknown units yield `None`.
    pub fn from_value(value: &DeclarationValue) -> Option<Self> {
        match value {
            DeclarationValue::Number(n) => Some(Scalar::number(*n)),
            DeclarationValue::Dimension(n, unit) => Unit::from_suffix(unit).map(|unit| Scalar {
                value: *n,
                unit,
            }),
            _ => None,
        }
    }

    /// Returns `true` if this scalar is relative to something the cascade
    /// does not know (font size or containing block).
    pub fn is_relative(&self) -> bool {
        matches!(self.unit, Unit::Em | Unit::Rem | Unit::Percent)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Four-sided box of scalars (margin, padding, border widths).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarBox<T = Scalar> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> ScalarBox<T> {
    /// Create a box with explicit values for each side.
    pub fn new(top: T, right: T, bottom: T, left: T) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Create a box with the same value on all sides.
    pub fn all(value: T) -> Self {
        Self::new(value, value, value, value)
    }

    /// Expand 1-4 values following CSS shorthand rules:
    ///
    /// - 1 value: all sides
    /// - 2 values: vertical, horizontal
    /// - 3 values: top, horizontal, bottom
    /// - 4 values: top, right, bottom, left
    pub fn from_shorthand(values: &[T]) -> Option<Self> {
        match *values {
            [all] => Some(Self::all(all)),
            [vertical, horizontal] => Some(Self::new(vertical, horizontal, vertical, horizontal)),
            [top, horizontal, bottom] => Some(Self::new(top, horizontal, bottom, horizontal)),
            [top, right, bottom, left] => Some(Self::new(top, right, bottom, left)),
            _ => None,
        }
    }

    /// Sides in top, right, bottom, left order.
    pub fn sides(&self) -> [T; 4] {
        [self.top, self.right, self.bottom, self.left]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_from_suffix() {
        assert_eq!(Unit::from_suffix("px"), Some(Unit::Px));
        assert_eq!(Unit::from_suffix("EM"), Some(Unit::Em));
        assert_eq!(Unit::from_suffix("%"), Some(Unit::Percent));
        assert_eq!(Unit::from_suffix("vw"), None);
    }

    #[test]
    fn from_value() {
        assert_eq!(
            Scalar::from_value(&DeclarationValue::Number(1.5)),
            Some(Scalar::number(1.5))
        );
        assert_eq!(
            Scalar::from_value(&DeclarationValue::Dimension(10.0, "px".into())),
            Some(Scalar::px(10.0))
        );
        assert_eq!(
            Scalar::from_value(&DeclarationValue::Dimension(2.0, "x".into())),
            None
        );
        assert_eq!(Scalar::from_value(&DeclarationValue::Ident("auto".into())), None);
    }

    #[test]
    fn display() {
        assert_eq!(Scalar::px(10.0).to_string(), "10px");
        assert_eq!(Scalar::percent(50.0).to_string(), "50%");
        assert_eq!(Scalar::number(1.5).to_string(), "1.5");
    }

    #[test]
    fn relative_units() {
        assert!(Scalar::em(1.0).is_relative());
        assert!(Scalar::percent(1.0).is_relative());
        assert!(!Scalar::px(1.0).is_relative());
        assert!(!Scalar::dp(1.0).is_relative());
    }

    #[test]
    fn shorthand_expansion() {
        let a = Scalar::px(1.0);
        let b = Scalar::px(2.0);
        let c = Scalar::px(3.0);
        let d = Scalar::px(4.0);

        assert_eq!(ScalarBox::from_shorthand(&[a]), Some(ScalarBox::all(a)));
        assert_eq!(ScalarBox::from_shorthand(&[a, b]), Some(ScalarBox::new(a, b, a, b)));
        assert_eq!(ScalarBox::from_shorthand(&[a, b, c]), Some(ScalarBox::new(a, b, c, b)));
        assert_eq!(
            ScalarBox::from_shorthand(&[a, b, c, d]).map(|bx| bx.sides()),
            Some([a, b, c, d])
        );
        assert_eq!(ScalarBox::<Scalar>::from_shorthand(&[]), None);
    }
}
