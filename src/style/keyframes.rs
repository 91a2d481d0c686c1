//! `@keyframes` blocks and the `animation` property.
//!
//! ```css
//! @keyframes pulse {
//!     from, to { opacity: 1; }
//!     50% { opacity: 0.2; }
//! }
//! button { animation: 1.5s 0.2s cubic-in-out infinite alternate pulse; }
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::css::model::KeyframesRule;
use crate::css::properties::{parse_declaration, Property, PropertyDictionary, PropertyId, SourceLocation};
use crate::css::specificity::{Precedence, Specificity};

/// Errors from parsing one `animation` list item.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    #[error("no @keyframes named '{0}'")]
    UnknownKeyframes(String),
    #[error("malformed animation '{item}': {message}")]
    Malformed { item: String, message: String },
}

/// Property snapshot at one point of an animation.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeBlock {
    /// Position in `[0, 1]`.
    pub normalized_time: f32,
    pub properties: PropertyDictionary,
}

/// A parsed `@keyframes` rule. Blocks are sorted by time, one per time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Keyframes {
    /// Every property animated by any block.
    pub property_ids: BTreeSet<PropertyId>,
    pub blocks: Vec<KeyframeBlock>,
}

impl Keyframes {
    /// Build from a parsed rule. Invalid declarations are logged and skipped.
    pub fn from_rule(rule: &KeyframesRule, source_name: &Arc<str>) -> Self {
        let mut keyframes = Keyframes::default();
        let mut order = 0u32;

        for block in &rule.blocks {
            let mut properties = PropertyDictionary::new();
            for decl in &block.declarations {
                let source = SourceLocation::new(source_name.clone(), decl.line);
                match parse_declaration(decl) {
                    Ok(values) => {
                        for (id, value) in values {
                            let precedence = Precedence::new(Specificity::new(), 0, order);
                            properties.set(id, Property::new(value, precedence, source.clone()));
                        }
                    }
                    Err(error) => tracing::warn!(
                        location = %source,
                        keyframes = %rule.name,
                        %error,
                        "invalid keyframe declaration, skipped"
                    ),
                }
                order += 1;
            }

            for &time in &block.times {
                keyframes.insert_block(time, &properties);
            }
        }

        keyframes
    }

    fn insert_block(&mut self, time: f32, properties: &PropertyDictionary) {
        self.property_ids.extend(properties.ids());
        let index = self.blocks.partition_point(|b| b.normalized_time.total_cmp(&time).is_lt());
        match self.blocks.get_mut(index) {
            Some(block) if block.normalized_time == time => block.properties.merge(properties),
            _ => self.blocks.insert(
                index,
                KeyframeBlock {
                    normalized_time: time,
                    properties: properties.clone(),
                },
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tween
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenKind {
    #[default]
    Linear,
    Back,
    Bounce,
    Circular,
    Cubic,
    Elastic,
    Exponential,
    Quadratic,
    Quartic,
    Quintic,
    Sine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TweenDirection {
    In,
    Out,
    #[default]
    InOut,
}

/// Easing curve, written `<kind>-<in|out|in-out>` (`linear` alone is fine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tween {
    pub kind: TweenKind,
    pub direction: TweenDirection,
}

impl Tween {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.to_ascii_lowercase();
        let (kind, direction) = if let Some(kind) = text.strip_suffix("-in-out") {
            (kind, TweenDirection::InOut)
        } else if let Some(kind) = text.strip_suffix("-out") {
            (kind, TweenDirection::Out)
        } else if let Some(kind) = text.strip_suffix("-in") {
            (kind, TweenDirection::In)
        } else if text == "linear" {
            ("linear", TweenDirection::InOut)
        } else {
            return None;
        };

        let kind = match kind {
            "linear" => TweenKind::Linear,
            "back" => TweenKind::Back,
            "bounce" => TweenKind::Bounce,
            "circular" => TweenKind::Circular,
            "cubic" => TweenKind::Cubic,
            "elastic" => TweenKind::Elastic,
            "exponential" => TweenKind::Exponential,
            "quadratic" => TweenKind::Quadratic,
            "quartic" => TweenKind::Quartic,
            "quintic" => TweenKind::Quintic,
            "sine" => TweenKind::Sine,
            _ => return None,
        };
        Some(Tween { kind, direction })
    }
}

// ---------------------------------------------------------------------------
// Animation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iterations {
    Count(u32),
    Infinite,
}

/// One resolved item of an `animation` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    pub name: String,
    /// Seconds.
    pub duration: f32,
    /// Seconds.
    pub delay: f32,
    pub tween: Tween,
    pub iterations: Iterations,
    pub alternate: bool,
    pub paused: bool,
    pub keyframes: Arc<Keyframes>,
}

/// Resolved value of an `animation` property.
pub type AnimationList = Vec<Animation>;

/// Parse one item: `<duration> [<delay>] [<tween>] [<count>|infinite]
/// [alternate] [paused] <name>`, in any order after the duration.
pub fn parse_animation(
    item: &str,
    keyframes: &HashMap<String, Arc<Keyframes>>,
) -> Result<Animation, AnimationError> {
    let malformed = |message: &str| AnimationError::Malformed {
        item: item.to_string(),
        message: message.to_string(),
    };

    let mut times = Vec::new();
    let mut tween = None;
    let mut iterations = None;
    let mut alternate = false;
    let mut paused = false;
    let mut name = None;

    for token in item.split_whitespace() {
        if let Some(seconds) = parse_time(token) {
            if times.len() == 2 {
                return Err(malformed("more than two time values"));
            }
            times.push(seconds);
        } else if token.eq_ignore_ascii_case("infinite") {
            iterations = Some(Iterations::Infinite);
        } else if token.eq_ignore_ascii_case("alternate") {
            alternate = true;
        } else if token.eq_ignore_ascii_case("paused") {
            paused = true;
        } else if let Ok(count) = token.parse::<u32>() {
            iterations = Some(Iterations::Count(count));
        } else if let Some(t) = Tween::parse(token) {
            tween = Some(t);
        } else if name.replace(token).is_some() {
            return Err(malformed("more than one keyframes name"));
        }
    }

    let duration = *times.first().ok_or_else(|| malformed("missing duration"))?;
    let name = name.ok_or_else(|| malformed("missing keyframes name"))?;
    let resolved = keyframes
        .get(name)
        .cloned()
        .ok_or_else(|| AnimationError::UnknownKeyframes(name.to_string()))?;

    Ok(Animation {
        name: name.to_string(),
        duration,
        delay: times.get(1).copied().unwrap_or(0.0),
        tween: tween.unwrap_or_default(),
        iterations: iterations.unwrap_or(Iterations::Count(1)),
        alternate,
        paused,
        keyframes: resolved,
    })
}

/// `1.5s` or `200ms`, in seconds.
fn parse_time(token: &str) -> Option<f32> {
    let token = token.to_ascii_lowercase();
    if let Some(ms) = token.strip_suffix("ms") {
        ms.parse::<f32>().ok().map(|v| v / 1000.0)
    } else {
        token.strip_suffix('s')?.parse::<f32>().ok()
    }
}
