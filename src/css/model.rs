//! CSS AST: selectors, declarations, rule sets and the at-rules the engine
//! understands (`@keyframes`, `@decorator`, `@spritesheet`).

/// A single CSS selector component.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorComponent {
    /// Type selector: matches the element tag (e.g. `div`).
    Type(String),
    /// Universal selector: `*`.
    Universal,
    /// Class selector: `.classname`.
    Class(String),
    /// ID selector: `#id`.
    Id(String),
    /// Pseudo-class: `:hover`, `:focus`, etc.
    PseudoClass(String),
}

/// A combinator between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Combinator {
    /// Descendant combinator (whitespace): `A B`.
    #[default]
    Descendant,
    /// Child combinator: `A > B`.
    Child,
    /// Adjacent sibling combinator: `A + B`.
    AdjacentSibling,
    /// General sibling combinator: `A ~ B`.
    GeneralSibling,
}

/// A single compound selector (sequence of components without combinators).
///
/// For example, `button.primary:hover` is one `CompoundSelector` with three
/// components: `Type("button")`, `Class("primary")`, `PseudoClass("hover")`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundSelector {
    pub components: Vec<SelectorComponent>,
}

impl CompoundSelector {
    /// Create an empty compound selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a component to this compound selector.
    pub fn push(&mut self, component: SelectorComponent) {
        self.components.push(component);
    }

    /// Returns `true` if this selector is the universal selector `*` alone.
    pub fn is_universal(&self) -> bool {
        self.components.len() == 1
            && matches!(self.components[0], SelectorComponent::Universal)
    }
}

/// One element in a selector chain: either a compound selector or a combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    /// A compound selector (one or more simple selectors).
    Compound(CompoundSelector),
    /// A combinator between compound selectors.
    Combinator(Combinator),
}

/// A full CSS selector: chain of compound selectors joined by combinators.
///
/// For example, `div > p.note:hover` is a `Selector` with parts:
/// `[Compound(div), Combinator(Child), Compound(p.note:hover)]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// Alternating compound selectors and combinators.
    /// Always starts and ends with a `SelectorPart::Compound`.
    pub parts: Vec<SelectorPart>,
}

impl Selector {
    /// Create an empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate the chain left to right as `(combinator, compound)` pairs.
    ///
    /// The combinator paired with a compound is the one written to its left;
    /// the first compound is paired with [`Combinator::Descendant`].
    pub fn segments(&self) -> Vec<(Combinator, &CompoundSelector)> {
        let mut segments = Vec::new();
        let mut pending = Combinator::Descendant;
        for part in &self.parts {
            match part {
                SelectorPart::Combinator(c) => pending = *c,
                SelectorPart::Compound(compound) => {
                    segments.push((pending, compound));
                    pending = Combinator::Descendant;
                }
            }
        }
        segments
    }
}

/// A value token within a CSS declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationValue {
    /// An identifier like `red`, `bold`, `center`.
    Ident(String),
    /// A bare number like `10`, `3.14`.
    Number(f32),
    /// A number with a unit suffix like `10px`, `50%`, `2x`.
    Dimension(f32, String),
    /// A hex color string (without the `#` prefix), e.g. `"ff00aa"`.
    Color(String),
    /// A quoted string value.
    String(String),
    /// A function call such as `rgba(255, 0, 0, 128)`.
    Function(String, Vec<DeclarationValue>),
    /// A `,` separating list items.
    Comma,
    /// Any other punctuation (`/`, `.`, `+`, ...).
    Delim(String),
}

/// A single CSS property declaration, e.g. `color: red` or `margin: 1px 2px`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name, e.g. `"color"`, `"margin"`.
    pub property: String,
    /// The declaration values.
    pub values: Vec<DeclarationValue>,
    /// The value exactly as written in the source, without `!important`.
    pub raw: String,
    /// Whether `!important` was specified.
    pub important: bool,
    /// 1-based source line of the property name.
    pub line: u32,
}

impl Declaration {
    /// Create a new declaration. The raw text is rebuilt from `values`.
    pub fn new(property: impl Into<String>, values: Vec<DeclarationValue>, important: bool) -> Self {
        let raw = values
            .iter()
            .map(|v| match v {
                DeclarationValue::Ident(s) | DeclarationValue::Delim(s) => s.clone(),
                DeclarationValue::Number(n) => n.to_string(),
                DeclarationValue::Dimension(n, unit) => format!("{n}{unit}"),
                DeclarationValue::Color(hex) => format!("#{hex}"),
                DeclarationValue::String(s) => format!("\"{s}\""),
                DeclarationValue::Function(name, _) => format!("{name}(..)"),
                DeclarationValue::Comma => ",".into(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            property: property.into(),
            values,
            raw,
            important,
            line: 0,
        }
    }
}

/// A CSS rule: one or more selectors paired with declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    /// The selectors for this rule (comma-separated in CSS).
    pub selectors: Vec<Selector>,
    /// The property declarations inside the `{ ... }` block.
    pub declarations: Vec<Declaration>,
    /// 1-based source line of the first selector.
    pub line: u32,
}

/// One block inside `@keyframes`: `from, 50% { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeRuleBlock {
    /// Normalized times in `[0, 1]`.
    pub times: Vec<f32>,
    pub declarations: Vec<Declaration>,
    pub line: u32,
}

/// `@keyframes name { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframesRule {
    pub name: String,
    pub blocks: Vec<KeyframeRuleBlock>,
    pub line: u32,
}

/// `@decorator name : type { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorRule {
    pub name: String,
    pub decorator_type: String,
    pub declarations: Vec<Declaration>,
    pub line: u32,
}

/// `@spritesheet name { src: ...; sprite-name: x y w h; }`
#[derive(Debug, Clone, PartialEq)]
pub struct SpritesheetRule {
    pub name: String,
    pub declarations: Vec<Declaration>,
    pub line: u32,
}

/// A parsed stylesheet source: rule sets and at-rules in source order.
#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub rules: Vec<RuleSet>,
    pub keyframes: Vec<KeyframesRule>,
    pub decorators: Vec<DecoratorRule>,
    pub spritesheets: Vec<SpritesheetRule>,
}

impl ParsedSheet {
    /// Create an empty parsed sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
            && self.keyframes.is_empty()
            && self.decorators.is_empty()
            && self.spritesheets.is_empty()
    }
}
