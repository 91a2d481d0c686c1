//! # gilt-style
//!
//! A CSS-like style cascade engine for element trees.
//!
//! Style sheets are parsed into a prefix tree of selector segments, layered
//! on top of each other with a strict precedence order, and compiled into one
//! shared [`ElementDefinition`](style::ElementDefinition) per distinct set of
//! matching rules.
//!
//! ## Core Systems
//!
//! - **[`css`]**: Tokenizer, parser, typed property values, specificity
//! - **[`dom`]**: Slotmap-backed element tree and the [`StyledElement`](dom::StyledElement) view
//! - **[`style`]**: Rule tree, node index, style sheets, decorators, font effects, keyframes, sprites
//! - **[`config`]**: Instancer registry and logging switches
//!
//! ## Example
//!
//! ```
//! use gilt_style::css::properties::PropertyId;
//! use gilt_style::dom::{Document, ElementData};
//! use gilt_style::style::StyleSheet;
//!
//! let mut sheet = StyleSheet::new();
//! sheet.load_style_sheet("p { color: red; } #lead { color: blue; }", "app.css").unwrap();
//! sheet.build_node_index_and_optimize_properties();
//!
//! let mut doc = Document::new();
//! let p = doc.insert(ElementData::new("p").with_id("lead"));
//! let definition = sheet.get_element_definition(&doc.element(p).unwrap());
//! assert_eq!(definition.value(PropertyId::Color).unwrap().to_string(), "#0000ff");
//! ```

pub mod config;
pub mod css;
pub mod dom;
pub mod style;

pub use config::StyleConfig;
pub use style::{ElementDefinition, LoadError, StyleSheet};
