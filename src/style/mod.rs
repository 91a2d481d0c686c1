//! Style resolution: rule tree, node index, style sheets and the compiled
//! element definitions they hand out.

pub mod cache;
pub mod decorator;
pub mod definition;
pub mod font_effect;
pub mod keyframes;
pub mod node_index;
pub mod registry;
pub mod rule_node;
pub mod sheet;
pub mod shorthand;
pub mod sprite;

pub use definition::ElementDefinition;
pub use sheet::{LoadError, StyleSheet};
