//! Document arena: slotmap-backed element tree and the element view the
//! style engine matches against.

pub mod element;
pub mod node;
pub mod tree;

pub use element::{ElementRef, StyledElement};
pub use node::{ElementData, ElementId};
pub use tree::Document;
