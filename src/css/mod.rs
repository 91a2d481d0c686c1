//! CSS front end: tokenizer, parser, typed property values, specificity.

pub mod color;
pub mod model;
pub mod parser;
pub mod properties;
pub mod scalar;
pub mod specificity;
pub mod tokenizer;
