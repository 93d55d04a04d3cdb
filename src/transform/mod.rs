//! Record transformation
//!
//! Converts raw feed entries into structured records following an output
//! schema, recursing into nested records and collections.

mod transformer;
mod types;
mod values;

pub use transformer::Transformer;
pub use types::{FieldValue, Record};

#[cfg(test)]
mod tests;
