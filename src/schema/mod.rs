//! Output schema derivation
//!
//! Walks the service metadata and derives the schema of the records one
//! extraction run produces.
//!
//! # Features
//!
//! - **Default mode**: structural and complex properties only
//! - **Expand mode**: default plus explicit navigation paths, each node
//!   holding the structural columns of its target type
//! - **Select mode**: only the listed properties and paths
//! - **Static type mapping** from remote primitives to logical types

mod column;
mod generator;
mod types;

pub use column::{ColumnKind, ColumnMetadata};
pub use generator::SchemaGenerator;
pub use types::{
    logical_type, FieldType, LogicalType, OutputSchema, SchemaField, SchemaMode,
    DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE,
};
