//! Output schema types and the remote type mapping

use crate::error::Result;
use crate::metadata::Facets;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Decimal precision used when the metadata declares none
pub const DEFAULT_DECIMAL_PRECISION: u32 = 15;

/// Decimal scale used when the metadata declares none
pub const DEFAULT_DECIMAL_SCALE: u32 = 2;

// ============================================================================
// Logical Types
// ============================================================================

/// Output logical type of a primitive column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// Fixed-point decimal
    Decimal,
    /// UTF-8 string
    String,
    /// Raw bytes
    Bytes,
    /// Boolean
    Boolean,
    /// Local date-time
    DateTime,
    /// Time of day
    Time,
    /// Instant with offset
    Timestamp,
}

impl LogicalType {
    /// Date, time and timestamp types
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::DateTime | Self::Time | Self::Timestamp)
    }
}

/// Remote primitive type name -> output logical type
static TYPE_MAPPING: LazyLock<HashMap<&'static str, LogicalType>> = LazyLock::new(|| {
    HashMap::from([
        ("SByte", LogicalType::Int),
        ("Int16", LogicalType::Int),
        ("Int32", LogicalType::Int),
        ("Int64", LogicalType::Long),
        ("Single", LogicalType::Float),
        ("Float", LogicalType::Float),
        ("Double", LogicalType::Double),
        ("Decimal", LogicalType::Decimal),
        ("String", LogicalType::String),
        ("Guid", LogicalType::String),
        ("Byte", LogicalType::Bytes),
        ("Binary", LogicalType::Bytes),
        ("Boolean", LogicalType::Boolean),
        ("DateTime", LogicalType::DateTime),
        ("Time", LogicalType::Time),
        ("DateTimeOffset", LogicalType::Timestamp),
    ])
});

/// Logical type for a remote primitive type name.
///
/// Unknown names map to string.
pub fn logical_type(remote: &str) -> LogicalType {
    TYPE_MAPPING
        .get(remote)
        .copied()
        .unwrap_or(LogicalType::String)
}

// ============================================================================
// Field Types
// ============================================================================

/// Type of a schema field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// 32-bit integer
    Int,
    /// 64-bit integer
    Long,
    /// Single precision float
    Float,
    /// Double precision float
    Double,
    /// Fixed-point decimal
    Decimal {
        /// Total digits
        precision: u32,
        /// Digits after the point
        scale: u32,
    },
    /// UTF-8 string
    String,
    /// Raw bytes
    Bytes,
    /// Local date-time, microsecond precision
    DateTime,
    /// Time of day, microsecond precision
    Time,
    /// Instant, microsecond precision
    Timestamp,
    /// Boolean
    Boolean,
    /// Nested record
    Record {
        /// Record type name, unique within a schema
        name: String,
        /// Fields in order
        fields: Vec<SchemaField>,
    },
    /// Collection of nested values
    Array {
        /// Element type
        items: Box<FieldType>,
    },
}

impl FieldType {
    /// Field type for a logical type, using decimal facets where relevant
    pub fn from_logical(logical: LogicalType, facets: &Facets) -> Self {
        match logical {
            LogicalType::Int => Self::Int,
            LogicalType::Long => Self::Long,
            LogicalType::Float => Self::Float,
            LogicalType::Double => Self::Double,
            LogicalType::Decimal => match (facets.precision, facets.scale) {
                (Some(precision), Some(scale)) => Self::Decimal { precision, scale },
                _ => Self::Decimal {
                    precision: DEFAULT_DECIMAL_PRECISION,
                    scale: DEFAULT_DECIMAL_SCALE,
                },
            },
            LogicalType::String => Self::String,
            LogicalType::Bytes => Self::Bytes,
            LogicalType::Boolean => Self::Boolean,
            LogicalType::DateTime => Self::DateTime,
            LogicalType::Time => Self::Time,
            LogicalType::Timestamp => Self::Timestamp,
        }
    }

    /// Fields of a record type
    pub fn record_fields(&self) -> Option<&[SchemaField]> {
        match self {
            Self::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    /// Field name
    pub name: String,
    /// Field type
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the field may be null
    pub nullable: bool,
}

impl SchemaField {
    /// Create a field
    pub fn new(name: impl Into<String>, field_type: FieldType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable,
        }
    }
}

// ============================================================================
// Output Schema
// ============================================================================

/// Schema of the records produced for one extraction run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSchema {
    /// Root record name
    pub name: String,
    /// Top-level fields
    pub fields: Vec<SchemaField>,
}

impl OutputSchema {
    /// Create a schema
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Top-level field by name
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Encode as JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How a schema was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    /// Structural properties of the entity
    Default,
    /// Default plus expanded navigation paths
    Expand,
    /// Only the selected properties and paths
    Select,
}

impl SchemaMode {
    /// Pick the mode for the given options: select wins, then expand
    pub fn for_options(select: Option<&str>, expand: Option<&str>) -> Self {
        match (select, expand) {
            (Some(_), _) => Self::Select,
            (None, Some(_)) => Self::Expand,
            (None, None) => Self::Default,
        }
    }

    /// Name of the option driving this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Expand => "expand",
            Self::Select => "select",
        }
    }
}
