//! Structured output records

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A typed field value
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Absent or null
    Null,
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// Single precision float
    Float(f32),
    /// Double precision float
    Double(f64),
    /// Decimal rounded to the schema scale
    Decimal(Decimal),
    /// String
    String(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Boolean
    Boolean(bool),
    /// Local date-time
    DateTime(NaiveDateTime),
    /// Time of day
    Time(NaiveTime),
    /// Instant with its original offset
    Timestamp(DateTime<FixedOffset>),
    /// Nested record
    Record(Record),
    /// Collection of nested records
    Array(Vec<Record>),
}

impl FieldValue {
    /// Whether the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Nested record, if this is one
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Nested records, if this is an array
    pub fn as_array(&self) -> Option<&[Record]> {
        match self {
            Self::Array(records) => Some(records),
            _ => None,
        }
    }
}

/// A record shaped by an [`OutputSchema`](crate::schema::OutputSchema)
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Create an empty record
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field
    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    /// Record type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field value by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Fields in schema order
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
