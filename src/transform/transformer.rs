//! Raw entry to structured record conversion

use super::types::{FieldValue, Record};
use super::values::coerce;
use crate::decode::{DEFERRED_ELEMENT, RESULTS_ELEMENT};
use crate::error::{Error, Result};
use crate::schema::{FieldType, OutputSchema, SchemaField};
use crate::types::{JsonObject, JsonValue};

/// Converts raw feed entries into records shaped by an output schema
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

impl Transformer {
    /// Create a transformer
    pub fn new() -> Self {
        Self
    }

    /// Convert one raw entry.
    ///
    /// Fields without a raw value are null; absent collections are empty.
    pub fn transform(&self, schema: &OutputSchema, raw: &JsonObject) -> Result<Record> {
        transform_record(&schema.name, &schema.fields, raw)
    }
}

fn transform_record(name: &str, fields: &[SchemaField], raw: &JsonObject) -> Result<Record> {
    let mut record = Record::new(name);
    for field in fields {
        let value = present(raw.get(&field.name));
        record.push(field.name.clone(), transform_field(field, value)?);
    }
    Ok(record)
}

fn transform_field(field: &SchemaField, value: Option<&JsonValue>) -> Result<FieldValue> {
    match &field.field_type {
        FieldType::Array { items } => {
            let Some(value) = value else {
                return Ok(FieldValue::Array(Vec::new()));
            };
            let (name, fields) = record_parts(field, items)?;
            let records = collection(value)
                .iter()
                .map(|entry| match entry {
                    JsonValue::Object(object) => transform_record(name, fields, object),
                    other => Err(Error::transform(
                        &field.name,
                        format!("expected an object in collection, got {other}"),
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(FieldValue::Array(records))
        }
        FieldType::Record { name, fields } => match value {
            None => Ok(FieldValue::Null),
            Some(JsonValue::Object(object)) => {
                Ok(FieldValue::Record(transform_record(name, fields, object)?))
            }
            Some(other) => Err(Error::transform(
                &field.name,
                format!("expected an object, got {other}"),
            )),
        },
        scalar => match value {
            None => Ok(FieldValue::Null),
            Some(value) => coerce(&field.name, scalar, value),
        },
    }
}

fn record_parts<'a>(
    field: &SchemaField,
    items: &'a FieldType,
) -> Result<(&'a str, &'a [SchemaField])> {
    match items {
        FieldType::Record { name, fields } => Ok((name, fields)),
        _ => Err(Error::transform(&field.name, "array items must be records")),
    }
}

/// Entries of an inline collection: `{"results": [...]}`, a bare array, or a
/// single object
fn collection(value: &JsonValue) -> &[JsonValue] {
    match value {
        JsonValue::Array(items) => items,
        JsonValue::Object(object) => match object.get(RESULTS_ELEMENT) {
            Some(JsonValue::Array(items)) => items,
            _ => std::slice::from_ref(value),
        },
        _ => std::slice::from_ref(value),
    }
}

/// Treat null and unexpanded navigation stubs as absent
fn present(value: Option<&JsonValue>) -> Option<&JsonValue> {
    value.filter(|v| match v {
        JsonValue::Null => false,
        JsonValue::Object(object) => !object.contains_key(DEFERRED_ELEMENT),
        _ => true,
    })
}
