//! Transformed records to Arrow record batches

use super::schema::{decimal_params, to_arrow_schema, TIMESTAMP_TIMEZONE};
use crate::error::{Error, Result};
use crate::schema::{FieldType, OutputSchema, SchemaField};
use crate::transform::{FieldValue, Record};
use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Decimal128Array, Float32Array, Float64Array, Int32Array,
    Int64Array, ListArray, StringArray, StructArray, Time64MicrosecondArray,
    TimestampMicrosecondArray,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields};
use arrow::record_batch::RecordBatch;
use chrono::Timelike;
use std::sync::Arc;

/// Convert transformed records into one Arrow record batch
pub fn records_to_batch(schema: &OutputSchema, records: &[Record]) -> Result<RecordBatch> {
    let arrow_schema = Arc::new(to_arrow_schema(schema)?);
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(arrow_schema));
    }

    let rows: Vec<Option<&Record>> = records.iter().map(Some).collect();
    let columns = schema
        .fields
        .iter()
        .map(|field| build_array(field, &column_values(&rows, &field.name)))
        .collect::<Result<Vec<_>>>()?;

    RecordBatch::try_new(arrow_schema, columns).map_err(|e| Error::Output {
        message: format!("Failed to create RecordBatch: {e}"),
    })
}

/// Values of one field across rows; a missing row yields `None`
fn column_values<'a>(rows: &[Option<&'a Record>], name: &str) -> Vec<Option<&'a FieldValue>> {
    rows.iter()
        .map(|row| row.and_then(|r| r.get(name)).filter(|v| !v.is_null()))
        .collect()
}

fn mismatch(field: &SchemaField, value: &FieldValue) -> Error {
    Error::output(format!(
        "value {value:?} does not match the type of field '{}'",
        field.name
    ))
}

/// Build an Arrow array for one field from its values
fn build_array(field: &SchemaField, values: &[Option<&FieldValue>]) -> Result<ArrayRef> {
    macro_rules! primitive {
        ($array:ty, $variant:ident, $convert:expr) => {{
            let array = values
                .iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some(FieldValue::$variant(inner)) => Ok(Some($convert(inner))),
                    Some(other) => Err(mismatch(field, other)),
                })
                .collect::<Result<$array>>()?;
            Arc::new(array) as ArrayRef
        }};
    }

    let array = match &field.field_type {
        FieldType::Int => primitive!(Int32Array, Int, |v: &i32| *v),
        FieldType::Long => primitive!(Int64Array, Long, |v: &i64| *v),
        FieldType::Float => primitive!(Float32Array, Float, |v: &f32| *v),
        FieldType::Double => primitive!(Float64Array, Double, |v: &f64| *v),
        FieldType::Boolean => primitive!(BooleanArray, Boolean, |v: &bool| *v),
        FieldType::String => primitive!(StringArray, String, |v: &String| v.clone()),
        FieldType::Bytes => primitive!(BinaryArray, Bytes, |v: &Vec<u8>| v.clone()),
        FieldType::DateTime => primitive!(
            TimestampMicrosecondArray,
            DateTime,
            |v: &chrono::NaiveDateTime| v.and_utc().timestamp_micros()
        ),
        FieldType::Time => primitive!(Time64MicrosecondArray, Time, |v: &chrono::NaiveTime| {
            i64::from(v.num_seconds_from_midnight()) * 1_000_000 + i64::from(v.nanosecond() / 1_000)
        }),
        FieldType::Timestamp => {
            let array = values
                .iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some(FieldValue::Timestamp(ts)) => Ok(Some(ts.timestamp_micros())),
                    Some(other) => Err(mismatch(field, other)),
                })
                .collect::<Result<TimestampMicrosecondArray>>()?
                .with_timezone(TIMESTAMP_TIMEZONE);
            Arc::new(array) as ArrayRef
        }
        FieldType::Decimal { precision, scale } => {
            let (p, s) = decimal_params(*precision, *scale)?;
            let array = values
                .iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some(FieldValue::Decimal(d)) => {
                        let mut d = *d;
                        d.rescale(*scale);
                        Ok(Some(d.mantissa()))
                    }
                    Some(other) => Err(mismatch(field, other)),
                })
                .collect::<Result<Decimal128Array>>()?
                .with_precision_and_scale(p, s)?;
            Arc::new(array) as ArrayRef
        }
        FieldType::Record { fields, .. } => {
            let records = values
                .iter()
                .map(|v| match v {
                    None => Ok(None),
                    Some(FieldValue::Record(r)) => Ok(Some(r)),
                    Some(other) => Err(mismatch(field, other)),
                })
                .collect::<Result<Vec<_>>>()?;
            build_struct_array(fields, &records)?
        }
        FieldType::Array { items } => build_list_array(field, items, values)?,
    };

    Ok(array)
}

/// Build a struct array; a `None` row is a null struct
fn build_struct_array(fields: &[SchemaField], rows: &[Option<&Record>]) -> Result<ArrayRef> {
    let arrow_fields: Fields = super::schema::to_arrow_fields(fields)?;
    let children = fields
        .iter()
        .map(|field| build_array(field, &column_values(rows, &field.name)))
        .collect::<Result<Vec<_>>>()?;

    let nulls = rows
        .iter()
        .any(Option::is_none)
        .then(|| NullBuffer::from(rows.iter().map(Option::is_some).collect::<Vec<_>>()));

    let array = StructArray::try_new(arrow_fields, children, nulls)?;
    Ok(Arc::new(array))
}

/// Build a list-of-struct array; a null row is an empty list
fn build_list_array(
    field: &SchemaField,
    items: &FieldType,
    values: &[Option<&FieldValue>],
) -> Result<ArrayRef> {
    let FieldType::Record { fields, .. } = items else {
        return Err(Error::output(format!(
            "array field '{}' must hold records",
            field.name
        )));
    };

    let mut flattened: Vec<Option<&Record>> = Vec::new();
    let mut offsets: Vec<i32> = vec![0];

    for value in values {
        match value {
            None => {}
            Some(FieldValue::Array(records)) => flattened.extend(records.iter().map(Some)),
            Some(other) => return Err(mismatch(field, other)),
        }
        let offset = i32::try_from(flattened.len()).map_err(|_| Error::Output {
            message: "Array too large for i32 offset".to_string(),
        })?;
        offsets.push(offset);
    }

    let items_array = build_struct_array(fields, &flattened)?;
    let item_field = match super::schema::to_arrow_type(&field.field_type)? {
        DataType::List(item) => item,
        other => Arc::new(Field::new("item", other, true)),
    };

    let list = ListArray::try_new(
        item_field,
        OffsetBuffer::new(offsets.into()),
        items_array,
        None,
    )?;
    Ok(Arc::new(list))
}
