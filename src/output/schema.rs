//! Output schema to Arrow schema mapping

use crate::error::{Error, Result};
use crate::schema::{FieldType, OutputSchema, SchemaField};
use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use std::sync::Arc;

/// Timezone attached to timestamp columns
pub const TIMESTAMP_TIMEZONE: &str = "UTC";

/// Name of the element field inside list columns
pub const LIST_ITEM_NAME: &str = "item";

/// Map an output schema to an Arrow schema
pub fn to_arrow_schema(schema: &OutputSchema) -> Result<Schema> {
    Ok(Schema::new(to_arrow_fields(&schema.fields)?))
}

pub(crate) fn to_arrow_fields(fields: &[SchemaField]) -> Result<Fields> {
    fields
        .iter()
        .map(|f| Ok(Field::new(&f.name, to_arrow_type(&f.field_type)?, f.nullable)))
        .collect::<Result<Vec<_>>>()
        .map(Fields::from)
}

/// Arrow type for a field type
pub fn to_arrow_type(field_type: &FieldType) -> Result<DataType> {
    let data_type = match field_type {
        FieldType::Int => DataType::Int32,
        FieldType::Long => DataType::Int64,
        FieldType::Float => DataType::Float32,
        FieldType::Double => DataType::Float64,
        FieldType::Decimal { precision, scale } => {
            let (precision, scale) = decimal_params(*precision, *scale)?;
            DataType::Decimal128(precision, scale)
        }
        FieldType::String => DataType::Utf8,
        FieldType::Bytes => DataType::Binary,
        FieldType::Boolean => DataType::Boolean,
        FieldType::DateTime => DataType::Timestamp(TimeUnit::Microsecond, None),
        FieldType::Time => DataType::Time64(TimeUnit::Microsecond),
        FieldType::Timestamp => {
            DataType::Timestamp(TimeUnit::Microsecond, Some(TIMESTAMP_TIMEZONE.into()))
        }
        FieldType::Record { fields, .. } => DataType::Struct(to_arrow_fields(fields)?),
        FieldType::Array { items } => DataType::List(Arc::new(Field::new(
            LIST_ITEM_NAME,
            to_arrow_type(items)?,
            true,
        ))),
    };
    Ok(data_type)
}

pub(crate) fn decimal_params(precision: u32, scale: u32) -> Result<(u8, i8)> {
    let invalid = || Error::output(format!("unsupported decimal({precision}, {scale})"));
    let p = u8::try_from(precision).map_err(|_| invalid())?;
    let s = i8::try_from(scale).map_err(|_| invalid())?;
    if p == 0 || p > arrow::datatypes::DECIMAL128_MAX_PRECISION || scale > precision {
        return Err(invalid());
    }
    Ok((p, s))
}
