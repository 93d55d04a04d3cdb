//! Tests for record transformation

use super::values::{parse_date_literal, parse_datetime, parse_time, parse_timestamp};
use super::*;
use crate::metadata::fixtures::catalog;
use crate::schema::{FieldType, OutputSchema, SchemaField, SchemaGenerator};
use crate::types::JsonObject;
use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::json;
use std::str::FromStr;

fn object(value: serde_json::Value) -> JsonObject {
    value.as_object().cloned().unwrap()
}

fn flat_schema(fields: Vec<SchemaField>) -> OutputSchema {
    OutputSchema::new("Row", fields)
}

fn decimal_schema(scale: u32) -> OutputSchema {
    flat_schema(vec![SchemaField::new(
        "amount",
        FieldType::Decimal {
            precision: 15,
            scale,
        },
        true,
    )])
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn test_decimal_rounds_half_up_to_scale() {
    let record = Transformer::new()
        .transform(&decimal_schema(2), &object(json!({"amount": "123.456"})))
        .unwrap();

    assert_eq!(
        record.get("amount"),
        Some(&FieldValue::Decimal(Decimal::from_str("123.46").unwrap()))
    );
}

#[test]
fn test_decimal_midpoint_rounds_away_from_zero() {
    let transformer = Transformer::new();
    for (raw, expected) in [("0.125", "0.13"), ("-0.125", "-0.13"), ("2.5", "2.50")] {
        let record = transformer
            .transform(&decimal_schema(2), &object(json!({ "amount": raw })))
            .unwrap();
        assert_eq!(
            record.get("amount"),
            Some(&FieldValue::Decimal(Decimal::from_str(expected).unwrap()))
        );
    }
}

#[test]
fn test_decimal_from_json_number() {
    let record = Transformer::new()
        .transform(&decimal_schema(1), &object(json!({"amount": 10.25})))
        .unwrap();

    assert_eq!(
        record.get("amount"),
        Some(&FieldValue::Decimal(Decimal::from_str("10.3").unwrap()))
    );
}

#[test]
fn test_numeric_strings_are_coerced() {
    let schema = flat_schema(vec![
        SchemaField::new("id", FieldType::Long, false),
        SchemaField::new("stock", FieldType::Int, false),
        SchemaField::new("weight", FieldType::Double, true),
        SchemaField::new("rating", FieldType::Float, true),
    ]);

    let record = Transformer::new()
        .transform(
            &schema,
            &object(json!({"id": "9007199254740993", "stock": 12, "weight": "1.5", "rating": 4.5})),
        )
        .unwrap();

    assert_eq!(record.get("id"), Some(&FieldValue::Long(9_007_199_254_740_993)));
    assert_eq!(record.get("stock"), Some(&FieldValue::Int(12)));
    assert_eq!(record.get("weight"), Some(&FieldValue::Double(1.5)));
    assert_eq!(record.get("rating"), Some(&FieldValue::Float(4.5)));
}

#[test]
fn test_int_overflow_is_an_error() {
    let schema = flat_schema(vec![SchemaField::new("stock", FieldType::Int, false)]);
    let err = Transformer::new()
        .transform(&schema, &object(json!({"stock": 5_000_000_000_i64})))
        .unwrap_err();

    assert!(matches!(err, crate::Error::Transform { ref field, .. } if field == "stock"));
}

#[test]
fn test_binary_and_boolean() {
    let schema = flat_schema(vec![
        SchemaField::new("thumbnail", FieldType::Bytes, true),
        SchemaField::new("discontinued", FieldType::Boolean, true),
        SchemaField::new("label", FieldType::String, true),
    ]);

    let record = Transformer::new()
        .transform(
            &schema,
            &object(json!({"thumbnail": "aGVsbG8=", "discontinued": "true", "label": 42})),
        )
        .unwrap();

    assert_eq!(record.get("thumbnail"), Some(&FieldValue::Bytes(b"hello".to_vec())));
    assert_eq!(record.get("discontinued"), Some(&FieldValue::Boolean(true)));
    assert_eq!(record.get("label"), Some(&FieldValue::String("42".to_string())));
}

#[test]
fn test_missing_values_stay_null() {
    let schema = flat_schema(vec![
        SchemaField::new("id", FieldType::Long, false),
        SchemaField::new("name", FieldType::String, true),
    ]);

    let record = Transformer::new()
        .transform(&schema, &object(json!({"name": null})))
        .unwrap();

    assert!(record.get("id").unwrap().is_null());
    assert!(record.get("name").unwrap().is_null());
    assert_eq!(record.len(), 2);
}

// ============================================================================
// Dates and times
// ============================================================================

#[test]
fn test_date_literal() {
    let instant = parse_date_literal("/Date(1700000000000)/").unwrap();
    assert_eq!(instant.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(instant.offset().local_minus_utc(), 0);
}

#[test]
fn test_date_literal_with_offset() {
    let instant = parse_date_literal("/Date(1700000000000+0060)/").unwrap();
    assert_eq!(instant.timestamp_millis(), 1_700_000_000_000);
    assert_eq!(instant.offset().local_minus_utc(), 3600);

    let negative = parse_date_literal("/Date(1700000000000-0330)/").unwrap();
    assert_eq!(negative.offset().local_minus_utc(), -(3 * 3600 + 30 * 60));
}

#[test]
fn test_parse_datetime_variants() {
    let expected = NaiveDate::from_ymd_opt(2023, 11, 14)
        .unwrap()
        .and_hms_opt(22, 13, 20)
        .unwrap();

    assert_eq!(parse_datetime("/Date(1700000000000)/"), Some(expected));
    assert_eq!(parse_datetime("2023-11-14T22:13:20"), Some(expected));
    assert_eq!(parse_datetime("2023-11-14T22:13:20Z"), Some(expected));
    assert_eq!(
        parse_datetime("2023-11-14"),
        NaiveDate::from_ymd_opt(2023, 11, 14).unwrap().and_hms_opt(0, 0, 0)
    );
    assert_eq!(parse_datetime("yesterday"), None);
}

#[test]
fn test_parse_time_variants() {
    assert_eq!(parse_time("PT10H30M15S"), NaiveTime::from_hms_opt(10, 30, 15));
    assert_eq!(parse_time("PT8H"), NaiveTime::from_hms_opt(8, 0, 0));
    assert_eq!(
        parse_time("PT0H0M1.5S"),
        NaiveTime::from_hms_micro_opt(0, 0, 1, 500_000)
    );
    assert_eq!(parse_time("07:45:00"), NaiveTime::from_hms_opt(7, 45, 0));
    assert_eq!(parse_time("PT25H"), None);
}

#[test]
fn test_parse_timestamp_keeps_offset() {
    let ts = parse_timestamp("2023-11-14T23:13:20+01:00").unwrap();
    assert_eq!(ts.timestamp(), 1_700_000_000);
    assert_eq!(ts.offset().local_minus_utc(), 3600);
}

#[test]
fn test_temporal_fields() {
    let schema = flat_schema(vec![
        SchemaField::new("createdAt", FieldType::DateTime, true),
        SchemaField::new("openingTime", FieldType::Time, true),
        SchemaField::new("updatedAt", FieldType::Timestamp, true),
    ]);

    let record = Transformer::new()
        .transform(
            &schema,
            &object(json!({
                "createdAt": "/Date(1700000000000)/",
                "openingTime": "PT09H00M00S",
                "updatedAt": "/Date(1700000000000+0120)/"
            })),
        )
        .unwrap();

    assert!(matches!(record.get("createdAt"), Some(FieldValue::DateTime(_))));
    assert_eq!(
        record.get("openingTime"),
        Some(&FieldValue::Time(NaiveTime::from_hms_opt(9, 0, 0).unwrap()))
    );
    let Some(FieldValue::Timestamp(ts)) = record.get("updatedAt") else {
        panic!("updatedAt should be a timestamp");
    };
    assert_eq!(ts.offset().local_minus_utc(), 7200);
}

#[test]
fn test_invalid_date_is_an_error() {
    let schema = flat_schema(vec![SchemaField::new("createdAt", FieldType::DateTime, true)]);
    let err = Transformer::new()
        .transform(&schema, &object(json!({"createdAt": "soon"})))
        .unwrap_err();

    assert!(err.to_string().contains("createdAt"));
}

// ============================================================================
// Nested records
// ============================================================================

#[test]
fn test_nested_navigation_and_collections() {
    let metadata = catalog();
    let schema = SchemaGenerator::new(&metadata)
        .selected_schema("Products", "id,category,reviews,reviews/author")
        .unwrap();

    let raw = object(json!({
        "id": "1",
        "category": {"code": "A", "title": "Audio"},
        "reviews": {"results": [
            {"id": "10", "text": "good", "score": 4, "author": {"id": "c1", "email": "a@b.c"}},
            {"id": "11", "text": "bad", "score": 1, "author": {"__deferred": {"uri": "x"}}}
        ]}
    }));

    let record = Transformer::new().transform(&schema, &raw).unwrap();

    assert_eq!(record.name(), "Product");
    let category = record.get("category").unwrap().as_record().unwrap();
    assert_eq!(category.get("code"), Some(&FieldValue::String("A".into())));

    let reviews = record.get("reviews").unwrap().as_array().unwrap();
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].get("score"), Some(&FieldValue::Int(4)));
    let author = reviews[0].get("author").unwrap().as_record().unwrap();
    assert_eq!(author.get("email"), Some(&FieldValue::String("a@b.c".into())));
    assert!(reviews[1].get("author").unwrap().is_null());
}

#[test]
fn test_absent_collection_is_empty_and_absent_record_is_null() {
    let metadata = catalog();
    let schema = SchemaGenerator::new(&metadata)
        .selected_schema("Products", "id,category,reviews")
        .unwrap();

    let record = Transformer::new()
        .transform(
            &schema,
            &object(json!({"id": "2", "reviews": {"__deferred": {"uri": "x"}}})),
        )
        .unwrap();

    assert!(record.get("category").unwrap().is_null());
    assert_eq!(record.get("reviews"), Some(&FieldValue::Array(Vec::new())));
}

#[test]
fn test_collection_shapes() {
    let metadata = catalog();
    let schema = SchemaGenerator::new(&metadata)
        .selected_schema("Products", "reviews")
        .unwrap();
    let transformer = Transformer::new();

    let bare = transformer
        .transform(&schema, &object(json!({"reviews": [{"id": "1"}, {"id": "2"}]})))
        .unwrap();
    assert_eq!(bare.get("reviews").unwrap().as_array().unwrap().len(), 2);

    let single = transformer
        .transform(&schema, &object(json!({"reviews": {"id": "1"}})))
        .unwrap();
    assert_eq!(single.get("reviews").unwrap().as_array().unwrap().len(), 1);
}

#[test]
fn test_complex_property() {
    let metadata = catalog();
    let schema = SchemaGenerator::new(&metadata)
        .selected_schema("Products", "dimensions")
        .unwrap();

    let record = Transformer::new()
        .transform(
            &schema,
            &object(json!({"dimensions": {"width": "1.005", "height": "2", "unit": "cm"}})),
        )
        .unwrap();

    let dimensions = record.get("dimensions").unwrap().as_record().unwrap();
    assert_eq!(
        dimensions.get("width"),
        Some(&FieldValue::Decimal(Decimal::from_str("1.01").unwrap()))
    );
    assert_eq!(dimensions.get("unit"), Some(&FieldValue::String("cm".into())));
}

#[test]
fn test_record_serializes_as_map() {
    let schema = flat_schema(vec![
        SchemaField::new("id", FieldType::Long, false),
        SchemaField::new("name", FieldType::String, true),
    ]);
    let record = Transformer::new()
        .transform(&schema, &object(json!({"id": 5, "name": "Lamp"})))
        .unwrap();

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        json!({"id": 5, "name": "Lamp"})
    );
}
