//! Scalar literal coercion
//!
//! Data pages carry dates as `/Date(ms)/` or `/Date(ms+mmmm)/`, times as
//! `PT..H..M..S` durations and 64-bit integers and decimals as strings.

use crate::error::{Error, Result};
use crate::schema::FieldType;
use crate::types::JsonValue;
use base64::Engine;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use std::sync::LazyLock;

use super::types::FieldValue;

static DATE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/Date\((-?\d+)(?:([+-])(\d{4}))?\)/$").expect("valid regex")
});

static DURATION_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").expect("valid regex")
});

/// Coerce a non-null scalar into the value for a field type
pub(crate) fn coerce(field: &str, field_type: &FieldType, value: &JsonValue) -> Result<FieldValue> {
    let mismatch = || {
        Error::transform(
            field,
            format!("cannot convert {value} to {}", type_label(field_type)),
        )
    };

    let coerced = match field_type {
        FieldType::Int => {
            let n = integer(value).ok_or_else(mismatch)?;
            FieldValue::Int(i32::try_from(n).map_err(|_| mismatch())?)
        }
        FieldType::Long => FieldValue::Long(integer(value).ok_or_else(mismatch)?),
        #[allow(clippy::cast_possible_truncation)]
        FieldType::Float => FieldValue::Float(float(value).ok_or_else(mismatch)? as f32),
        FieldType::Double => FieldValue::Double(float(value).ok_or_else(mismatch)?),
        FieldType::Decimal { scale, .. } => {
            let decimal = decimal(value).ok_or_else(mismatch)?;
            FieldValue::Decimal(
                decimal.round_dp_with_strategy(*scale, RoundingStrategy::MidpointAwayFromZero),
            )
        }
        FieldType::String => FieldValue::String(match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }),
        FieldType::Bytes => {
            let text = value.as_str().ok_or_else(mismatch)?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(text)
                .map_err(|e| Error::transform(field, format!("invalid base64: {e}")))?;
            FieldValue::Bytes(bytes)
        }
        FieldType::Boolean => FieldValue::Boolean(match value {
            JsonValue::Bool(b) => *b,
            JsonValue::String(s) => bool::from_str(s).map_err(|_| mismatch())?,
            _ => return Err(mismatch()),
        }),
        FieldType::DateTime => {
            let text = value.as_str().ok_or_else(mismatch)?;
            FieldValue::DateTime(parse_datetime(text).ok_or_else(mismatch)?)
        }
        FieldType::Time => {
            let text = value.as_str().ok_or_else(mismatch)?;
            FieldValue::Time(parse_time(text).ok_or_else(mismatch)?)
        }
        FieldType::Timestamp => {
            let text = value.as_str().ok_or_else(mismatch)?;
            FieldValue::Timestamp(parse_timestamp(text).ok_or_else(mismatch)?)
        }
        FieldType::Record { .. } | FieldType::Array { .. } => return Err(mismatch()),
    };

    Ok(coerced)
}

fn type_label(field_type: &FieldType) -> &'static str {
    match field_type {
        FieldType::Int => "int",
        FieldType::Long => "long",
        FieldType::Float => "float",
        FieldType::Double => "double",
        FieldType::Decimal { .. } => "decimal",
        FieldType::String => "string",
        FieldType::Bytes => "bytes",
        FieldType::DateTime => "datetime",
        FieldType::Time => "time",
        FieldType::Timestamp => "timestamp",
        FieldType::Boolean => "boolean",
        FieldType::Record { .. } => "record",
        FieldType::Array { .. } => "array",
    }
}

fn integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decimal(value: &JsonValue) -> Option<Decimal> {
    match value {
        JsonValue::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        JsonValue::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

// ============================================================================
// Date and time literals
// ============================================================================

/// Parse `/Date(ms)/` or `/Date(ms±mmmm)/` into an instant at its offset
pub(crate) fn parse_date_literal(text: &str) -> Option<DateTime<FixedOffset>> {
    let captures = DATE_LITERAL.captures(text.trim())?;
    let millis: i64 = captures.get(1)?.as_str().parse().ok()?;
    let instant = DateTime::<Utc>::from_timestamp_millis(millis)?;

    let offset_seconds = match (captures.get(2), captures.get(3)) {
        (Some(sign), Some(minutes)) => {
            let minutes: i32 = minutes.as_str().parse().ok()?;
            if sign.as_str() == "-" {
                -minutes * 60
            } else {
                minutes * 60
            }
        }
        _ => 0,
    };

    Some(instant.with_timezone(&FixedOffset::east_opt(offset_seconds)?))
}

/// Local date-time from a date literal (UTC wall clock) or an ISO string
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Some(instant) = parse_date_literal(text) {
        return Some(instant.naive_utc());
    }

    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Time of day from a `PT..H..M..S` duration or `HH:MM:SS`
pub(crate) fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    if let Some(captures) = DURATION_LITERAL.captures(text) {
        let part = |i: usize| captures.get(i).map_or("0", |m| m.as_str());
        let hours: u32 = part(1).parse().ok()?;
        let minutes: u32 = part(2).parse().ok()?;
        let seconds: f64 = part(3).parse().ok()?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (whole, micros) = (seconds.trunc() as u32, (seconds.fract() * 1e6).round() as u32);
        return NaiveTime::from_hms_micro_opt(hours, minutes, whole, micros);
    }

    NaiveTime::parse_from_str(text, "%H:%M:%S%.f").ok()
}

/// Instant with offset from a date literal or an RFC 3339 string
pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    parse_date_literal(text).or_else(|| DateTime::parse_from_rfc3339(text.trim()).ok())
}
