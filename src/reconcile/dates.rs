// ============================================================================
// Date Normalization
// ============================================================================
//
// Date-typed fields are edited through text inputs, date pickers and
// numeric epoch values. Before an entity is persisted each of them is
// parsed and canonicalized to `Value::Timestamp` (UTC).
//
// ============================================================================

use crate::core::{ReconcileError, Result, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Naive date-time layouts, interpreted as UTC
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, interpreted as midnight UTC
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Coerce a tracked value of a date-typed field into canonical form.
///
/// `Null` and blank text stay `Null` (a cleared date). Numbers are Unix
/// epoch milliseconds.
pub fn normalize_timestamp(field: &str, value: &Value) -> Result<Value> {
    let invalid = || ReconcileError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    };

    let ts = match value {
        Value::Null => return Ok(Value::Null),
        Value::Timestamp(ts) => *ts,
        Value::Integer(millis) => DateTime::from_timestamp_millis(*millis).ok_or_else(invalid)?,
        Value::Float(millis) if millis.is_finite() => {
            DateTime::from_timestamp_millis(millis.trunc() as i64).ok_or_else(invalid)?
        }
        Value::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(Value::Null);
            }
            parse_text(text).ok_or_else(invalid)?
        }
        Value::Float(_) | Value::Boolean(_) => return Err(invalid()),
    };

    Ok(Value::Timestamp(ts))
}

fn parse_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    None
}
