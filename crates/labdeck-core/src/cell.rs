use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::LAST_PAGE_TIMESTAMP_FIELD;

/// Display form of one table cell, produced once per applied change and
/// handed to the rendering adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum CellDisplay {
    Empty,
    Text(String),
    /// Relative-time widget. The adapter re-renders the age on every pass
    /// because wall-clock time advances independently of data changes.
    Elapsed(DateTime<Utc>),
}

impl CellDisplay {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellDisplay::Empty)
    }
}

/// Canonical string form of a field value, used to decide whether a cell
/// changed. Null maps to the empty string.
pub fn comparison_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Display representation of a field value. Null renders empty; the last
/// page timestamp field renders as a relative-time widget seeded from
/// epoch seconds; everything else renders as its canonical string form.
pub fn display_value(value: &Value, field_name: &str) -> CellDisplay {
    if value.is_null() {
        return CellDisplay::Empty;
    }
    if field_name == LAST_PAGE_TIMESTAMP_FIELD {
        if let Some(instant) = epoch_seconds_to_instant(value) {
            return CellDisplay::Elapsed(instant);
        }
    }
    CellDisplay::Text(comparison_value(value))
}

/// The server sends the timestamp as a float of Unix-epoch seconds, either
/// as a JSON number or its string form.
fn epoch_seconds_to_instant(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Utc.timestamp_millis_opt((seconds * 1000.0) as i64).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_maps_to_empty_for_every_field_name() {
        for field in ["label", LAST_PAGE_TIMESTAMP_FIELD, "anything"] {
            assert_eq!(comparison_value(&Value::Null), "");
            assert!(display_value(&Value::Null, field).is_empty());
        }
    }

    #[test]
    fn scalars_take_canonical_string_form() {
        assert_eq!(comparison_value(&json!("Waiting")), "Waiting");
        assert_eq!(comparison_value(&json!(42)), "42");
        assert_eq!(comparison_value(&json!(1.5)), "1.5");
        assert_eq!(comparison_value(&json!(true)), "true");
    }

    #[test]
    fn timestamp_field_becomes_relative_time_widget() {
        let display = display_value(&json!(1_700_000_000.25), LAST_PAGE_TIMESTAMP_FIELD);
        match display {
            CellDisplay::Elapsed(instant) => {
                assert_eq!(instant.timestamp_millis(), 1_700_000_000_250);
            }
            other => panic!("expected Elapsed, got {other:?}"),
        }
    }

    #[test]
    fn timestamp_accepts_string_form() {
        let display = display_value(&json!("1700000000.5"), LAST_PAGE_TIMESTAMP_FIELD);
        assert!(matches!(display, CellDisplay::Elapsed(_)));
    }

    #[test]
    fn timestamp_in_other_fields_stays_text() {
        assert_eq!(
            display_value(&json!(1_700_000_000.25), "score"),
            CellDisplay::Text("1700000000.25".to_string())
        );
    }
}
