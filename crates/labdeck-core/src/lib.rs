use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod cell;
pub mod wire;

/// Identity field of a participant record. Never displayed as a column.
pub const IDENTITY_FIELD: &str = "id_in_session";

/// Field carrying the participant's last page load as Unix-epoch seconds.
/// Rendered as a relative-time widget instead of raw text.
pub const LAST_PAGE_TIMESTAMP_FIELD: &str = "_last_page_timestamp";

/// Field holding the operator's note for a participant.
pub const MONITOR_NOTE_FIELD: &str = "_monitor_note";

/// One participant's state as published by the session server. The field map
/// keeps server order, which fixes the table's column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantRow {
    pub id_in_session: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ParticipantRow {
    pub fn new(id_in_session: i64) -> Self {
        Self {
            id_in_session,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_order_survives_deserialization() {
        let raw = r#"{"id_in_session": 3, "label": "P3", "status": "Playing", "_monitor_note": null}"#;
        let row: ParticipantRow = serde_json::from_str(raw).unwrap();
        assert_eq!(row.id_in_session, 3);
        let names: Vec<&str> = row.fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["label", "status", "_monitor_note"]);
    }

    #[test]
    fn identity_field_is_not_part_of_the_field_map() {
        let row: ParticipantRow =
            serde_json::from_value(json!({"id_in_session": 1, "label": "P1"})).unwrap();
        assert!(!row.fields.contains_key(IDENTITY_FIELD));
    }
}
