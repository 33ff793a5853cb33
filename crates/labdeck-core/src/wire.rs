use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::ParticipantRow;

/// `type` value selecting the note-update path. Any other value, or no
/// `type` at all, selects full synchronization.
pub const NOTE_UPDATE_TYPE: &str = "update_notes";

/// Full snapshot of all known participants, ordered by ascending identity
/// key. Not a diff: absent participants simply do not appear.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotPayload {
    pub rows: Vec<ParticipantRow>,
}

/// Targeted note update for a batch of participants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NoteUpdatePayload {
    pub ids: Vec<i64>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundMsg {
    Snapshot(SnapshotPayload),
    UpdateNotes(NoteUpdatePayload),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WireError {
    #[error("frame is not valid JSON: {0}")]
    Json(String),
    #[error("malformed {kind} payload: {detail}")]
    Payload { kind: &'static str, detail: String },
}

impl InboundMsg {
    /// Parse one text frame, dispatching on the `type` field.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| WireError::Json(err.to_string()))?;
        let is_note_update =
            value.get("type").and_then(Value::as_str) == Some(NOTE_UPDATE_TYPE);
        if is_note_update {
            let payload = serde_json::from_value(value).map_err(|err| WireError::Payload {
                kind: NOTE_UPDATE_TYPE,
                detail: err.to_string(),
            })?;
            Ok(InboundMsg::UpdateNotes(payload))
        } else {
            let payload = serde_json::from_value(value).map_err(|err| WireError::Payload {
                kind: "snapshot",
                detail: err.to_string(),
            })?;
            Ok(InboundMsg::Snapshot(payload))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_type_selects_snapshot_path() {
        let msg = InboundMsg::parse(
            r#"{"rows": [{"id_in_session": 1, "label": "P1", "_monitor_note": null}]}"#,
        )
        .unwrap();
        match msg {
            InboundMsg::Snapshot(payload) => {
                assert_eq!(payload.rows.len(), 1);
                assert_eq!(payload.rows[0].id_in_session, 1);
            }
            other => panic!("expected snapshot, got {other:?}"),
        }
    }

    #[test]
    fn note_update_type_selects_note_path() {
        let msg =
            InboundMsg::parse(r#"{"type": "update_notes", "ids": [20, 30], "note": "flag"}"#)
                .unwrap();
        assert_eq!(
            msg,
            InboundMsg::UpdateNotes(NoteUpdatePayload {
                ids: vec![20, 30],
                note: "flag".to_string(),
            })
        );
    }

    #[test]
    fn unknown_type_falls_through_to_snapshot_path() {
        let msg = InboundMsg::parse(r#"{"type": "something_else", "rows": []}"#).unwrap();
        assert_eq!(msg, InboundMsg::Snapshot(SnapshotPayload { rows: vec![] }));
    }

    #[test]
    fn invalid_json_is_a_typed_error() {
        assert!(matches!(
            InboundMsg::parse("{nope"),
            Err(WireError::Json(_))
        ));
    }

    #[test]
    fn snapshot_without_rows_is_malformed() {
        assert!(matches!(
            InboundMsg::parse(r#"{"participants": []}"#),
            Err(WireError::Payload {
                kind: "snapshot",
                ..
            })
        ));
    }

    #[test]
    fn note_update_without_ids_is_malformed() {
        assert!(matches!(
            InboundMsg::parse(r#"{"type": "update_notes", "note": "x"}"#),
            Err(WireError::Payload {
                kind: "update_notes",
                ..
            })
        ));
    }
}
