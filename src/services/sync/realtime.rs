use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SyncError;
use crate::models::entry::EntryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RealtimeKind {
    #[serde(alias = "create")]
    Insert,
    Update,
    Delete,
}

/// One change notification from the backend's realtime feed. The record
/// payload may be partial; consumers fetch the full record by id.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeEvent {
    pub kind: RealtimeKind,
    pub record_id: EntryId,
    pub raw_record: Value,
}

impl RealtimeEvent {
    /// Event whose payload carries only the id.
    pub fn new(kind: RealtimeKind, record_id: EntryId) -> Self {
        let raw_record = serde_json::json!({ "id": record_id.as_str() });
        Self {
            kind,
            record_id,
            raw_record,
        }
    }

    /// Parse a wire message of the form
    /// `{"action": "create|update|delete", "record": {"id": ...}}`.
    pub fn from_json(message: &str) -> Result<Self, SyncError> {
        let value: Value = serde_json::from_str(message)
            .map_err(|e| SyncError::MalformedEvent(e.to_string()))?;

        let action = value
            .get("action")
            .cloned()
            .ok_or_else(|| SyncError::MalformedEvent("missing action".into()))?;
        let kind: RealtimeKind = serde_json::from_value(action)
            .map_err(|e| SyncError::MalformedEvent(format!("unknown action: {}", e)))?;

        let raw_record = value
            .get("record")
            .cloned()
            .ok_or_else(|| SyncError::MalformedEvent("missing record".into()))?;
        let record_id = match raw_record.get("id") {
            Some(Value::String(id)) if !id.is_empty() => EntryId::from(id.as_str()),
            Some(Value::Number(id)) => EntryId::from(id.to_string()),
            _ => return Err(SyncError::MalformedEvent("record has no id".into())),
        };

        Ok(Self {
            kind,
            record_id,
            raw_record,
        })
    }
}
