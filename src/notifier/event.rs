//! # Change Events
//!
//! Typed notification emitted after a committed write. Stream entries are
//! flat string maps, so the event is converted to and from field pairs only
//! at the broker boundary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{NotifyError, NotifyResult};

/// Which write produced the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Insert-only write (POST)
    Insert,
    /// Insert-or-replace write (PUT)
    Upsert,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Insert => "insert",
            ChangeKind::Upsert => "upsert",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "insert" => Some(ChangeKind::Insert),
            "upsert" => Some(ChangeKind::Upsert),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification that `(namespace, key)` was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub namespace: String,
    pub key: String,
    pub kind: ChangeKind,
    pub emitted_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Event stamped with the current time
    pub fn new(namespace: impl Into<String>, key: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            kind,
            emitted_at: Utc::now(),
        }
    }

    /// Stream entry fields, in a fixed order
    pub fn fields(&self) -> [(&'static str, String); 4] {
        [
            ("namespace", self.namespace.clone()),
            ("key", self.key.clone()),
            ("kind", self.kind.as_str().to_string()),
            ("emitted_at", self.emitted_at.to_rfc3339()),
        ]
    }

    /// Rebuild an event from stream entry fields
    pub fn from_fields(id: &str, fields: &BTreeMap<String, String>) -> NotifyResult<Self> {
        let field = |name: &str| {
            fields.get(name).ok_or_else(|| NotifyError::MalformedEntry {
                id: id.to_string(),
                reason: format!("missing field '{}'", name),
            })
        };

        let kind = ChangeKind::parse(field("kind")?).ok_or_else(|| NotifyError::MalformedEntry {
            id: id.to_string(),
            reason: "unknown kind".to_string(),
        })?;
        let emitted_at = DateTime::parse_from_rfc3339(field("emitted_at")?)
            .map_err(|e| NotifyError::MalformedEntry {
                id: id.to_string(),
                reason: format!("bad emitted_at: {}", e),
            })?
            .with_timezone(&Utc);

        Ok(Self {
            namespace: field("namespace")?.clone(),
            key: field("key")?.clone(),
            kind,
            emitted_at,
        })
    }
}

/// One entry read back from a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub stream: String,
    /// Broker-assigned id (`<millis>-<seq>`)
    pub id: String,
    pub fields: BTreeMap<String, String>,
}

impl StreamEntry {
    /// Decode the entry as a change event
    pub fn change_event(&self) -> NotifyResult<ChangeEvent> {
        ChangeEvent::from_fields(&self.id, &self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_for(event: &ChangeEvent) -> StreamEntry {
        StreamEntry {
            stream: "RD.default".to_string(),
            id: "1700000000000-0".to_string(),
            fields: event
                .fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_fields_carry_namespace_and_key() {
        let event = ChangeEvent::new("logs", "2024/01/a.json", ChangeKind::Upsert);
        let fields = event.fields();
        assert_eq!(fields[0], ("namespace", "logs".to_string()));
        assert_eq!(fields[1], ("key", "2024/01/a.json".to_string()));
        assert_eq!(fields[2], ("kind", "upsert".to_string()));
    }

    #[test]
    fn test_entry_decodes_back() {
        let event = ChangeEvent::new("logs", "a", ChangeKind::Insert);
        let decoded = entry_for(&event).change_event().unwrap();
        assert_eq!(decoded.namespace, "logs");
        assert_eq!(decoded.key, "a");
        assert_eq!(decoded.kind, ChangeKind::Insert);
        assert_eq!(decoded.emitted_at.timestamp_micros(), event.emitted_at.timestamp_micros());
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let event = ChangeEvent::new("logs", "a", ChangeKind::Insert);
        let mut entry = entry_for(&event);
        entry.fields.remove("key");
        assert!(matches!(
            entry.change_event(),
            Err(NotifyError::MalformedEntry { .. })
        ));
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let event = ChangeEvent::new("logs", "a", ChangeKind::Insert);
        let mut entry = entry_for(&event);
        entry.fields.insert("kind".to_string(), "drop".to_string());
        assert!(entry.change_event().is_err());
    }
}
