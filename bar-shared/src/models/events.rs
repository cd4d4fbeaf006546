use serde::{Deserialize, Serialize};
use std::fmt;

/// Tables the admin panel reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Bookings,
    Visitors,
}

impl Collection {
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Bookings => "bookings",
            Collection::Visitors => "visitors",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Row-level change notification, as emitted by the `pg_notify` triggers.
///
/// Payload: `{"table": "bookings", "op": "INSERT"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    #[serde(rename = "table")]
    pub collection: Collection,
    #[serde(rename = "op")]
    pub kind: ChangeKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_payload() {
        let event: ChangeEvent =
            serde_json::from_str(r#"{"table":"visitors","op":"UPDATE"}"#).unwrap();
        assert_eq!(event.collection, Collection::Visitors);
        assert_eq!(event.kind, ChangeKind::Update);
    }

    #[test]
    fn test_unknown_table_rejected() {
        let parsed = serde_json::from_str::<ChangeEvent>(r#"{"table":"staff","op":"DELETE"}"#);
        assert!(parsed.is_err());
    }
}
