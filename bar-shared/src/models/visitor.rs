use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A guest known to the bar, created by the ingestion bot on first contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: i64,
    pub username: Option<String>,
    pub name: Option<String>,
    pub creation_date: DateTime<Utc>,
    pub last_visit_date: DateTime<Utc>,
    pub real_name: Option<String>,
    /// Staff note. The only column the admin panel writes.
    pub comment: Option<String>,
}

impl Visitor {
    pub fn with_comment(&self, comment: Option<String>) -> Self {
        Self {
            comment,
            ..self.clone()
        }
    }
}
