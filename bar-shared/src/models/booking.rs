use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pii::Masked;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    /// Telegram id of the guest, references `visitors.id`.
    pub userid: i64,
    pub date: DateTime<Utc>,
    pub visitors_count: i32,
    pub phone: Option<Masked<String>>,
    pub status: BookingStatus,
}

/// A booking as shown in the grid, with the guest's names joined in at read time.
///
/// `username` and `real_name` are empty when no visitor matches `userid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRow {
    #[serde(flatten)]
    pub booking: Booking,
    pub username: String,
    pub real_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum BookingStatus {
    Active,
    Completed,
    Canceled,
    Confirmed,
    Pending,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Active,
        BookingStatus::Completed,
        BookingStatus::Canceled,
        BookingStatus::Confirmed,
        BookingStatus::Pending,
    ];

    /// Decodes a stored status code. Unknown and empty codes fall back to `Pending`.
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "active" => BookingStatus::Active,
            "completed" => BookingStatus::Completed,
            "canceled" => BookingStatus::Canceled,
            "confirmed" => BookingStatus::Confirmed,
            _ => BookingStatus::Pending,
        }
    }

    pub fn as_code(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Canceled => "canceled",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
        }
    }
}

impl From<String> for BookingStatus {
    fn from(code: String) -> Self {
        BookingStatus::from_code(&code)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::from_code(status.as_code()), status);
        }
    }

    #[test]
    fn test_unknown_status_is_pending() {
        assert_eq!(BookingStatus::from_code(""), BookingStatus::Pending);
        assert_eq!(BookingStatus::from_code("no-show"), BookingStatus::Pending);

        let status: BookingStatus = serde_json::from_str("\"waitlisted\"").unwrap();
        assert_eq!(status, BookingStatus::Pending);
    }

    #[test]
    fn test_row_flattens_booking() {
        let row = BookingRow {
            booking: Booking {
                id: 7,
                userid: 42,
                date: "2024-12-25T19:30:00Z".parse().unwrap(),
                visitors_count: 4,
                phone: None,
                status: BookingStatus::Confirmed,
            },
            username: String::new(),
            real_name: String::new(),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["username"], "");
    }
}
