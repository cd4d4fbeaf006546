//! Cell formatting shared by the grid views.

use bar_shared::BookingStatus;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Rendered grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cell {
    Text { text: String },
    Link { href: String, text: String },
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Cell::Text { text: text.into() }
    }

    pub fn display_text(&self) -> &str {
        match self {
            Cell::Text { text } | Cell::Link { text, .. } => text,
        }
    }
}

/// `DD.MM.YYYY, HH:MM` in the given offset. Missing timestamps render empty.
pub fn format_timestamp(value: Option<&DateTime<Utc>>, offset: &FixedOffset) -> String {
    match value {
        Some(ts) => ts.with_timezone(offset).format("%d.%m.%Y, %H:%M").to_string(),
        None => String::new(),
    }
}

pub fn status_label(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Active => "Активно",
        BookingStatus::Completed => "Завершено",
        BookingStatus::Canceled => "Отменен",
        BookingStatus::Confirmed => "Подтверждено",
        BookingStatus::Pending => "В ожидании",
    }
}

/// Number as dialled: whitespace, parentheses and dashes removed.
pub fn dial_target(phone: &str) -> String {
    phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '(' | ')' | '-'))
        .collect()
}

pub fn phone_cell(phone: Option<&str>) -> Cell {
    match phone {
        Some(value) if !value.is_empty() => Cell::Link {
            href: format!("tel:{}", dial_target(value)),
            text: value.to_string(),
        },
        _ => Cell::text("-"),
    }
}
