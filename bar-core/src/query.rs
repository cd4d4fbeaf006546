use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortModel {
    pub field: String,
    pub direction: SortDirection,
}

impl SortModel {
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

/// What kind of filter a column accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Text,
    Enum,
    Number,
    Date,
}

/// A single column filter coming from the grid's filter panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnFilter {
    /// Case-insensitive substring match.
    TextContains { field: String, value: String },
    EnumEquals { field: String, value: String },
    NumberEquals { field: String, value: i64 },
    /// Inclusive on both ends; a missing bound is open.
    DateRange {
        field: String,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    },
}

impl ColumnFilter {
    pub fn field(&self) -> &str {
        match self {
            ColumnFilter::TextContains { field, .. }
            | ColumnFilter::EnumEquals { field, .. }
            | ColumnFilter::NumberEquals { field, .. }
            | ColumnFilter::DateRange { field, .. } => field,
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            ColumnFilter::TextContains { .. } => FilterKind::Text,
            ColumnFilter::EnumEquals { .. } => FilterKind::Enum,
            ColumnFilter::NumberEquals { .. } => FilterKind::Number,
            ColumnFilter::DateRange { .. } => FilterKind::Date,
        }
    }
}

/// A read request for one page of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Zero-based.
    pub page: u32,
    pub page_size: u32,
    pub filters: Vec<ColumnFilter>,
    pub sort: SortModel,
}

impl PageQuery {
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Inclusive row range `(first, last)` covered by this page.
    pub fn range(&self) -> (i64, i64) {
        let first = self.offset();
        (first, first + self.limit() - 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Exact row count of the whole filtered set, not just this page.
    pub total: u64,
}
