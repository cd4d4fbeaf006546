use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::format::Cell;
use crate::grid::{GridRow, GridSnapshot, Notification, ViewState};
use crate::query::{ColumnFilter, FilterKind, SortModel};
use crate::{CoreError, CoreResult};

/// Rendering settings shared by all columns.
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    /// Offset used for visitor timestamps. Booking dates always render in UTC.
    pub local_offset: FixedOffset,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            local_offset: Utc.fix(),
        }
    }
}

pub struct ColumnDef<R> {
    pub field: &'static str,
    pub header: &'static str,
    pub width: u32,
    pub filter: Option<FilterKind>,
    /// Accepted values for `FilterKind::Enum` columns.
    pub options: &'static [&'static str],
    pub sortable: bool,
    pub editable: bool,
    pub render: fn(&R, &DisplayOptions) -> Cell,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnHeader {
    pub field: &'static str,
    pub header: &'static str,
    pub width: u32,
    pub filter: Option<FilterKind>,
    pub sortable: bool,
    pub editable: bool,
}

/// The grid as sent to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct GridDocument {
    pub title: &'static str,
    pub columns: Vec<ColumnHeader>,
    pub rows: Vec<Vec<Cell>>,
    pub row_ids: Vec<i64>,
    pub row_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub view: ViewState,
    pub loading: bool,
    pub error: Option<String>,
    pub notification: Option<Notification>,
}

/// Column layout and defaults of one grid view.
pub struct ViewDef<R> {
    pub title: &'static str,
    pub columns: Vec<ColumnDef<R>>,
    pub default_sort: SortModel,
}

impl<R: GridRow> ViewDef<R> {
    fn column(&self, field: &str) -> Option<&ColumnDef<R>> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn validate_filters(&self, filters: &[ColumnFilter]) -> CoreResult<()> {
        for filter in filters {
            let column = self.column(filter.field()).ok_or_else(|| {
                CoreError::Validation(format!("unknown column '{}'", filter.field()))
            })?;

            if column.filter != Some(filter.kind()) {
                return Err(CoreError::Validation(format!(
                    "column '{}' does not accept a {:?} filter",
                    column.field,
                    filter.kind()
                )));
            }

            match filter {
                ColumnFilter::EnumEquals { value, .. } if !column.options.contains(&value.as_str()) => {
                    return Err(CoreError::Validation(format!(
                        "'{}' is not a valid value for '{}'",
                        value, column.field
                    )));
                }
                ColumnFilter::DateRange { from: Some(from), to: Some(to), .. } if from > to => {
                    return Err(CoreError::Validation(format!(
                        "empty date range on '{}'",
                        column.field
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub fn validate_sort(&self, sort: &SortModel) -> CoreResult<()> {
        match self.column(&sort.field) {
            Some(column) if column.sortable => Ok(()),
            Some(_) => Err(CoreError::Validation(format!("column '{}' is not sortable", sort.field))),
            None => Err(CoreError::Validation(format!("unknown column '{}'", sort.field))),
        }
    }

    pub fn render(&self, snapshot: &GridSnapshot<R>, display: &DisplayOptions) -> GridDocument {
        let columns = self
            .columns
            .iter()
            .map(|c| ColumnHeader {
                field: c.field,
                header: c.header,
                width: c.width,
                filter: c.filter,
                sortable: c.sortable,
                editable: c.editable,
            })
            .collect();

        let rows = snapshot
            .rows
            .iter()
            .map(|row| self.columns.iter().map(|c| (c.render)(row, display)).collect())
            .collect();

        GridDocument {
            title: self.title,
            columns,
            rows,
            row_ids: snapshot.rows.iter().map(GridRow::row_id).collect(),
            row_count: snapshot.row_count,
            page: snapshot.view.page,
            page_size: snapshot.page_size,
            view: snapshot.view.clone(),
            loading: snapshot.loading,
            error: snapshot.error.clone(),
            notification: snapshot.notification.clone(),
        }
    }
}
