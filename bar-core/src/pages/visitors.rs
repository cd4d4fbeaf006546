use std::sync::Arc;

use bar_shared::{Collection, Visitor};

use super::{PageController, PageSettings, VisitorsPage};
use crate::format::{format_timestamp, Cell};
use crate::query::{FilterKind, SortModel};
use crate::repository::{PageSource, VisitorCommentStore};
use crate::view::{ColumnDef, ViewDef};

fn optional(value: &Option<String>) -> Cell {
    Cell::text(value.as_deref().unwrap_or_default())
}

pub fn view() -> ViewDef<Visitor> {
    ViewDef {
        title: "Посетители",
        default_sort: SortModel::desc("creation_date"),
        columns: vec![
            ColumnDef {
                field: "id",
                header: "ID",
                width: 90,
                filter: Some(FilterKind::Number),
                options: &[],
                sortable: true,
                editable: false,
                render: |v, _| Cell::text(v.id.to_string()),
            },
            ColumnDef {
                field: "username",
                header: "Username",
                width: 160,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: true,
                editable: false,
                render: |v, _| optional(&v.username),
            },
            ColumnDef {
                field: "name",
                header: "Имя",
                width: 160,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: true,
                editable: false,
                render: |v, _| optional(&v.name),
            },
            ColumnDef {
                field: "creation_date",
                header: "Дата создания",
                width: 180,
                filter: Some(FilterKind::Date),
                options: &[],
                sortable: true,
                editable: false,
                render: |v, display| {
                    Cell::text(format_timestamp(Some(&v.creation_date), &display.local_offset))
                },
            },
            ColumnDef {
                field: "last_visit_date",
                header: "Последний визит",
                width: 180,
                filter: Some(FilterKind::Date),
                options: &[],
                sortable: true,
                editable: false,
                render: |v, display| {
                    Cell::text(format_timestamp(Some(&v.last_visit_date), &display.local_offset))
                },
            },
            ColumnDef {
                field: "real_name",
                header: "Настоящее имя",
                width: 160,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: true,
                editable: false,
                render: |v, _| optional(&v.real_name),
            },
            ColumnDef {
                field: "comment",
                header: "Комментарий",
                width: 240,
                filter: Some(FilterKind::Text),
                options: &[],
                sortable: false,
                editable: true,
                render: |v, _| optional(&v.comment),
            },
        ],
    }
}

pub fn page(
    source: Arc<dyn PageSource<Row = Visitor>>,
    store: Arc<dyn VisitorCommentStore>,
    settings: PageSettings,
) -> VisitorsPage {
    VisitorsPage::new(PageController::new(Collection::Visitors, view(), source, settings), store)
}
